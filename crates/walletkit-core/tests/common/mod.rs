/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and collaborator stubs
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for walletkit-core tests

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use tempfile::TempDir;
use walletkit_core::{FeePayerService, JsonFileRepository, Result, SolanaRpc, WalletManager};
use wiremock::MockServer;

/// BIP-39 reference mnemonic
pub const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub const ETH_ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
pub const ETH2_ADDRESS: &str = "0x6Fac4D18c912343BF86fa7049364Dd4E424Ab9C0";
pub const BTC_ADDRESS: &str = "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA";
pub const SOL_ADDRESS: &str = "4EngF3p73rFnEgjcAG5DVQ91QGFze4vsvjVUkAwLjv14";

pub const BLOCKHASH: [u8; 32] = [9u8; 32];

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Manager over a JSON file inside a fresh temp dir; keep the dir alive
pub fn file_manager() -> (TempDir, WalletManager<JsonFileRepository>) {
    let dir = tempfile::tempdir().unwrap();
    let repository = JsonFileRepository::new(dir.path().join("wallets.json"));
    (dir, WalletManager::new(repository))
}

/// Deterministic ed25519 key standing in for a fee sponsor
pub fn sponsor_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn sponsor_address() -> String {
    bs58::encode(sponsor_key().verifying_key().to_bytes()).into_string()
}

/// SolanaRpc answering a fixed blockhash and recording broadcasts
#[derive(Default)]
pub struct StubSolanaRpc {
    pub sent: Mutex<Vec<String>>,
}

#[async_trait]
impl SolanaRpc for StubSolanaRpc {
    async fn latest_blockhash(&self) -> Result<[u8; 32]> {
        Ok(BLOCKHASH)
    }

    async fn send_transaction(&self, base64_tx: &str) -> Result<String> {
        self.sent.lock().unwrap().push(base64_tx.to_string());
        Ok("stub-signature".to_string())
    }

    async fn balance(&self, _address: &str) -> Result<u64> {
        Ok(0)
    }
}

pub struct StubFeePayer(pub String);

#[async_trait]
impl FeePayerService for StubFeePayer {
    async fn fee_payer(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
