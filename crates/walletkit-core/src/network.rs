/*
[INPUT]:  Addresses, encoded transactions, auth proofs
[OUTPUT]: Nonces, gas prices, blockhashes, broadcast receipts, challenges
[POS]:    Collaborator boundary - everything the core asks of the outside world
[UPDATE]: When the core needs a new collaborator capability
*/

use alloy_primitives::U256;
use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AuthProof, CallRequest, RegisterResponse};

/// EVM node operations used to build and broadcast transfers
#[async_trait]
pub trait EvmRpc: Send + Sync {
    /// Pending transaction count of `address`
    async fn transaction_count(&self, address: &str) -> Result<u64>;

    /// Wei
    async fn gas_price(&self) -> Result<u128>;

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64>;

    /// Returns the transaction hash reported by the node
    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String>;

    async fn balance(&self, address: &str) -> Result<U256>;
}

/// Solana node operations
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    async fn latest_blockhash(&self) -> Result<[u8; 32]>;

    /// Returns the first signature in base58
    async fn send_transaction(&self, base64_tx: &str) -> Result<String>;

    /// Lamports
    async fn balance(&self, address: &str) -> Result<u64>;
}

/// Supplies the base58 public key that sponsors Solana fees
#[async_trait]
pub trait FeePayerService: Send + Sync {
    async fn fee_payer(&self) -> Result<String>;
}

/// Backend nonce challenge and registration
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn request_nonce(&self, master_address: &str) -> Result<String>;

    async fn register(&self, proof: &AuthProof) -> Result<RegisterResponse>;
}
