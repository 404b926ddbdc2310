/*
[INPUT]:  Challenge text (master address || nonce) and a wallet key
[OUTPUT]: Ownership signature sent with the backend registration
[POS]:    Auth layer - seam between the auth flow and whoever holds the key
[UPDATE]: When adding signer kinds or changing signature encoding
*/

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::AddressFormat;

/// Anything that can prove control of a wallet's master address.
///
/// Async so hardware wallets and remote signers fit behind it.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Only [`AddressFormat::Evm`] signers can answer backend challenges
    fn family(&self) -> AddressFormat;

    fn address(&self) -> &str;

    /// EIP-191 signature, 0x-hex of r || s || v
    async fn sign_message(&self, message: &str) -> Result<String>;
}

/// Canned-signature signer that remembers every challenge it was shown
#[derive(Debug)]
pub struct MockWalletSigner {
    family: AddressFormat,
    address: String,
    signature: String,
    challenges: Mutex<Vec<String>>,
}

impl MockWalletSigner {
    pub fn new(family: AddressFormat, address: &str, signature: &str) -> Self {
        Self {
            family,
            address: address.to_string(),
            signature: signature.to_string(),
            challenges: Mutex::new(Vec::new()),
        }
    }

    /// EVM signer for `master_address`
    pub fn evm(master_address: &str, signature: &str) -> Self {
        Self::new(AddressFormat::Evm, master_address, signature)
    }

    /// Messages passed to `sign_message`, oldest first
    pub fn challenges(&self) -> Vec<String> {
        self.challenges
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl WalletSigner for MockWalletSigner {
    fn family(&self) -> AddressFormat {
        self.family
    }

    fn address(&self) -> &str {
        &self.address
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        if let Ok(mut seen) = self.challenges.lock() {
            seen.push(message.to_string());
        }
        Ok(self.signature.clone())
    }
}
