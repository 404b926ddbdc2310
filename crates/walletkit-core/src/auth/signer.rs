/*
[INPUT]:  Wallet record (ETH primary key) and a backend nonce
[OUTPUT]: EIP-191 personal-message signatures and recovered signer addresses
[POS]:    Auth layer - proof of master-key ownership
[UPDATE]: When the challenge message format or signature scheme changes
*/

use alloy_primitives::{Address, Signature};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::debug;

use crate::auth::WalletSigner;
use crate::crypto::KeyMaterial;
use crate::error::{Result, WalletError};
use crate::types::{AddressFormat, AssetSymbol, AuthProof, ETH};
use crate::wallet::WalletRecord;

/// Signs backend challenges with a wallet's master (ETH primary) key.
///
/// Message is `master_address || nonce`, hashed with the
/// `"\x19Ethereum Signed Message:\n" + len` prefix. Signing is RFC 6979
/// deterministic.
pub struct AuthSigner {
    signer: PrivateKeySigner,
    master_address: String,
}

impl AuthSigner {
    pub fn from_record(record: &WalletRecord) -> Result<Self> {
        let key = record.key(&AssetSymbol::well_known(ETH))?;
        let signer = Self::from_key(key)?;
        if !signer.master_address.eq_ignore_ascii_case(record.master_address()) {
            return Err(WalletError::signing(ETH, "ETH key does not match the master address"));
        }
        Ok(signer)
    }

    pub fn from_key(key: &KeyMaterial) -> Result<Self> {
        let signing_key = key
            .secp256k1_signing_key()
            .ok_or_else(|| WalletError::signing(ETH, "auth signing needs a secp256k1 key"))?;
        let signer = PrivateKeySigner::from_signing_key(signing_key);
        let master_address = signer.address().to_checksum(None);
        Ok(Self {
            signer,
            master_address,
        })
    }

    pub fn master_address(&self) -> &str {
        &self.master_address
    }

    /// 0x-hex r || s || v of the EIP-191 signature over `message`
    pub fn sign(&self, message: &str) -> Result<String> {
        let signature = self
            .signer
            .sign_message_sync(message.as_bytes())
            .map_err(|e| WalletError::signing(ETH, e))?;
        Ok(format!("0x{}", hex::encode(signature.as_bytes())))
    }

    pub fn sign_challenge(&self, nonce: &str) -> Result<AuthProof> {
        let message = format!("{}{}", self.master_address, nonce);
        let signature = self.sign(&message)?;
        debug!(address = %self.master_address, "auth challenge signed");
        Ok(AuthProof {
            master_address: self.master_address.clone(),
            nonce: nonce.to_string(),
            signature,
        })
    }

    /// Address that produced `signature` over `message`
    pub fn recover(message: &str, signature: &str) -> Result<Address> {
        let digits = signature.strip_prefix("0x").unwrap_or(signature);
        let bytes = hex::decode(digits).map_err(|e| WalletError::signing(ETH, format!("signature is not hex: {e}")))?;
        let signature = Signature::from_raw(&bytes).map_err(|e| WalletError::signing(ETH, e))?;
        signature
            .recover_address_from_msg(message.as_bytes())
            .map_err(|e| WalletError::signing(ETH, e))
    }

    /// True when the proof was signed by its own master address
    pub fn verify(proof: &AuthProof) -> Result<bool> {
        let recovered = Self::recover(&proof.message(), &proof.signature)?;
        Ok(recovered.to_checksum(None).eq_ignore_ascii_case(&proof.master_address))
    }
}

impl std::fmt::Debug for AuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSigner")
            .field("master_address", &self.master_address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletSigner for AuthSigner {
    fn family(&self) -> AddressFormat {
        AddressFormat::Evm
    }

    fn address(&self) -> &str {
        &self.master_address
    }

    async fn sign_message(&self, message: &str) -> Result<String> {
        self.sign(message)
    }
}
