/*
[INPUT]:  Asset symbol and its derived key material
[OUTPUT]: Human-readable chain address for the asset's family
[POS]:    Address layer - dispatch over EVM / Bitcoin / Solana encodings
[UPDATE]: When adding a new address family
*/

pub mod bitcoin;
pub mod evm;
pub mod solana;

use crate::crypto::KeyMaterial;
use crate::error::{Result, WalletError};
use crate::types::{AddressFormat, AssetSymbol};

/// Maps derived keys to chain addresses. Pure and deterministic.
pub struct AddressCodec;

impl AddressCodec {
    pub fn encode(symbol: &AssetSymbol, key: &KeyMaterial) -> Result<String> {
        Self::encode_as(symbol.address_format(), key)
            .map_err(|reason| WalletError::address(symbol, reason))
    }

    pub fn encode_as(format: AddressFormat, key: &KeyMaterial) -> std::result::Result<String, String> {
        match format {
            AddressFormat::Evm => key
                .secp256k1_signing_key()
                .map(|k| evm::encode(k.verifying_key()))
                .ok_or_else(|| "EVM address needs a secp256k1 key".to_string()),
            AddressFormat::Bitcoin => key
                .secp256k1_signing_key()
                .map(|k| bitcoin::encode(k.verifying_key()))
                .ok_or_else(|| "Bitcoin address needs a secp256k1 key".to_string()),
            AddressFormat::Solana => key
                .ed25519_signing_key()
                .map(|k| solana::encode(&k.verifying_key()))
                .ok_or_else(|| "Solana address needs an ed25519 key".to_string()),
        }
    }

    /// Syntactic and checksum validation of a foreign address
    pub fn is_valid(format: AddressFormat, address: &str) -> bool {
        match format {
            AddressFormat::Evm => evm::parse(address).is_ok(),
            AddressFormat::Bitcoin => bitcoin::decode(address).is_ok(),
            AddressFormat::Solana => solana::decode(address).is_ok(),
        }
    }
}
