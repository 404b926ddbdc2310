/*
[INPUT]:  Derived private scalars / ed25519 keypairs, or their stored encodings
[OUTPUT]: Curve-tagged key material with the persisted text encodings
[POS]:    Crypto layer - the only place private key bytes are held
[UPDATE]: When key encodings or supported curves change
*/

use std::fmt;

use ed25519_dalek::SigningKey as Ed25519SigningKey;
use k256::ecdsa::SigningKey as Secp256k1SigningKey;
use zeroize::Zeroizing;

use crate::types::Curve;

/// Private key material for one asset.
///
/// Encodings when persisted:
/// - secp256k1: lowercase hex of the 32-byte scalar
/// - ed25519: JSON array of the 64-byte secret (32-byte seed followed by the public key)
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Secp256k1(Zeroizing<[u8; 32]>),
    Ed25519(Zeroizing<[u8; 64]>),
}

impl KeyMaterial {
    /// Rejects zero and out-of-range scalars
    pub fn secp256k1(scalar: [u8; 32]) -> Result<Self, String> {
        let scalar = Zeroizing::new(scalar);
        Secp256k1SigningKey::from_slice(scalar.as_slice())
            .map_err(|_| "scalar is zero or not below the curve order".to_string())?;
        Ok(KeyMaterial::Secp256k1(scalar))
    }

    pub fn ed25519(key: &Ed25519SigningKey) -> Self {
        KeyMaterial::Ed25519(Zeroizing::new(key.to_keypair_bytes()))
    }

    pub fn curve(&self) -> Curve {
        match self {
            KeyMaterial::Secp256k1(_) => Curve::Secp256k1,
            KeyMaterial::Ed25519(_) => Curve::Ed25519,
        }
    }

    pub fn secp256k1_signing_key(&self) -> Option<Secp256k1SigningKey> {
        match self {
            KeyMaterial::Secp256k1(scalar) => Secp256k1SigningKey::from_slice(scalar.as_slice()).ok(),
            KeyMaterial::Ed25519(_) => None,
        }
    }

    pub fn ed25519_signing_key(&self) -> Option<Ed25519SigningKey> {
        match self {
            KeyMaterial::Ed25519(secret) => Ed25519SigningKey::from_keypair_bytes(secret).ok(),
            KeyMaterial::Secp256k1(_) => None,
        }
    }

    /// Text form used by the wallet store
    pub fn encode(&self) -> Zeroizing<String> {
        match self {
            KeyMaterial::Secp256k1(scalar) => Zeroizing::new(hex::encode(scalar.as_slice())),
            KeyMaterial::Ed25519(secret) => {
                let json = serde_json::to_string(secret.as_slice())
                    .unwrap_or_else(|_| String::from("[]"));
                Zeroizing::new(json)
            }
        }
    }

    /// Inverse of [`KeyMaterial::encode`]
    pub fn decode(curve: Curve, encoded: &str) -> Result<Self, String> {
        match curve {
            Curve::Secp256k1 => {
                let encoded = encoded.trim();
                let encoded = encoded.strip_prefix("0x").unwrap_or(encoded);
                let bytes = Zeroizing::new(
                    hex::decode(encoded).map_err(|e| format!("invalid secp256k1 key hex: {e}"))?,
                );
                let scalar: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| format!("secp256k1 key must be 32 bytes, got {}", bytes.len()))?;
                Self::secp256k1(scalar)
            }
            Curve::Ed25519 => {
                let bytes: Zeroizing<Vec<u8>> = Zeroizing::new(
                    serde_json::from_str(encoded)
                        .map_err(|e| format!("invalid ed25519 key array: {e}"))?,
                );
                let secret: [u8; 64] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| format!("ed25519 secret must be 64 bytes, got {}", bytes.len()))?;
                let secret = Zeroizing::new(secret);
                Ed25519SigningKey::from_keypair_bytes(&secret)
                    .map_err(|_| "ed25519 public half does not match the seed".to_string())?;
                Ok(KeyMaterial::Ed25519(secret))
            }
        }
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial::{:?}(..)", self.curve())
    }
}
