/*
[INPUT]:  secp256k1 verifying keys or P2PKH address strings
[OUTPUT]: Base58Check mainnet P2PKH addresses
[POS]:    Address layer - Bitcoin codec
[UPDATE]: When supporting other Bitcoin script types or networks
*/

use k256::ecdsa::VerifyingKey;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Mainnet P2PKH version byte
pub const P2PKH_VERSION: u8 = 0x00;

pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

/// Base58Check(0x00 || RIPEMD160(SHA256(compressed pubkey)))
///
/// The checksum is the first 4 bytes of double SHA-256 over the versioned payload.
pub fn encode(key: &VerifyingKey) -> String {
    let pubkey = key.to_encoded_point(true);
    bs58::encode(hash160(pubkey.as_bytes()))
        .with_check_version(P2PKH_VERSION)
        .into_string()
}

/// Pubkey hash of a mainnet P2PKH address
pub fn decode(address: &str) -> Result<[u8; 20], String> {
    let payload = bs58::decode(address.trim())
        .with_check(Some(P2PKH_VERSION))
        .into_vec()
        .map_err(|e| format!("invalid P2PKH address {address}: {e}"))?;
    payload[1..]
        .try_into()
        .map_err(|_| format!("P2PKH payload must be 21 bytes, got {}", payload.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    #[test]
    fn test_private_key_one() {
        // Generator point G; well-known compressed P2PKH address
        let mut scalar = [0u8; 32];
        scalar[31] = 1;
        let key = SigningKey::from_slice(&scalar).unwrap();
        assert_eq!(encode(key.verifying_key()), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
    }

    #[test]
    fn test_decode_roundtrip_and_checksum() {
        let mut scalar = [0u8; 32];
        scalar[31] = 1;
        let key = SigningKey::from_slice(&scalar).unwrap();
        let address = encode(key.verifying_key());
        let hash = decode(&address).unwrap();
        assert_eq!(hash, hash160(key.verifying_key().to_encoded_point(true).as_bytes()));

        let mut corrupted = address.clone();
        corrupted.pop();
        corrupted.push('X');
        assert!(decode(&corrupted).is_err());
    }
}
