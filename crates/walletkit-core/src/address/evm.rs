/*
[INPUT]:  secp256k1 verifying keys or address strings
[OUTPUT]: EIP-55 checksummed addresses and checksum verdicts
[POS]:    Address layer - EVM family codec
[UPDATE]: When EVM address rendering changes
*/

use alloy_primitives::{Address, keccak256};
use k256::ecdsa::VerifyingKey;

/// Last 20 bytes of Keccak-256 over the uncompressed point without its 0x04 tag
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// EIP-55 mixed-case hex
pub fn encode(key: &VerifyingKey) -> String {
    address_of(key).to_checksum(None)
}

/// True iff `address` carries a valid EIP-55 checksum
pub fn is_valid_checksum(address: &str) -> bool {
    Address::parse_checksummed(address, None).is_ok()
}

/// Accepts all-lowercase / all-uppercase hex, and mixed case only with a valid checksum
pub fn parse(address: &str) -> Result<Address, String> {
    let address = address.trim();
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| format!("EVM address must start with 0x: {address}"))?;
    let mixed = hex.chars().any(|c| c.is_ascii_lowercase())
        && hex.chars().any(|c| c.is_ascii_uppercase());
    if mixed {
        Address::parse_checksummed(address, None)
            .map_err(|e| format!("bad EIP-55 checksum for {address}: {e}"))
    } else {
        address
            .parse::<Address>()
            .map_err(|e| format!("invalid EVM address {address}: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;

    const HARDHAT_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const HARDHAT_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    fn key() -> SigningKey {
        SigningKey::from_slice(&hex::decode(HARDHAT_KEY).unwrap()).unwrap()
    }

    #[test]
    fn test_encode_known_key() {
        assert_eq!(encode(key().verifying_key()), HARDHAT_ADDRESS);
    }

    #[test]
    fn test_checksum_roundtrip_and_mutation() {
        let address = encode(key().verifying_key());
        assert!(is_valid_checksum(&address));

        // Flip the case of the first letter after 0x
        let position = address[2..].find(|c: char| c.is_ascii_alphabetic()).unwrap() + 2;
        let mut mutated: Vec<char> = address.chars().collect();
        let c = mutated[position];
        mutated[position] = if c.is_ascii_uppercase() {
            c.to_ascii_lowercase()
        } else {
            c.to_ascii_uppercase()
        };
        let mutated: String = mutated.into_iter().collect();
        assert!(!is_valid_checksum(&mutated));
    }

    #[test]
    fn test_parse_accepts_lowercase_rejects_bad_mixed_case() {
        assert!(parse(&HARDHAT_ADDRESS.to_ascii_lowercase()).is_ok());
        assert!(parse(HARDHAT_ADDRESS).is_ok());
        assert!(parse("0xF39fd6e51aad88F6F4ce6aB8827279cffFb92266").is_err());
        assert!(parse("f39fd6e51aad88f6f4ce6ab8827279cfffb92266").is_err());
    }
}
