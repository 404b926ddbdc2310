/*
[INPUT]:  ed25519 verifying keys or base58 address strings
[OUTPUT]: Base58 public-key addresses
[POS]:    Address layer - Solana family codec
[UPDATE]: When Solana address rendering changes
*/

use ed25519_dalek::VerifyingKey;

/// Plain Base58 of the 32-byte public key, no checksum
pub fn encode(key: &VerifyingKey) -> String {
    bs58::encode(key.as_bytes()).into_string()
}

pub fn decode(address: &str) -> Result<[u8; 32], String> {
    let bytes = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| format!("invalid base58 address {address}: {e}"))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("Solana address must be 32 bytes, got {}", bytes.len()))
}
