/*
[INPUT]:  Signing and submission outcomes
[OUTPUT]: Value types handed back to callers and collaborators
[POS]:    Data layer - results shared by the tx, auth and http layers
[UPDATE]: When a new proof or receipt shape is introduced
*/

use serde::{Deserialize, Serialize};

use super::enums::AddressFormat;

/// Proof of control of a wallet's master key for a backend nonce challenge.
///
/// Serialized exactly as the backend expects the registration body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthProof {
    pub master_address: String,
    pub nonce: String,
    /// 0x-prefixed 65-byte r || s || v
    pub signature: String,
}

impl AuthProof {
    /// The exact string that was signed
    pub fn message(&self) -> String {
        format!("{}{}", self.master_address, self.nonce)
    }
}

/// A transaction accepted by a network collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTransaction {
    pub family: AddressFormat,
    /// EVM transaction hash or Solana signature, as returned by the node
    pub id: String,
}
