/*
[INPUT]:  Caller intents for transfers and collaborator calls
[OUTPUT]: Typed request structs with serialization support
[POS]:    Data layer - transaction requests and JSON-RPC request envelope
[UPDATE]: When transfer options or collaborator request shapes change
*/

use serde::{Deserialize, Serialize};

/// Native-value EVM transfer (or contract call when `data` is set)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmTransferRequest {
    pub to: String,
    /// Decimal amount in the chain's native unit, e.g. "0.05"
    pub value: String,
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Wei
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<u128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
    /// 0x-hex calldata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl EvmTransferRequest {
    pub fn new(to: impl Into<String>, value: impl Into<String>, chain_id: u64) -> Self {
        Self {
            to: to.into(),
            value: value.into(),
            chain_id,
            nonce: None,
            gas_price: None,
            gas_limit: None,
            data: None,
        }
    }
}

/// SOL transfer via the system program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolanaTransferRequest {
    /// Base58 recipient
    pub to: String,
    /// Decimal SOL, at most 9 fractional digits
    pub amount: String,
    /// Base58 sponsor paying the fee; defaults to the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_payer: Option<String>,
}

impl SolanaTransferRequest {
    pub fn new(to: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            amount: amount.into(),
            fee_payer: None,
        }
    }
}

/// Parameters for `eth_estimateGas`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub from: String,
    pub to: String,
    /// 0x-hex quantity
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> JsonRpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}
