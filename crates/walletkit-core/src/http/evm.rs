/*
[INPUT]:  EVM JSON-RPC endpoint, addresses, raw signed transactions
[OUTPUT]: Nonces, gas prices, estimates, balances, broadcast hashes
[POS]:    HTTP layer - EvmRpc over Ethereum JSON-RPC
[UPDATE]: When using additional eth_* methods
*/

use alloy_primitives::U256;
use async_trait::async_trait;
use serde_json::json;

use crate::error::{Result, WalletError};
use crate::http::client::{ClientConfig, JsonRpcClient};
use crate::network::EvmRpc;
use crate::types::CallRequest;

/// Ethereum JSON-RPC node
#[derive(Debug)]
pub struct EvmJsonRpc {
    rpc: JsonRpcClient,
}

impl EvmJsonRpc {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: &str, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            rpc: JsonRpcClient::with_config(endpoint, config)?,
        })
    }

    async fn quantity(&self, method: &str, params: serde_json::Value) -> Result<u128> {
        let raw: String = self.rpc.call(method, params).await?;
        parse_quantity(&raw).map_err(|reason| WalletError::network(method, reason))
    }
}

#[async_trait]
impl EvmRpc for EvmJsonRpc {
    async fn transaction_count(&self, address: &str) -> Result<u64> {
        let count = self
            .quantity("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        u64::try_from(count).map_err(|_| WalletError::network("eth_getTransactionCount", "nonce overflows u64"))
    }

    async fn gas_price(&self) -> Result<u128> {
        self.quantity("eth_gasPrice", json!([])).await
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64> {
        let gas = self.quantity("eth_estimateGas", json!([call])).await?;
        u64::try_from(gas).map_err(|_| WalletError::network("eth_estimateGas", "gas overflows u64"))
    }

    async fn send_raw_transaction(&self, raw_hex: &str) -> Result<String> {
        self.rpc.call("eth_sendRawTransaction", json!([raw_hex])).await
    }

    async fn balance(&self, address: &str) -> Result<U256> {
        let raw: String = self.rpc.call("eth_getBalance", json!([address, "latest"])).await?;
        let digits = raw.strip_prefix("0x").unwrap_or(&raw);
        U256::from_str_radix(digits, 16)
            .map_err(|e| WalletError::network("eth_getBalance", format!("bad quantity {raw:?}: {e}")))
    }
}

/// `0x`-prefixed hex quantity
pub(crate) fn parse_quantity(raw: &str) -> std::result::Result<u128, String> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| format!("quantity {raw:?} lacks 0x prefix"))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|e| format!("bad quantity {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_result(server: &MockServer, rpc_method: &str, result: serde_json::Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": rpc_method})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": result
            })))
            .mount(server)
            .await;
    }

    #[rstest]
    #[case("0x0", 0)]
    #[case("0x", 0)]
    #[case("0x5208", 21000)]
    #[case("0x3b9aca00", 1_000_000_000)]
    fn test_parse_quantity(#[case] raw: &str, #[case] expected: u128) {
        assert_eq!(parse_quantity(raw).unwrap(), expected);
    }

    #[test]
    fn test_parse_quantity_rejects_decimal() {
        assert!(parse_quantity("21000").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn test_nonce_and_gas_price() {
        let server = MockServer::start().await;
        mock_result(&server, "eth_getTransactionCount", json!("0x7")).await;
        mock_result(&server, "eth_gasPrice", json!("0x4a817c800")).await;

        let rpc = EvmJsonRpc::new(&server.uri()).unwrap();
        assert_eq!(
            rpc.transaction_count("0x9858EfFD232B4033E47d90003D41EC34EcaEda94").await.unwrap(),
            7
        );
        assert_eq!(rpc.gas_price().await.unwrap(), 20_000_000_000);
    }

    #[tokio::test]
    async fn test_balance_and_broadcast() {
        let server = MockServer::start().await;
        mock_result(&server, "eth_getBalance", json!("0xde0b6b3a7640000")).await;
        mock_result(&server, "eth_sendRawTransaction", json!("0xabc123")).await;

        let rpc = EvmJsonRpc::new(&server.uri()).unwrap();
        let balance = rpc.balance("0x9858EfFD232B4033E47d90003D41EC34EcaEda94").await.unwrap();
        assert_eq!(balance, U256::from(1_000_000_000_000_000_000u128));
        assert_eq!(rpc.send_raw_transaction("0xf86c").await.unwrap(), "0xabc123");
    }

    #[tokio::test]
    async fn test_estimate_gas() {
        let server = MockServer::start().await;
        mock_result(&server, "eth_estimateGas", json!("0xb411")).await;

        let rpc = EvmJsonRpc::new(&server.uri()).unwrap();
        let call = CallRequest {
            from: "0x9858EfFD232B4033E47d90003D41EC34EcaEda94".to_string(),
            to: "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            value: "0x0".to_string(),
            data: Some("0xa9059cbb".to_string()),
        };
        assert_eq!(rpc.estimate_gas(&call).await.unwrap(), 46097);
    }
}
