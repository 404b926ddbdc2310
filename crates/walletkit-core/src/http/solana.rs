/*
[INPUT]:  Solana JSON-RPC endpoint, addresses, base64 wire transactions
[OUTPUT]: Recent blockhashes, balances, broadcast signatures
[POS]:    HTTP layer - SolanaRpc over the Solana JSON-RPC API
[UPDATE]: When using additional Solana RPC methods or commitments
*/

use async_trait::async_trait;
use serde_json::json;

use crate::error::{Result, WalletError};
use crate::http::client::{ClientConfig, JsonRpcClient};
use crate::network::SolanaRpc;
use crate::types::{LatestBlockhash, RpcContextValue};

#[derive(Debug)]
pub struct SolanaJsonRpc {
    rpc: JsonRpcClient,
}

impl SolanaJsonRpc {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: &str, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            rpc: JsonRpcClient::with_config(endpoint, config)?,
        })
    }
}

#[async_trait]
impl SolanaRpc for SolanaJsonRpc {
    async fn latest_blockhash(&self) -> Result<[u8; 32]> {
        let response: RpcContextValue<LatestBlockhash> = self
            .rpc
            .call("getLatestBlockhash", json!([{"commitment": "finalized"}]))
            .await?;

        let bytes = bs58::decode(&response.value.blockhash)
            .into_vec()
            .map_err(|e| WalletError::network("getLatestBlockhash", format!("blockhash is not base58: {e}")))?;
        bytes
            .try_into()
            .map_err(|_| WalletError::network("getLatestBlockhash", "blockhash is not 32 bytes"))
    }

    async fn send_transaction(&self, base64_tx: &str) -> Result<String> {
        self.rpc
            .call("sendTransaction", json!([base64_tx, {"encoding": "base64"}]))
            .await
    }

    async fn balance(&self, address: &str) -> Result<u64> {
        let response: RpcContextValue<u64> = self.rpc.call("getBalance", json!([address])).await?;
        Ok(response.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BLOCKHASH: &str = "EkSnNWid2cvwEVnVx9aBqawnmiCNiDgp3gUdkDPTKN1N";

    #[tokio::test]
    async fn test_latest_blockhash_decodes_base58() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getLatestBlockhash"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {
                    "context": {"slot": 2792},
                    "value": {"blockhash": BLOCKHASH, "lastValidBlockHeight": 3090}
                }
            })))
            .mount(&server)
            .await;

        let rpc = SolanaJsonRpc::new(&server.uri()).unwrap();
        let hash = rpc.latest_blockhash().await.unwrap();
        assert_eq!(bs58::encode(hash).into_string(), BLOCKHASH);
    }

    #[tokio::test]
    async fn test_bad_blockhash_is_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {"context": {"slot": 1}, "value": {"blockhash": "abc"}}
            })))
            .mount(&server)
            .await;

        let rpc = SolanaJsonRpc::new(&server.uri()).unwrap();
        let err = rpc.latest_blockhash().await.unwrap_err();
        assert!(matches!(err, WalletError::NetworkFailure { .. }));
    }

    #[tokio::test]
    async fn test_send_transaction_and_balance() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "sendTransaction",
                "params": ["AQID", {"encoding": "base64"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": "5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "getBalance"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 2,
                "result": {"context": {"slot": 1}, "value": 1_500_000_000u64}
            })))
            .mount(&server)
            .await;

        let rpc = SolanaJsonRpc::new(&server.uri()).unwrap();
        let signature = rpc.send_transaction("AQID").await.unwrap();
        assert!(signature.starts_with("5VERv8"));
        assert_eq!(
            rpc.balance("4EngF3p73rFnEgjcAG5DVQ91QGFze4vsvjVUkAwLjv14").await.unwrap(),
            1_500_000_000
        );
    }
}
