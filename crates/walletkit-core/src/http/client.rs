/*
[INPUT]:  HTTP configuration (endpoint URLs, timeouts)
[OUTPUT]: Configured reqwest clients and a JSON-RPC 2.0 caller
[POS]:    HTTP layer - transport shared by every collaborator client
[UPDATE]: When adding connection options or changing error mapping
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, WalletError};
use crate::types::{JsonRpcRequest, JsonRpcResponse};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    pub(crate) fn build_client(&self) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(WalletError::Http)
    }
}

/// Parse a base URL so that relative endpoints join under its path
pub(crate) fn base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Send a request and decode a JSON body.
///
/// Timeouts map to `Timeout`, non-2xx statuses to `NetworkFailure`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    builder: RequestBuilder,
    operation: &str,
    timeout: Duration,
) -> Result<T> {
    let response = builder.send().await.map_err(|e| map_transport(e, timeout))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WalletError::network(operation, format!("HTTP {status}: {body}")));
    }

    let bytes = response.bytes().await.map_err(|e| map_transport(e, timeout))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| WalletError::network(operation, format!("unexpected response body: {e}")))
}

fn map_transport(err: reqwest::Error, timeout: Duration) -> WalletError {
    if err.is_timeout() {
        WalletError::Timeout { duration: timeout }
    } else {
        WalletError::Http(err)
    }
}

/// JSON-RPC 2.0 over HTTP POST
#[derive(Debug)]
pub struct JsonRpcClient {
    http_client: Client,
    endpoint: Url,
    timeout: Duration,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn with_config(endpoint: &str, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http_client: config.build_client()?,
            endpoint: Url::parse(endpoint)?,
            timeout: config.timeout,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Call `method`; an error object or a null result is a `NetworkFailure`
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);
        debug!(operation = method, id, "json-rpc call");

        let builder = self.http_client.post(self.endpoint.clone()).json(&request);
        let response: JsonRpcResponse<T> = send_json(builder, method, self.timeout).await?;

        if let Some(error) = response.error {
            return Err(WalletError::network(
                method,
                format!("rpc error {}: {}", error.code, error.message),
            ));
        }
        response
            .result
            .ok_or_else(|| WalletError::network(method, "empty result"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_keeps_prefix() {
        let url = base_url("https://api.example.com/v1").unwrap();
        assert_eq!(url.join("auth/nonce").unwrap().as_str(), "https://api.example.com/v1/auth/nonce");
    }

    #[tokio::test]
    async fn test_call_returns_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"jsonrpc": "2.0", "method": "eth_chainId"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": "0x1"
            })))
            .mount(&server)
            .await;

        let client = JsonRpcClient::new(&server.uri()).unwrap();
        let result: String = client.call("eth_chainId", json!([])).await.unwrap();
        assert_eq!(result, "0x1");
    }

    #[tokio::test]
    async fn test_rpc_error_object_is_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1,
                "error": {"code": -32000, "message": "nonce too low"}
            })))
            .mount(&server)
            .await;

        let client = JsonRpcClient::new(&server.uri()).unwrap();
        let err = client
            .call::<String>("eth_sendRawTransaction", json!(["0x00"]))
            .await
            .unwrap_err();
        match err {
            WalletError::NetworkFailure { operation, reason } => {
                assert_eq!(operation, "eth_sendRawTransaction");
                assert!(reason.contains("nonce too low"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_status_is_network_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client = JsonRpcClient::new(&server.uri()).unwrap();
        let err = client.call::<String>("eth_gasPrice", json!([])).await.unwrap_err();
        assert!(matches!(err, WalletError::NetworkFailure { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_slow_node_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": "0x1"}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = ClientConfig {
            timeout: Duration::from_millis(100),
            connect_timeout: Duration::from_millis(100),
        };
        let client = JsonRpcClient::with_config(&server.uri(), config).unwrap();
        let err = client.call::<String>("eth_gasPrice", json!([])).await.unwrap_err();
        assert!(matches!(err, WalletError::Timeout { .. }));
    }
}
