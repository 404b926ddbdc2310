/*
[INPUT]:  Backend base URL, master addresses, signed auth proofs
[OUTPUT]: Nonce challenges, registration results, fee-payer public keys
[POS]:    HTTP layer - REST client for the wallet backend
[UPDATE]: When backend endpoints or payloads change
*/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use tracing::debug;

use crate::address::solana;
use crate::error::{Result, WalletError};
use crate::http::client::{ClientConfig, base_url, send_json};
use crate::network::{AuthBackend, FeePayerService};
use crate::types::{AuthProof, FeePayerResponse, NonceResponse, RegisterResponse};

/// Wallet backend: auth challenges and Solana fee sponsorship
#[derive(Debug)]
pub struct BackendClient {
    http_client: Client,
    base_url: Url,
    timeout: Duration,
}

impl BackendClient {
    pub fn new(base: &str) -> Result<Self> {
        Self::with_config(base, ClientConfig::default())
    }

    pub fn with_config(base: &str, config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http_client: config.build_client()?,
            base_url: base_url(base)?,
            timeout: config.timeout,
        })
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        Ok(self.http_client.request(method, url))
    }
}

#[async_trait]
impl AuthBackend for BackendClient {
    /// GET /auth/nonce?address={master_address}
    async fn request_nonce(&self, master_address: &str) -> Result<String> {
        let builder = self
            .request(Method::GET, "auth/nonce")?
            .query(&[("address", master_address)]);
        let response: NonceResponse = send_json(builder, "auth/nonce", self.timeout).await?;
        if response.nonce.is_empty() {
            return Err(WalletError::network("auth/nonce", "backend issued an empty nonce"));
        }
        debug!(address = master_address, "auth nonce received");
        Ok(response.nonce)
    }

    /// POST /auth/register
    async fn register(&self, proof: &AuthProof) -> Result<RegisterResponse> {
        let builder = self.request(Method::POST, "auth/register")?.json(proof);
        send_json(builder, "auth/register", self.timeout).await
    }
}

#[async_trait]
impl FeePayerService for BackendClient {
    /// GET /fee-payer
    async fn fee_payer(&self) -> Result<String> {
        let builder = self.request(Method::GET, "fee-payer")?;
        let response: FeePayerResponse = send_json(builder, "fee-payer", self.timeout).await?;
        solana::decode(&response.public_key)
            .map_err(|e| WalletError::network("fee-payer", format!("invalid fee payer key: {e}")))?;
        Ok(response.public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MASTER: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";

    #[tokio::test]
    async fn test_request_nonce() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/nonce"))
            .and(query_param("address", MASTER))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nonce": "n-42"})))
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri()).unwrap();
        assert_eq!(client.request_nonce(MASTER).await.unwrap(), "n-42");
    }

    #[tokio::test]
    async fn test_register_sends_camel_case_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/register"))
            .and(body_json(json!({
                "masterAddress": MASTER,
                "nonce": "n-42",
                "signature": "0xabc"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri()).unwrap();
        let proof = AuthProof {
            master_address: MASTER.to_string(),
            nonce: "n-42".to_string(),
            signature: "0xabc".to_string(),
        };
        assert!(client.register(&proof).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_fee_payer_validates_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fee-payer"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"publicKey": "4EngF3p73rFnEgjcAG5DVQ91QGFze4vsvjVUkAwLjv14"})),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri()).unwrap();
        assert_eq!(
            client.fee_payer().await.unwrap(),
            "4EngF3p73rFnEgjcAG5DVQ91QGFze4vsvjVUkAwLjv14"
        );
    }

    #[tokio::test]
    async fn test_invalid_fee_payer_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/fee-payer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"publicKey": "0xnot-solana"})))
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri()).unwrap();
        assert!(matches!(
            client.fee_payer().await.unwrap_err(),
            WalletError::NetworkFailure { .. }
        ));
    }

    #[tokio::test]
    async fn test_backend_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/nonce"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = BackendClient::new(&server.uri()).unwrap();
        assert!(client.request_nonce(MASTER).await.is_err());
    }
}
