/*
[INPUT]:  Wallet record or signer, auth backend
[OUTPUT]: Registered auth proof
[POS]:    Auth layer - orchestrates the nonce/sign/register flow
[UPDATE]: When auth endpoints or flow steps change
*/

use tracing::{info, instrument};

use crate::auth::{AuthSigner, WalletSigner};
use crate::error::{Result, WalletError};
use crate::network::AuthBackend;
use crate::types::{AddressFormat, AuthProof};
use crate::wallet::WalletRecord;

/// Manages the complete authentication flow
#[derive(Debug)]
pub struct AuthManager<B> {
    backend: B,
}

impl<B: AuthBackend> AuthManager<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Request nonce, sign `master_address || nonce` with the master key, register.
    #[instrument(skip(self, record), fields(wallet = %record.id))]
    pub async fn authenticate(&self, record: &WalletRecord) -> Result<AuthProof> {
        let signer = AuthSigner::from_record(record)?;
        self.authenticate_with(&signer).await
    }

    /// Same flow with any EVM-family signer
    pub async fn authenticate_with<S: WalletSigner + ?Sized>(&self, signer: &S) -> Result<AuthProof> {
        if signer.family() != AddressFormat::Evm {
            return Err(WalletError::signing(
                signer.address(),
                "backend auth needs an EVM-family signer",
            ));
        }

        let master_address = signer.address().to_string();
        let nonce = self.backend.request_nonce(&master_address).await?;
        let message = format!("{master_address}{nonce}");
        let signature = signer.sign_message(&message).await?;

        let proof = AuthProof {
            master_address,
            nonce,
            signature,
        };

        let response = self.backend.register(&proof).await?;
        if !response.success {
            let reason = response.message.unwrap_or_else(|| "registration rejected".to_string());
            return Err(WalletError::network("auth/register", reason));
        }

        info!(address = %proof.master_address, "wallet registered with backend");
        Ok(proof)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::auth::MockWalletSigner;
    use crate::crypto::MnemonicService;
    use crate::types::RegisterResponse;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[derive(Default)]
    struct StubBackend {
        accept: bool,
        registered: Mutex<Vec<AuthProof>>,
    }

    #[async_trait]
    impl AuthBackend for StubBackend {
        async fn request_nonce(&self, master_address: &str) -> Result<String> {
            Ok(format!("nonce-for-{}", &master_address[2..8]))
        }

        async fn register(&self, proof: &AuthProof) -> Result<RegisterResponse> {
            self.registered.lock().unwrap().push(proof.clone());
            Ok(RegisterResponse {
                success: self.accept,
                message: (!self.accept).then(|| "signature mismatch".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn test_authenticate_registers_verifiable_proof() {
        let record = WalletRecord::generate("main", MnemonicService::parse(PHRASE).unwrap()).unwrap();
        let manager = AuthManager::new(StubBackend {
            accept: true,
            ..Default::default()
        });

        let proof = manager.authenticate(&record).await.unwrap();
        assert_eq!(proof.master_address, record.master_address());
        assert_eq!(proof.nonce, "nonce-for-9858Ef");
        assert!(AuthSigner::verify(&proof).unwrap());
        assert_eq!(manager.backend().registered.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_registration_is_network_failure() {
        let manager = AuthManager::new(StubBackend::default());
        let signer = MockWalletSigner::evm("0xabcdef0123", "0xsig");

        let err = manager.authenticate_with(&signer).await.unwrap_err();
        assert_eq!(signer.challenges(), vec!["0xabcdef0123nonce-for-abcdef".to_string()]);
        match err {
            WalletError::NetworkFailure { operation, reason } => {
                assert_eq!(operation, "auth/register");
                assert_eq!(reason, "signature mismatch");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_evm_signer_rejected() {
        let manager = AuthManager::new(StubBackend::default());
        let signer = MockWalletSigner::new(AddressFormat::Solana, "4EngF3p73rFnEgjcAG5DVQ91QGFze4vsvjVUkAwLjv14", "sig");

        assert!(matches!(
            manager.authenticate_with(&signer).await.unwrap_err(),
            WalletError::SigningFailure { .. }
        ));
        assert!(manager.backend().registered.lock().unwrap().is_empty());
    }
}
