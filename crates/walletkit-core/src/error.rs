/*
[INPUT]:  Failure sources (mnemonic, derivation, codecs, signing, RPC, storage)
[OUTPUT]: Typed wallet errors with diagnostic context and retry hints
[POS]:    Error handling layer - unified error type for the whole crate
[UPDATE]: When adding new failure sources or changing error context fields
*/

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for walletkit operations
///
/// Variants carry symbol, path and operation context. They never carry
/// key material or mnemonic words.
#[derive(Error, Debug)]
pub enum WalletError {
    /// Mnemonic failed word-count, wordlist or checksum validation
    #[error("Invalid mnemonic: {reason}")]
    InvalidMnemonic { reason: String },

    /// BIP-32 walk could not produce a usable key
    #[error("Key derivation failed at {path}: {reason}")]
    DerivationFailure { path: String, reason: String },

    /// Symbol has no fixed path and none was supplied
    #[error("Unsupported asset: {symbol}")]
    UnsupportedAsset { symbol: String },

    /// A derived key could not be rendered as a chain address
    #[error("Address generation failed for {symbol}: {reason}")]
    AddressGenerationFailure { symbol: String, reason: String },

    /// Transaction or message could not be signed
    #[error("Signing failed for {symbol}: {reason}")]
    SigningFailure { symbol: String, reason: String },

    /// Collaborator-side failure (RPC node, backend)
    #[error("Network failure during {operation}: {reason}")]
    NetworkFailure { operation: String, reason: String },

    /// Coupons do not cover the required fee
    #[error("Insufficient coupon balance: required {required}, available {available}")]
    InsufficientCouponBalance { required: Decimal, available: Decimal },

    /// No wallet with the given id in the registry
    #[error("Wallet not found: {id}")]
    WalletNotFound { id: String },

    /// Stored record changed since it was read
    #[error("Wallet {id} was modified concurrently (expected version {expected}, found {found})")]
    VersionConflict { id: String, expected: u64, found: u64 },

    /// Records are append-only; an existing symbol is never replaced
    #[error("Asset {symbol} already exists in this wallet")]
    DuplicateAsset { symbol: String },

    /// Persistence layer failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Collaborator call exceeded the caller-supplied timeout
    #[error("Timeout after {}s", duration.as_secs())]
    Timeout { duration: Duration },
}

impl WalletError {
    /// Check if the error is retryable by the collaborator layer
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WalletError::Http(_) | WalletError::NetworkFailure { .. } | WalletError::Timeout { .. }
        )
    }

    /// Get retry delay in seconds (if retryable)
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            WalletError::Timeout { .. } => Some(1),
            WalletError::NetworkFailure { .. } | WalletError::Http(_) => Some(2),
            _ => None,
        }
    }

    pub(crate) fn derivation(path: impl ToString, reason: impl ToString) -> Self {
        WalletError::DerivationFailure {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn address(symbol: impl ToString, reason: impl ToString) -> Self {
        WalletError::AddressGenerationFailure {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn signing(symbol: impl ToString, reason: impl ToString) -> Self {
        WalletError::SigningFailure {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn network(operation: impl ToString, reason: impl ToString) -> Self {
        WalletError::NetworkFailure {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for walletkit operations
pub type Result<T> = std::result::Result<T, WalletError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        let timeout_err = WalletError::Timeout {
            duration: Duration::from_secs(30),
        };
        assert!(timeout_err.is_retryable());
        assert_eq!(timeout_err.retry_delay(), Some(1));

        let mnemonic_err = WalletError::InvalidMnemonic {
            reason: "bad checksum".to_string(),
        };
        assert!(!mnemonic_err.is_retryable());
        assert_eq!(mnemonic_err.retry_delay(), None);
    }

    #[test]
    fn test_error_context_in_message() {
        let err = WalletError::derivation("m/44'/60'/0'/0/0", "invalid child");
        assert_eq!(
            err.to_string(),
            "Key derivation failed at m/44'/60'/0'/0/0: invalid child"
        );

        let err = WalletError::signing("ETH", "no key");
        assert!(err.to_string().contains("ETH"));
    }

    #[test]
    fn test_network_failure_is_retryable() {
        let err = WalletError::network("eth_gasPrice", "connection refused");
        assert!(err.is_retryable());
        assert_eq!(err.retry_delay(), Some(2));
    }
}
