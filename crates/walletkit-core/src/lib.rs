/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public walletkit crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod address;
pub mod auth;
pub mod coupon;
pub mod crypto;
pub mod error;
pub mod http;
pub mod network;
pub mod tx;
pub mod types;
pub mod wallet;

// Re-export commonly used types from address/crypto
pub use address::AddressCodec;
pub use crypto::{
    DerivationPath,
    DerivationPathAllocator,
    KeyDerivationEngine,
    KeyMaterial,
    MnemonicPhrase,
    MnemonicService,
    WordCount,
};

// Re-export commonly used types from auth
pub use auth::{AuthManager, AuthSigner, MockWalletSigner, WalletSigner};

pub use coupon::{Allocation, Coupon, CouponDebit, CouponRecord, allocate, allocate_usable};
pub use error::{Result, WalletError};

// Re-export commonly used types from http
pub use http::{BackendClient, ClientConfig, EvmJsonRpc, SolanaJsonRpc};
pub use network::{AuthBackend, EvmRpc, FeePayerService, SolanaRpc};

pub use tx::{
    BuiltEvmTransaction,
    BuiltSolanaTransaction,
    EvmTransactionBuilder,
    SignedEvmTransaction,
    SignedSolanaTransaction,
    SolanaTransactionBuilder,
};

// Re-export all types
pub use types::*;

pub use wallet::{
    AesGcmCipher,
    AssetKey,
    AtRestCipher,
    JsonFileRepository,
    MemoryRepository,
    PlaintextCipher,
    WalletManager,
    WalletRecord,
    WalletRegistry,
    WalletRepository,
};
