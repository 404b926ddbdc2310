/*
[INPUT]:  Mnemonics, asset requests, a storage location
[OUTPUT]: Wallet records and their persisted registry
[POS]:    Wallet layer - record lifecycle and persistence
[UPDATE]: When adding wallet operations or storage backends
*/

pub mod cipher;
pub mod manager;
pub mod record;
pub mod repository;

pub use cipher::{AesGcmCipher, AtRestCipher, PlaintextCipher};
pub use manager::WalletManager;
pub use record::{AssetKey, PRIMARY_ASSETS, WalletRecord};
pub use repository::{JsonFileRepository, MemoryRepository, WalletRegistry, WalletRepository};
