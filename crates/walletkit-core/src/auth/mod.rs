/*
[INPUT]:  Wallet records, backend nonces
[OUTPUT]: EIP-191 auth proofs
[POS]:    Auth layer - backend authentication with the master key
[UPDATE]: When adding signer kinds or auth flow steps
*/

pub mod manager;
pub mod signer;
pub mod wallet;

pub use manager::AuthManager;
pub use signer::AuthSigner;
pub use wallet::{MockWalletSigner, WalletSigner};
