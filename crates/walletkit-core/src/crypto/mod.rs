/*
[INPUT]:  Mnemonic phrases, seeds, derivation paths
[OUTPUT]: Seeds, allocated paths, derived curve-tagged key material
[POS]:    Crypto layer - HD key tree from phrase to per-asset keys
[UPDATE]: When adding derivation schemes or key encodings
*/

pub mod allocator;
pub mod derive;
pub mod keys;
pub mod mnemonic;
pub mod path;

pub use allocator::DerivationPathAllocator;
pub use derive::{KeyDerivationEngine, RawKey};
pub use keys::KeyMaterial;
pub use mnemonic::{MnemonicPhrase, MnemonicService, Seed, WordCount};
pub use path::{DerivationPath, PathComponent};
