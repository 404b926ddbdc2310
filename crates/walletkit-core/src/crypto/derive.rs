/*
[INPUT]:  64-byte seed and a derivation path
[OUTPUT]: secp256k1 scalars with chain codes, ed25519 keypairs, curve-tagged key material
[POS]:    Crypto layer - BIP-32 tree walk for every asset
[UPDATE]: When derivation rules or the ed25519 compatibility scheme change
*/

use bip32::{ChildNumber, XPrv};
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use k256::ecdsa::SigningKey as Secp256k1SigningKey;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::keys::KeyMaterial;
use crate::crypto::mnemonic::Seed;
use crate::crypto::path::{DerivationPath, HARDENED, PathComponent};
use crate::error::{Result, WalletError};
use crate::types::Curve;

/// Invalid children are skipped by bumping the index; 2^-127 odds per level,
/// so a handful of attempts is already unreachable in practice.
const MAX_CHILD_ATTEMPTS: u32 = 8;

/// Output of a BIP-32 walk
pub struct RawKey {
    pub private_key: Zeroizing<[u8; 32]>,
    pub chain_code: [u8; 32],
    /// Path actually walked. Differs from the requested one only when an
    /// invalid child forced an index bump.
    pub path: DerivationPath,
}

impl std::fmt::Debug for RawKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawKey")
            .field("path", &self.path.to_string())
            .finish_non_exhaustive()
    }
}

/// Walks the BIP-32 tree from a seed
pub struct KeyDerivationEngine;

impl KeyDerivationEngine {
    /// Standard BIP-32 private derivation (HMAC-SHA512 chaining).
    ///
    /// When a level yields an invalid key (IL >= n or a zero child) the index
    /// at that level is incremented and the level is retried, as BIP-32
    /// prescribes.
    pub fn derive(seed: &Seed, path: &DerivationPath) -> Result<RawKey> {
        Self::derive_with(seed, path, |node, child| node.derive_child(child))
    }

    /// [`Self::derive`] with the per-level child step supplied by the caller
    fn derive_with<F>(seed: &Seed, path: &DerivationPath, step: F) -> Result<RawKey>
    where
        F: FnMut(&XPrv, ChildNumber) -> bip32::Result<XPrv>,
    {
        let master = XPrv::new(seed.as_bytes())
            .map_err(|e| WalletError::derivation("m", format!("invalid master key: {e}")))?;
        let (node, path) = walk(master, path, step)?;
        debug!(path = %path, "derived secp256k1 key");

        Ok(RawKey {
            private_key: Zeroizing::new(node.private_key().to_bytes().into()),
            chain_code: node.attrs().chain_code,
            path,
        })
    }

    /// secp256k1 signing key at `path`
    pub fn derive_secp256k1(seed: &Seed, path: &DerivationPath) -> Result<(Secp256k1SigningKey, DerivationPath)> {
        let raw = Self::derive(seed, path)?;
        let key = Secp256k1SigningKey::from_slice(&raw.private_key[..])
            .map_err(|e| WalletError::derivation(raw.path, e))?;
        Ok((key, raw.path))
    }

    /// ed25519 keypair for Solana-family assets.
    ///
    /// NOTE: this is not SLIP-0010. The secp256k1 scalar derived at `path` is
    /// reused verbatim as the ed25519 seed. Existing wallets depend on this;
    /// switching to SLIP-0010 would move every Solana address and needs a
    /// migration.
    pub fn derive_ed25519(seed: &Seed, path: &DerivationPath) -> Result<(Ed25519SigningKey, DerivationPath)> {
        let raw = Self::derive(seed, path)?;
        let key = Ed25519SigningKey::from_bytes(&raw.private_key);
        Ok((key, raw.path))
    }

    /// Curve-tagged key material for an asset at `path`
    pub fn derive_key_material(
        seed: &Seed,
        path: &DerivationPath,
        curve: Curve,
    ) -> Result<(KeyMaterial, DerivationPath)> {
        match curve {
            Curve::Secp256k1 => {
                let raw = Self::derive(seed, path)?;
                let material = KeyMaterial::secp256k1(*raw.private_key)
                    .map_err(|e| WalletError::derivation(raw.path, e))?;
                Ok((material, raw.path))
            }
            Curve::Ed25519 => {
                let (key, walked) = Self::derive_ed25519(seed, path)?;
                Ok((KeyMaterial::ed25519(&key), walked))
            }
        }
    }
}

/// Apply `step` once per path level. A failed level is retried with the
/// next index, up to [`MAX_CHILD_ATTEMPTS`] times. Returns the final node and
/// the path actually walked.
fn walk<N, E, F>(root: N, path: &DerivationPath, mut step: F) -> Result<(N, DerivationPath)>
where
    E: std::fmt::Display,
    F: FnMut(&N, ChildNumber) -> std::result::Result<N, E>,
{
    let mut node = root;
    let mut walked = path.components();
    for (level, component) in walked.iter_mut().enumerate() {
        let mut attempt = 0;
        node = loop {
            let child = child_number(*component, path)?;
            match step(&node, child) {
                Ok(next) => break next,
                Err(e) if attempt + 1 < MAX_CHILD_ATTEMPTS => {
                    warn!(
                        path = %path,
                        level,
                        index = component.index,
                        error = %e,
                        "invalid child key, retrying with next index"
                    );
                    component.index += 1;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(WalletError::derivation(
                        path,
                        format!("no valid child at level {level}: {e}"),
                    ));
                }
            }
        };
    }
    Ok((node, DerivationPath::from_components(walked)))
}

fn child_number(component: PathComponent, path: &DerivationPath) -> Result<ChildNumber> {
    if component.index >= HARDENED {
        return Err(WalletError::derivation(
            path,
            format!("index {} exhausted the child range", component.index),
        ));
    }
    ChildNumber::new(component.index, component.hardened)
        .map_err(|e| WalletError::derivation(path, e))
}
