/*
[INPUT]:  Validated mnemonic, asset symbols, optional explicit paths
[OUTPUT]: Wallet records holding per-asset address / key / path triples
[POS]:    Wallet layer - persisted entity and its derivation invariants
[UPDATE]: When the record schema or primary asset set changes
*/

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::address::AddressCodec;
use crate::crypto::{
    DerivationPath, DerivationPathAllocator, KeyDerivationEngine, KeyMaterial, MnemonicPhrase,
    MnemonicService, Seed,
};
use crate::error::{Result, WalletError};
use crate::types::{AssetSymbol, BTC, ETH, SOL, USDT};

/// Assets every new wallet starts with, in derivation order
pub const PRIMARY_ASSETS: [&str; 4] = [BTC, ETH, SOL, USDT];

/// One asset's derived entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetKey {
    pub symbol: AssetSymbol,
    pub address: String,
    pub key: KeyMaterial,
    pub path: DerivationPath,
}

/// A wallet: one mnemonic and the asset keys derived from it.
///
/// `addresses`, `private_keys` and `paths` always share one key set. Entries
/// are only ever appended.
#[derive(Clone)]
pub struct WalletRecord {
    pub id: Uuid,
    pub name: String,
    master_address: String,
    mnemonic: MnemonicPhrase,
    addresses: BTreeMap<AssetSymbol, String>,
    private_keys: BTreeMap<AssetSymbol, KeyMaterial>,
    paths: BTreeMap<AssetSymbol, DerivationPath>,
    pub created_at: DateTime<Utc>,
    /// Bumped on every persisted mutation
    pub version: u64,
}

impl WalletRecord {
    /// Derive a fresh record with BTC, ETH, SOL and USDT (ERC-20 on the ETH key)
    pub fn generate(name: impl Into<String>, mnemonic: MnemonicPhrase) -> Result<Self> {
        let seed = MnemonicService::to_seed(&mnemonic, "");
        let mut record = Self {
            id: Uuid::new_v4(),
            name: name.into(),
            master_address: String::new(),
            mnemonic,
            addresses: BTreeMap::new(),
            private_keys: BTreeMap::new(),
            paths: BTreeMap::new(),
            created_at: Utc::now(),
            version: 0,
        };

        for symbol in PRIMARY_ASSETS.map(AssetSymbol::well_known) {
            let asset = record.derive_with_seed(&seed, &symbol, None)?;
            record.append(asset)?;
        }

        record.master_address = record
            .address(&AssetSymbol::well_known(ETH))
            .map(str::to_string)
            .ok_or_else(|| WalletError::address(ETH, "primary ETH address missing"))?;

        debug!(wallet_id = %record.id, assets = record.paths.len(), "wallet record generated");
        Ok(record)
    }

    /// Rebuild a record from stored parts, enforcing the shared key set
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id: Uuid,
        name: String,
        master_address: String,
        mnemonic: MnemonicPhrase,
        addresses: BTreeMap<AssetSymbol, String>,
        private_keys: BTreeMap<AssetSymbol, KeyMaterial>,
        paths: BTreeMap<AssetSymbol, DerivationPath>,
        created_at: DateTime<Utc>,
        version: u64,
    ) -> Result<Self> {
        let same_keys = addresses.keys().eq(private_keys.keys()) && addresses.keys().eq(paths.keys());
        if !same_keys {
            return Err(WalletError::Storage(format!(
                "wallet {id} has mismatched address/key/path entries"
            )));
        }

        Ok(Self {
            id,
            name,
            master_address,
            mnemonic,
            addresses,
            private_keys,
            paths,
            created_at,
            version,
        })
    }

    /// ETH primary address, the wallet's chain-agnostic identity
    pub fn master_address(&self) -> &str {
        &self.master_address
    }

    pub fn mnemonic(&self) -> &MnemonicPhrase {
        &self.mnemonic
    }

    /// Regenerated from the mnemonic on every call
    pub fn seed(&self) -> Seed {
        MnemonicService::to_seed(&self.mnemonic, "")
    }

    pub fn contains(&self, symbol: &AssetSymbol) -> bool {
        self.addresses.contains_key(symbol)
    }

    pub fn address(&self, symbol: &AssetSymbol) -> Option<&str> {
        self.addresses.get(symbol).map(String::as_str)
    }

    pub fn path(&self, symbol: &AssetSymbol) -> Option<&DerivationPath> {
        self.paths.get(symbol)
    }

    /// Private key for signing; absence is a signing failure
    pub fn key(&self, symbol: &AssetSymbol) -> Result<&KeyMaterial> {
        self.private_keys
            .get(symbol)
            .ok_or_else(|| WalletError::signing(symbol, "no private key for this asset"))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &AssetSymbol> {
        self.addresses.keys()
    }

    pub fn addresses(&self) -> &BTreeMap<AssetSymbol, String> {
        &self.addresses
    }

    pub fn paths(&self) -> &BTreeMap<AssetSymbol, DerivationPath> {
        &self.paths
    }

    pub(crate) fn private_keys(&self) -> &BTreeMap<AssetSymbol, KeyMaterial> {
        &self.private_keys
    }

    /// Allocate, derive and encode `symbol` without touching the record
    pub fn derive_asset(&self, symbol: &AssetSymbol, explicit: Option<DerivationPath>) -> Result<AssetKey> {
        let seed = self.seed();
        self.derive_with_seed(&seed, symbol, explicit)
    }

    fn derive_with_seed(
        &self,
        seed: &Seed,
        symbol: &AssetSymbol,
        explicit: Option<DerivationPath>,
    ) -> Result<AssetKey> {
        if explicit.is_none() {
            if let Some(parent) = symbol.alias_of() {
                return self.alias(symbol, &parent);
            }
        }

        let requested = DerivationPathAllocator::allocate(symbol, &self.paths, explicit)?;
        let (key, path) = KeyDerivationEngine::derive_key_material(seed, &requested, symbol.curve())?;
        if path != requested {
            // An index bump during derivation must not land on a taken path
            DerivationPathAllocator::allocate(symbol, &self.paths, Some(path))?;
        }
        let address = AddressCodec::encode(symbol, &key)?;

        debug!(symbol = %symbol, path = %path, "asset derived");
        Ok(AssetKey {
            symbol: symbol.clone(),
            address,
            key,
            path,
        })
    }

    fn alias(&self, symbol: &AssetSymbol, parent: &AssetSymbol) -> Result<AssetKey> {
        let (Some(address), Some(key), Some(path)) = (
            self.addresses.get(parent),
            self.private_keys.get(parent),
            self.paths.get(parent),
        ) else {
            return Err(WalletError::UnsupportedAsset {
                symbol: symbol.to_string(),
            });
        };

        Ok(AssetKey {
            symbol: symbol.clone(),
            address: address.clone(),
            key: key.clone(),
            path: *path,
        })
    }

    /// Insert into all three maps, or into none
    pub(crate) fn append(&mut self, asset: AssetKey) -> Result<()> {
        if self.contains(&asset.symbol) {
            return Err(WalletError::DuplicateAsset {
                symbol: asset.symbol.to_string(),
            });
        }

        self.addresses.insert(asset.symbol.clone(), asset.address);
        self.paths.insert(asset.symbol.clone(), asset.path);
        self.private_keys.insert(asset.symbol, asset.key);
        Ok(())
    }

    /// Re-derive every asset and check it reproduces the stored address and key
    pub fn verify(&self) -> Result<()> {
        let seed = self.seed();
        for (symbol, path) in &self.paths {
            let stored_address = &self.addresses[symbol];
            let stored_key = &self.private_keys[symbol];

            let (key, walked) = KeyDerivationEngine::derive_key_material(&seed, path, symbol.curve())?;
            if walked != *path {
                return Err(WalletError::derivation(path, format!("{symbol} re-derived at {walked}")));
            }
            let address = AddressCodec::encode(symbol, &key)?;
            if &address != stored_address || &key != stored_key {
                return Err(WalletError::address(
                    symbol,
                    format!("stored entry diverges from derivation at {path}"),
                ));
            }
        }

        if self.address(&AssetSymbol::well_known(ETH)) != Some(self.master_address.as_str()) {
            return Err(WalletError::address(ETH, "master address is not the ETH primary address"));
        }
        Ok(())
    }
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("master_address", &self.master_address)
            .field("addresses", &self.addresses)
            .field("created_at", &self.created_at)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn sym(s: &str) -> AssetSymbol {
        AssetSymbol::new(s).unwrap()
    }

    fn record() -> WalletRecord {
        let mnemonic = MnemonicService::parse(PHRASE).unwrap();
        WalletRecord::generate("main", mnemonic).unwrap()
    }

    #[test]
    fn test_generate_reference_addresses() {
        let record = record();
        assert_eq!(record.address(&sym("ETH")), Some("0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));
        assert_eq!(record.address(&sym("BTC")), Some("1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"));
        assert_eq!(record.address(&sym("SOL")), Some("4EngF3p73rFnEgjcAG5DVQ91QGFze4vsvjVUkAwLjv14"));
        assert_eq!(record.master_address(), "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    }

    #[test]
    fn test_usdt_shares_eth_entry() {
        let record = record();
        assert_eq!(record.address(&sym("USDT")), record.address(&sym("ETH")));
        assert_eq!(record.key(&sym("USDT")).unwrap(), record.key(&sym("ETH")).unwrap());
        assert_eq!(record.path(&sym("USDT")), record.path(&sym("ETH")));
    }

    #[test]
    fn test_maps_share_key_set() {
        let record = record();
        let symbols: Vec<_> = record.symbols().cloned().collect();
        assert_eq!(symbols.len(), 4);
        assert!(record.paths().keys().eq(symbols.iter()));
        assert!(record.private_keys().keys().eq(symbols.iter()));
    }

    #[test]
    fn test_verify_reproduces_all_entries() {
        let mut record = record();
        let eth2 = record.derive_asset(&sym("ETH2"), None).unwrap();
        record.append(eth2).unwrap();
        let matic = record.derive_asset(&sym("MATIC"), None).unwrap();
        record.append(matic).unwrap();
        record.verify().unwrap();
    }

    #[test]
    fn test_append_is_all_or_nothing_on_duplicate() {
        let mut record = record();
        let again = AssetKey {
            symbol: sym("ETH"),
            address: "0x0000000000000000000000000000000000000000".to_string(),
            key: record.key(&sym("BTC")).unwrap().clone(),
            path: DerivationPath::bip44(60, 5, 0, 0),
        };
        let err = record.append(again).unwrap_err();
        assert!(matches!(err, WalletError::DuplicateAsset { .. }));
        assert_eq!(record.address(&sym("ETH")), Some("0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));
        assert_eq!(record.path(&sym("ETH")).unwrap().to_string(), "m/44'/60'/0'/0/0");
    }

    #[test]
    fn test_missing_key_is_signing_failure() {
        let err = record().key(&sym("MATIC")).unwrap_err();
        assert!(matches!(err, WalletError::SigningFailure { .. }));
    }

    #[test]
    fn test_solana_variant_aliases_sol() {
        let record = record();
        let devnet = record.derive_asset(&sym("SOL-DEVNET"), None).unwrap();
        assert_eq!(Some(devnet.address.as_str()), record.address(&sym("SOL")));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let mut record = record();
        record
            .addresses
            .insert(sym("BTC"), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH".to_string());
        assert!(record.verify().is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", record());
        assert!(!debug.contains("abandon"));
        assert!(!debug.contains("1ab42cc4"));
    }
}
