/*
[INPUT]:  User intents (create, recover, add asset, select, rename, delete)
[OUTPUT]: Persisted wallet registry mutations
[POS]:    Wallet layer - lifecycle orchestration over a WalletRepository
[UPDATE]: When adding lifecycle operations or changing selection rules
*/

use std::sync::Mutex;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::crypto::{DerivationPath, MnemonicService};
use crate::error::{Result, WalletError};
use crate::types::AssetSymbol;
use crate::wallet::record::{AssetKey, WalletRecord};
use crate::wallet::repository::{WalletRegistry, WalletRepository};

/// Wallet lifecycle over a repository.
///
/// Every mutation is load -> modify -> save under one in-process lock;
/// writers in other processes are caught by the repository revision check.
pub struct WalletManager<R: WalletRepository> {
    repository: R,
    write_lock: Mutex<()>,
}

impl<R: WalletRepository> WalletManager<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            write_lock: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Create from a fresh 12-word mnemonic, or recover from `mnemonic`.
    ///
    /// The first wallet in an empty registry becomes the selected one.
    #[instrument(skip(self, mnemonic), fields(recover = mnemonic.is_some()))]
    pub fn create_or_recover(&self, name: &str, mnemonic: Option<&str>) -> Result<WalletRecord> {
        let name = validate_name(name)?;
        let phrase = match mnemonic {
            Some(candidate) => MnemonicService::parse(candidate)?,
            None => MnemonicService::generate()?,
        };
        let record = WalletRecord::generate(name, phrase)?;

        self.mutate(|registry| {
            if registry.wallets.is_empty() {
                registry.selected = Some(record.id);
            }
            registry.wallets.push(record.clone());
            Ok(())
        })?;

        info!(wallet_id = %record.id, master = %record.master_address(), "wallet stored");
        Ok(record)
    }

    /// Derive and append one asset. Existing entries are never replaced.
    #[instrument(skip(self, symbol), fields(symbol = %symbol))]
    pub fn add_asset(
        &self,
        id: Uuid,
        symbol: &AssetSymbol,
        path: Option<DerivationPath>,
    ) -> Result<AssetKey> {
        let asset = self.mutate(|registry| {
            let record = find_mut(registry, id)?;
            if record.contains(symbol) {
                return Err(WalletError::DuplicateAsset {
                    symbol: symbol.to_string(),
                });
            }
            let asset = record.derive_asset(symbol, path)?;
            record.append(asset.clone())?;
            record.version += 1;
            Ok(asset)
        })?;

        info!(wallet_id = %id, path = %asset.path, address = %asset.address, "asset added");
        Ok(asset)
    }

    /// Remove a wallet; deleting the selected one clears the selection
    pub fn delete(&self, id: Uuid) -> Result<()> {
        self.mutate(|registry| {
            let before = registry.wallets.len();
            registry.wallets.retain(|w| w.id != id);
            if registry.wallets.len() == before {
                return Err(not_found(id));
            }
            if registry.selected == Some(id) {
                registry.selected = None;
            }
            Ok(())
        })?;
        info!(wallet_id = %id, "wallet deleted");
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<WalletRecord>> {
        Ok(self.repository.load()?.wallets)
    }

    pub fn get(&self, id: Uuid) -> Result<WalletRecord> {
        self.repository
            .load()?
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    pub fn select(&self, id: Uuid) -> Result<()> {
        self.mutate(|registry| {
            if registry.get(id).is_none() {
                return Err(not_found(id));
            }
            registry.selected = Some(id);
            Ok(())
        })
    }

    pub fn selected(&self) -> Result<Option<WalletRecord>> {
        Ok(self.repository.load()?.selected_wallet().cloned())
    }

    pub fn rename(&self, id: Uuid, name: &str) -> Result<()> {
        let name = validate_name(name)?;
        self.mutate(|registry| {
            let record = find_mut(registry, id)?;
            record.name = name;
            record.version += 1;
            Ok(())
        })
    }

    fn mutate<T>(&self, change: impl FnOnce(&mut WalletRegistry) -> Result<T>) -> Result<T> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| WalletError::Storage("wallet manager lock poisoned".to_string()))?;

        let mut registry = self.repository.load()?;
        let output = change(&mut registry)?;
        self.repository.save(&registry)?;
        Ok(output)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WalletError::Config("wallet name cannot be empty".to_string()));
    }
    Ok(name.to_string())
}

fn find_mut(registry: &mut WalletRegistry, id: Uuid) -> Result<&mut WalletRecord> {
    registry.get_mut(id).ok_or_else(|| not_found(id))
}

fn not_found(id: Uuid) -> WalletError {
    WalletError::WalletNotFound { id: id.to_string() }
}
