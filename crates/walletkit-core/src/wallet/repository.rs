/*
[INPUT]:  Wallet registries to persist, or a wallet file on disk
[OUTPUT]: Loaded registries; atomic, revision-checked saves
[POS]:    Wallet layer - persistence boundary (JSON file or in-memory)
[UPDATE]: When the on-disk schema, locking or sealing changes
*/

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::crypto::{DerivationPath, KeyMaterial, MnemonicService};
use crate::error::{Result, WalletError};
use crate::types::{AssetSymbol, Curve};
use crate::wallet::cipher::{AesGcmCipher, AtRestCipher, PlaintextCipher};
use crate::wallet::record::WalletRecord;

/// Every wallet plus the current selection.
///
/// `revision` is the optimistic-concurrency token: a save only succeeds when
/// the stored revision still equals the one this registry was loaded at.
#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    pub wallets: Vec<WalletRecord>,
    pub selected: Option<Uuid>,
    pub revision: u64,
}

impl WalletRegistry {
    pub fn get(&self, id: Uuid) -> Option<&WalletRecord> {
        self.wallets.iter().find(|w| w.id == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut WalletRecord> {
        self.wallets.iter_mut().find(|w| w.id == id)
    }

    pub fn selected_wallet(&self) -> Option<&WalletRecord> {
        self.selected.and_then(|id| self.get(id))
    }
}

/// Load/save boundary for wallet registries
pub trait WalletRepository: Send + Sync {
    fn load(&self) -> Result<WalletRegistry>;

    /// Persist `registry`, failing with `VersionConflict` if someone else
    /// saved since it was loaded. Returns the new revision.
    fn save(&self, registry: &WalletRegistry) -> Result<u64>;
}

/// Registry kept in process memory (tests, dry runs)
#[derive(Debug, Default)]
pub struct MemoryRepository {
    inner: Mutex<WalletRegistry>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WalletRepository for MemoryRepository {
    fn load(&self) -> Result<WalletRegistry> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| WalletError::Storage("registry lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, registry: &WalletRegistry) -> Result<u64> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| WalletError::Storage("registry lock poisoned".to_string()))?;
        check_revision(guard.revision, registry.revision)?;

        let mut next = registry.clone();
        next.revision += 1;
        *guard = next;
        Ok(guard.revision)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRegistry {
    revision: u64,
    cipher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kdf_salt: Option<String>,
    selected: Option<Uuid>,
    wallets: Vec<StoredWallet>,
}

/// Only the fields needed before the wallets themselves are opened
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredHeader {
    revision: u64,
    #[serde(default)]
    kdf_salt: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWallet {
    id: Uuid,
    name: String,
    master_address: String,
    mnemonic: String,
    addresses: BTreeMap<AssetSymbol, String>,
    private_keys: BTreeMap<AssetSymbol, StoredKey>,
    paths: BTreeMap<AssetSymbol, DerivationPath>,
    created_at: DateTime<Utc>,
    version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredKey {
    curve: Curve,
    key: String,
}

/// Registry persisted as one pretty-printed JSON file.
///
/// Writes go to a temp file in the same directory and are renamed over the
/// target, under an exclusive lock on `<file>.lock`. The file is created
/// with mode 0600 on unix.
pub struct JsonFileRepository {
    path: PathBuf,
    cipher: Box<dyn AtRestCipher>,
}

impl JsonFileRepository {
    /// Secrets are stored unencrypted
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_cipher(path, Box::new(PlaintextCipher))
    }

    pub fn with_cipher(path: impl Into<PathBuf>, cipher: Box<dyn AtRestCipher>) -> Self {
        let path = path.into();
        if cipher.is_plaintext() {
            warn!(path = %path.display(), "wallet secrets will be stored unencrypted");
        }
        Self { path, cipher }
    }

    /// AES-256-GCM sealing. The key is derived once here, from the salt
    /// already in the file or from a fresh one for a new file.
    pub fn open_encrypted(path: impl Into<PathBuf>, passphrase: &str) -> Result<Self> {
        let path = path.into();
        let stored_salt = match read_header(&path)? {
            Some(header) => header.kdf_salt,
            None => None,
        };
        let cipher = match stored_salt {
            Some(salt) => {
                let salt = hex::decode(&salt)
                    .map_err(|e| WalletError::Storage(format!("kdf salt is not hex: {e}")))?;
                AesGcmCipher::derive(passphrase, &salt)?
            }
            None => AesGcmCipher::generate(passphrase)?,
        };
        Ok(Self::with_cipher(path, Box::new(cipher)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn acquire_lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| storage("open lock file", e))?;
        file.lock_exclusive().map_err(|e| storage("lock wallet file", e))?;
        Ok(file)
    }

    fn stored_revision(&self) -> Result<u64> {
        Ok(read_header(&self.path)?.map_or(0, |header| header.revision))
    }

    fn to_stored(&self, registry: &WalletRegistry, revision: u64) -> Result<StoredRegistry> {
        let wallets = registry
            .wallets
            .iter()
            .map(|record| self.seal_wallet(record))
            .collect::<Result<Vec<_>>>()?;

        Ok(StoredRegistry {
            revision,
            cipher: self.cipher.name().to_string(),
            kdf_salt: self.cipher.salt().map(hex::encode),
            selected: registry.selected,
            wallets,
        })
    }

    fn seal_wallet(&self, record: &WalletRecord) -> Result<StoredWallet> {
        let private_keys = record
            .private_keys()
            .iter()
            .map(|(symbol, key)| {
                let sealed = self.cipher.encrypt(&key.encode())?;
                Ok((
                    symbol.clone(),
                    StoredKey {
                        curve: key.curve(),
                        key: sealed,
                    },
                ))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(StoredWallet {
            id: record.id,
            name: record.name.clone(),
            master_address: record.master_address().to_string(),
            mnemonic: self.cipher.encrypt(&record.mnemonic().phrase())?,
            addresses: record.addresses().clone(),
            private_keys,
            paths: record.paths().clone(),
            created_at: record.created_at,
            version: record.version,
        })
    }

    fn open_wallet(&self, stored: StoredWallet) -> Result<WalletRecord> {
        let phrase = self.cipher.decrypt(&stored.mnemonic)?;
        let mnemonic = MnemonicService::parse(&phrase)
            .map_err(|e| WalletError::Storage(format!("wallet {}: {e}", stored.id)))?;

        let private_keys = stored
            .private_keys
            .into_iter()
            .map(|(symbol, stored_key)| {
                let encoded = self.cipher.decrypt(&stored_key.key)?;
                let key = KeyMaterial::decode(stored_key.curve, &encoded)
                    .map_err(|e| WalletError::Storage(format!("wallet {} key {symbol}: {e}", stored.id)))?;
                Ok((symbol, key))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        WalletRecord::from_parts(
            stored.id,
            stored.name,
            stored.master_address,
            mnemonic,
            stored.addresses,
            private_keys,
            stored.paths,
            stored.created_at,
            stored.version,
        )
    }

    fn write_atomic(&self, stored: &StoredRegistry) -> Result<()> {
        let parent = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| storage("create wallet directory", e))?;

        let mut temp_file = NamedTempFile::new_in(&parent).map_err(|e| storage("create temp file", e))?;
        let json = serde_json::to_string_pretty(stored)?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| storage("write temp file", e))?;
        temp_file.flush().map_err(|e| storage("flush temp file", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp_file.path(), fs::Permissions::from_mode(0o600))
                .map_err(|e| storage("set wallet file permissions", e))?;
        }

        temp_file
            .persist(&self.path)
            .map_err(|e| storage("replace wallet file", e.error))?;
        Ok(())
    }
}

impl std::fmt::Debug for JsonFileRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileRepository")
            .field("path", &self.path)
            .field("cipher", &self.cipher.name())
            .finish()
    }
}

impl WalletRepository for JsonFileRepository {
    fn load(&self) -> Result<WalletRegistry> {
        if !self.path.exists() {
            return Ok(WalletRegistry::default());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| storage("read wallet file", e))?;
        let stored: StoredRegistry = serde_json::from_str(&contents)
            .map_err(|e| WalletError::Storage(format!("wallet file is corrupt: {e}")))?;

        if stored.cipher != self.cipher.name() {
            return Err(WalletError::Storage(format!(
                "wallet file is sealed with {} but {} is configured",
                stored.cipher,
                self.cipher.name()
            )));
        }
        if let Some(salt) = self.cipher.salt() {
            if stored.kdf_salt.as_deref() != Some(hex::encode(salt).as_str()) {
                return Err(WalletError::Storage(
                    "wallet file was sealed under a different key salt; reopen it".to_string(),
                ));
            }
        }

        let wallets = stored
            .wallets
            .into_iter()
            .map(|w| self.open_wallet(w))
            .collect::<Result<Vec<_>>>()?;

        debug!(path = %self.path.display(), wallets = wallets.len(), revision = stored.revision, "wallet file loaded");
        Ok(WalletRegistry {
            wallets,
            selected: stored.selected,
            revision: stored.revision,
        })
    }

    fn save(&self, registry: &WalletRegistry) -> Result<u64> {
        let lock = self.acquire_lock()?;

        let result = self.stored_revision().and_then(|found| {
            check_revision(found, registry.revision)?;
            let next = found + 1;
            let stored = self.to_stored(registry, next)?;
            self.write_atomic(&stored)?;
            Ok(next)
        });

        if let Err(e) = lock.unlock() {
            warn!(error = %e, "failed to release wallet file lock");
        }

        let revision = result?;
        debug!(path = %self.path.display(), revision, "wallet file saved");
        Ok(revision)
    }
}

fn read_header(path: &Path) -> Result<Option<StoredHeader>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|e| storage("read wallet file", e))?;
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| WalletError::Storage(format!("wallet file is corrupt: {e}")))
}

fn check_revision(found: u64, expected: u64) -> Result<()> {
    if found != expected {
        return Err(WalletError::VersionConflict {
            id: "registry".to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

fn storage(context: &str, err: std::io::Error) -> WalletError {
    WalletError::Storage(format!("{context}: {err}"))
}
