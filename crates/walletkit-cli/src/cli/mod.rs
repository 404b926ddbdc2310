/*
[INPUT]:  Parsed configuration and global flags
[OUTPUT]: Session shared by every subcommand handler
[POS]:    CLI layer - wiring between configuration and the wallet library
[UPDATE]: When adding subcommands or changing how storage is opened
*/

pub mod coupons;
pub mod transfer;
pub mod wallet;

use std::io::IsTerminal;

use anyhow::{Context, Result, anyhow};
use dialoguer::{Password, theme::ColorfulTheme};
use uuid::Uuid;
use walletkit_core::{JsonFileRepository, WalletManager, WalletRecord};

use crate::config::WalletkitConfig;

pub const PASSPHRASE_ENV: &str = "WALLETKIT_PASSPHRASE";

/// Configuration plus an opened wallet store
pub struct Session {
    pub config: WalletkitConfig,
    pub manager: WalletManager<JsonFileRepository>,
    /// Build and sign, never submit
    pub dry_run: bool,
}

impl Session {
    pub fn open(config: WalletkitConfig, dry_run: bool) -> Result<Self> {
        let storage = &config.storage;
        if let Some(parent) = storage.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create storage directory {}", parent.display()))?;
        }

        let repository = if storage.encrypted {
            let passphrase = storage_passphrase()?;
            JsonFileRepository::open_encrypted(storage.path.clone(), &passphrase)
                .with_context(|| format!("open encrypted storage {}", storage.path.display()))?
        } else {
            JsonFileRepository::new(storage.path.clone())
        };

        Ok(Self {
            config,
            manager: WalletManager::new(repository),
            dry_run,
        })
    }

    /// The wallet named by `id`, else the selected one
    pub fn wallet(&self, id: Option<Uuid>) -> Result<WalletRecord> {
        match id {
            Some(id) => Ok(self.manager.get(id)?),
            None => self
                .manager
                .selected()?
                .ok_or_else(|| anyhow!("no wallet selected; pass a wallet id or run `walletkit select`")),
        }
    }
}

fn storage_passphrase() -> Result<String> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        return Ok(passphrase);
    }
    if !std::io::stdin().is_terminal() {
        return Err(anyhow!("encrypted storage needs {PASSPHRASE_ENV} when stdin is not a terminal"));
    }
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Storage passphrase")
        .interact()
        .context("read storage passphrase")
}
