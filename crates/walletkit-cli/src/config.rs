/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed wallet CLI configuration with defaults
[POS]:    Configuration layer - storage location, RPC endpoints, backend
[UPDATE]: When adding new configuration options
*/

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use walletkit_core::ClientConfig;

/// Top-level configuration for the wallet CLI
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WalletkitConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub networks: NetworksConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Where and how wallet records are kept
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
    /// Seal secrets with a passphrase (`WALLETKIT_PASSPHRASE` or prompt)
    #[serde(default)]
    pub encrypted: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            encrypted: false,
        }
    }
}

/// RPC endpoints keyed by asset symbol. Each map left out of the file keeps
/// its built-in endpoints; a map that is present replaces them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworksConfig {
    #[serde(default = "default_evm_networks")]
    pub evm: BTreeMap<String, EvmNetwork>,
    #[serde(default = "default_solana_networks")]
    pub solana: BTreeMap<String, SolanaNetwork>,
}

impl Default for NetworksConfig {
    fn default() -> Self {
        Self {
            evm: default_evm_networks(),
            solana: default_solana_networks(),
        }
    }
}

fn default_evm_networks() -> BTreeMap<String, EvmNetwork> {
    BTreeMap::from([(
        "ETH".to_string(),
        EvmNetwork {
            rpc_url: "https://ethereum-rpc.publicnode.com".to_string(),
            chain_id: 1,
        },
    )])
}

fn default_solana_networks() -> BTreeMap<String, SolanaNetwork> {
    BTreeMap::from([
        (
            "SOL".to_string(),
            SolanaNetwork {
                rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            },
        ),
        (
            "SOL-DEVNET".to_string(),
            SolanaNetwork {
                rpc_url: "https://api.devnet.solana.com".to_string(),
            },
        ),
    ])
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvmNetwork {
    pub rpc_url: String,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolanaNetwork {
    pub rpc_url: String,
}

/// Wallet backend (auth challenges, Solana fee sponsorship)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("walletkit")
        .join("wallets.json")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl WalletkitConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content).context("parse config YAML")?;
        Ok(config)
    }

    /// Explicit path, else `<config_dir>/walletkit/config.yaml` if present, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match dirs::config_dir().map(|dir| dir.join("walletkit").join("config.yaml")) {
            Some(default) if default.exists() => Self::from_file(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Network for `symbol`, falling back to the asset it rides on (USDT -> ETH)
    pub fn evm_network(&self, symbol: &str, parent: Option<&str>) -> Option<&EvmNetwork> {
        self.networks
            .evm
            .get(symbol)
            .or_else(|| parent.and_then(|p| self.networks.evm.get(p)))
    }

    pub fn solana_network(&self, symbol: &str) -> Option<&SolanaNetwork> {
        self.networks.solana.get(symbol)
    }
}
