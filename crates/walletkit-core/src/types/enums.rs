/*
[INPUT]:  Asset symbols chosen by the user or the wallet lifecycle
[OUTPUT]: Curve and address-format classification per symbol
[POS]:    Data layer - closed sets the codecs and signers dispatch on
[UPDATE]: When adding a chain family or a new well-known symbol
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Well-known symbols
pub const BTC: &str = "BTC";
pub const ETH: &str = "ETH";
pub const SOL: &str = "SOL";
pub const USDT: &str = "USDT";

/// Elliptic curve backing an asset's key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Secp256k1,
    Ed25519,
}

/// How a derived key is rendered as a chain address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFormat {
    /// EIP-55 checksummed hex, shared by every EVM chain and testnet
    Evm,
    /// Base58Check P2PKH
    Bitcoin,
    /// Base58 ed25519 public key
    Solana,
}

impl AddressFormat {
    pub fn curve(self) -> Curve {
        match self {
            AddressFormat::Evm | AddressFormat::Bitcoin => Curve::Secp256k1,
            AddressFormat::Solana => Curve::Ed25519,
        }
    }
}

/// Uppercase asset symbol (`BTC`, `ETH`, `ETH2`, `MATIC`, `SOL-DEVNET`, ...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetSymbol(String);

impl AssetSymbol {
    pub fn new(symbol: impl AsRef<str>) -> Option<Self> {
        let symbol = symbol.as_ref().trim();
        let valid = !symbol.is_empty()
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(symbol.to_ascii_uppercase()))
    }

    /// One of the uppercase constants in this module
    pub fn well_known(symbol: &'static str) -> Self {
        Self(symbol.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn address_format(&self) -> AddressFormat {
        if self.0 == BTC {
            AddressFormat::Bitcoin
        } else if self.is_solana_family() {
            AddressFormat::Solana
        } else {
            AddressFormat::Evm
        }
    }

    pub fn curve(&self) -> Curve {
        self.address_format().curve()
    }

    /// `SOL` and its cluster variants (`SOL-DEVNET`, `SOL-TESTNET`)
    pub fn is_solana_family(&self) -> bool {
        self.0 == SOL || self.0.starts_with("SOL-")
    }

    /// Additional Ethereum addresses: `ETH2`, `ETH3`, ...
    pub fn is_extra_eth_address(&self) -> bool {
        self.0
            .strip_prefix(ETH)
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    }

    /// Symbols that ride on another asset's key instead of owning a path.
    ///
    /// USDT is an ERC-20 on the primary ETH account; Solana cluster variants
    /// reuse the mainnet keypair.
    pub fn alias_of(&self) -> Option<AssetSymbol> {
        if self.0 == USDT {
            Some(Self(ETH.to_string()))
        } else if self.is_solana_family() && self.0 != SOL {
            Some(Self(SOL.to_string()))
        } else {
            None
        }
    }
}

impl fmt::Display for AssetSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AssetSymbol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or_else(|| format!("invalid asset symbol: {s:?}"))
    }
}

impl TryFrom<String> for AssetSymbol {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AssetSymbol> for String {
    fn from(value: AssetSymbol) -> Self {
        value.0
    }
}
