/*
[INPUT]:  BIP-44 path strings or component tuples
[OUTPUT]: Validated five-level derivation paths
[POS]:    Crypto layer - path value type shared by allocator, engine and record
[UPDATE]: When path syntax or hardening rules change
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// BIP-32 hardened offset
pub const HARDENED: u32 = 0x8000_0000;

pub const PURPOSE_BIP44: u32 = 44;
pub const COIN_BITCOIN: u32 = 0;
pub const COIN_ETHEREUM: u32 = 60;
pub const COIN_SOLANA: u32 = 501;

/// One level of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathComponent {
    pub index: u32,
    pub hardened: bool,
}

impl PathComponent {
    pub const fn hardened(index: u32) -> Self {
        Self {
            index,
            hardened: true,
        }
    }

    pub const fn normal(index: u32) -> Self {
        Self {
            index,
            hardened: false,
        }
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// `m / purpose' / coin_type' / account' / change / address_index`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivationPath {
    pub purpose: PathComponent,
    pub coin_type: PathComponent,
    pub account: PathComponent,
    pub change: PathComponent,
    pub address_index: PathComponent,
}

impl DerivationPath {
    /// Standard BIP-44 shape: first three levels hardened, last two normal
    pub const fn bip44(coin_type: u32, account: u32, change: u32, address_index: u32) -> Self {
        Self {
            purpose: PathComponent::hardened(PURPOSE_BIP44),
            coin_type: PathComponent::hardened(coin_type),
            account: PathComponent::hardened(account),
            change: PathComponent::normal(change),
            address_index: PathComponent::normal(address_index),
        }
    }

    pub fn components(&self) -> [PathComponent; 5] {
        [
            self.purpose,
            self.coin_type,
            self.account,
            self.change,
            self.address_index,
        ]
    }

    pub(crate) fn from_components(c: [PathComponent; 5]) -> Self {
        Self {
            purpose: c[0],
            coin_type: c[1],
            account: c[2],
            change: c[3],
            address_index: c[4],
        }
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in self.components() {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(format!("path must start with 'm': {s}"));
        }

        let mut components = Vec::with_capacity(5);
        for part in parts {
            let (digits, hardened) = match part.strip_suffix(['\'', 'h', 'H']) {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            let index: u32 = digits
                .parse()
                .map_err(|_| format!("invalid path component {part:?} in {s}"))?;
            if index >= HARDENED {
                return Err(format!("path component {index} out of range in {s}"));
            }
            components.push(PathComponent { index, hardened });
        }

        let components: [PathComponent; 5] = components
            .try_into()
            .map_err(|c: Vec<_>| format!("expected 5 path levels, got {} in {s}", c.len()))?;

        if components[0] != PathComponent::hardened(PURPOSE_BIP44) {
            return Err(format!("purpose must be 44' in {s}"));
        }

        Ok(Self::from_components(components))
    }
}

impl Serialize for DerivationPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DerivationPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
