/*
[INPUT]:  Target asset symbol, the wallet's existing symbol -> path map, optional explicit path
[OUTPUT]: A BIP-44 path distinct from every path already owned by another symbol
[POS]:    Crypto layer - deterministic path allocation ahead of derivation
[UPDATE]: When allocation rules for new asset categories change
*/

use std::collections::BTreeMap;

use crate::crypto::path::{COIN_BITCOIN, COIN_ETHEREUM, COIN_SOLANA, DerivationPath};
use crate::error::{Result, WalletError};
use crate::types::{AssetSymbol, BTC, ETH, SOL};

/// Allocates derivation paths from a wallet's allocation history.
///
/// Pure: the same history and symbol always yield the same path.
pub struct DerivationPathAllocator;

impl DerivationPathAllocator {
    /// Fixed primary path for BTC, ETH and SOL
    pub fn primary_path(symbol: &AssetSymbol) -> Option<DerivationPath> {
        match symbol.as_str() {
            BTC => Some(DerivationPath::bip44(COIN_BITCOIN, 0, 0, 0)),
            ETH => Some(DerivationPath::bip44(COIN_ETHEREUM, 0, 0, 0)),
            SOL => Some(DerivationPath::bip44(COIN_SOLANA, 0, 0, 0)),
            _ => None,
        }
    }

    /// Resolve the path for `symbol`.
    ///
    /// - BTC / ETH / SOL: fixed primary paths
    /// - `ETH<n>`: next `address_index` on the `m/44'/60'/0'/0/*` branch
    /// - any other EVM token: next `account` on coin type 60, `m/44'/60'/{n}'/0/0`
    /// - explicit paths are accepted as given
    ///
    /// Every result is checked against the paths owned by other symbols.
    pub fn allocate(
        symbol: &AssetSymbol,
        existing: &BTreeMap<AssetSymbol, DerivationPath>,
        explicit: Option<DerivationPath>,
    ) -> Result<DerivationPath> {
        let path = match explicit {
            Some(path) => path,
            None => Self::implicit(symbol, existing)?,
        };

        if let Some((owner, _)) = existing
            .iter()
            .find(|(owner, owned)| *owned == &path && *owner != symbol)
        {
            return Err(WalletError::derivation(
                path,
                format!("already allocated to {owner}"),
            ));
        }

        Ok(path)
    }

    fn implicit(
        symbol: &AssetSymbol,
        existing: &BTreeMap<AssetSymbol, DerivationPath>,
    ) -> Result<DerivationPath> {
        if let Some(path) = Self::primary_path(symbol) {
            return Ok(path);
        }

        if symbol.is_extra_eth_address() {
            let next_index = existing
                .values()
                .filter(|p| on_primary_eth_branch(p))
                .map(|p| p.address_index.index)
                .max()
                .map_or(0, |max| max + 1);
            return Ok(DerivationPath::bip44(COIN_ETHEREUM, 0, 0, next_index));
        }

        if symbol.is_solana_family() || symbol.as_str() == BTC {
            return Err(WalletError::UnsupportedAsset {
                symbol: symbol.to_string(),
            });
        }

        let next_account = existing
            .values()
            .filter(|p| p.coin_type.index == COIN_ETHEREUM)
            .map(|p| p.account.index)
            .max()
            .map_or(0, |max| max + 1);
        Ok(DerivationPath::bip44(COIN_ETHEREUM, next_account, 0, 0))
    }
}

fn on_primary_eth_branch(path: &DerivationPath) -> bool {
    path.coin_type.index == COIN_ETHEREUM && path.account.index == 0 && path.change.index == 0
}
