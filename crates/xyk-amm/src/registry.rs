// SPDX-License-Identifier: AGPL-3.0-only
//! # Pair Registry
//!
//! Directory of all pair ledgers. Every unordered asset pair maps to at most
//! one pair, keyed by the canonical (lexicographically sorted) asset order,
//! and every pair's address is derived deterministically from the registry
//! address and the canonical pair. Anyone can create a pair.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use xyk_asset::TokenMetadata;

use crate::error::AmmError;
use crate::event::AmmEvent;
use crate::pair::PairLedger;
use crate::DexState;

/// Canonical ordering for an asset pair. Identical assets are rejected.
pub fn sort_assets<'a>(asset_a: &'a str, asset_b: &'a str) -> Result<(&'a str, &'a str), AmmError> {
    if asset_a == asset_b {
        return Err(AmmError::IdenticalAssets);
    }
    if asset_a < asset_b {
        Ok((asset_a, asset_b))
    } else {
        Ok((asset_b, asset_a))
    }
}

/// Deterministic pair address: `"XPAIR" + hex(blake3(registry:token0:token1)[0..16])`.
///
/// Computable off-line before the pair exists, so callers can pre-fund or
/// pre-approve a pair address ahead of creation.
pub fn derive_pair_address(registry_address: &str, token0: &str, token1: &str) -> String {
    let preimage = format!("{}:{}:{}", registry_address, token0, token1);
    let hash = blake3::hash(preimage.as_bytes());
    format!("XPAIR{}", hex::encode(&hash.as_bytes()[0..16]))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairRegistry {
    /// Registry's own address, mixed into every derived pair address
    pub address: String,
    /// Protocol fee collector, None disables the fee switch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_to: Option<String>,
    /// Canonical "token0:token1" key → pair address
    pub pairs: BTreeMap<String, String>,
    /// Pair addresses in creation order
    pub all_pairs: Vec<String>,
}

impl PairRegistry {
    pub fn new(address: &str) -> Self {
        PairRegistry {
            address: address.to_string(),
            fee_to: None,
            pairs: BTreeMap::new(),
            all_pairs: Vec::new(),
        }
    }

    fn pair_key(token0: &str, token1: &str) -> String {
        format!("{}:{}", token0, token1)
    }

    /// Look up the pair address for an unordered asset pair.
    pub fn get_pair(&self, asset_a: &str, asset_b: &str) -> Result<Option<&String>, AmmError> {
        let (token0, token1) = sort_assets(asset_a, asset_b)?;
        Ok(self.pairs.get(&Self::pair_key(token0, token1)))
    }

    /// Record a new pair, returning its creation index.
    fn insert(&mut self, token0: &str, token1: &str, pair_address: &str) -> u64 {
        self.pairs
            .insert(Self::pair_key(token0, token1), pair_address.to_string());
        self.all_pairs.push(pair_address.to_string());
        (self.all_pairs.len() - 1) as u64
    }

    pub fn all_pairs_length(&self) -> u64 {
        self.all_pairs.len() as u64
    }

    /// Pair address by creation index.
    pub fn pair_at(&self, index: u64) -> Option<&String> {
        self.all_pairs.get(index as usize)
    }

    /// Address the pair for this unordered asset pair has, or will have.
    pub fn pair_address_for(&self, asset_a: &str, asset_b: &str) -> Result<String, AmmError> {
        let (token0, token1) = sort_assets(asset_a, asset_b)?;
        Ok(derive_pair_address(&self.address, token0, token1))
    }
}

impl DexState {
    /// Create the pair ledger for an unordered asset pair.
    ///
    /// Sorts the pair canonically, derives the pair address, registers the
    /// pair's share token under that address and records the pair in the
    /// registry. Fails if either asset is unregistered or the pair exists.
    pub fn create_pair(&mut self, asset_a: &str, asset_b: &str) -> Result<String, AmmError> {
        let (token0, token1) = sort_assets(asset_a, asset_b)?;

        if !self.tokens.is_registered(token0) {
            return Err(AmmError::Asset(xyk_asset::AssetError::UnknownAsset(
                token0.to_string(),
            )));
        }
        if !self.tokens.is_registered(token1) {
            return Err(AmmError::Asset(xyk_asset::AssetError::UnknownAsset(
                token1.to_string(),
            )));
        }

        let key = format!("{}:{}", token0, token1);
        if self.registry.pairs.contains_key(&key) {
            return Err(AmmError::PairExists);
        }

        let pair_address = derive_pair_address(&self.registry.address, token0, token1);

        // The pair's share token lives in the asset ledger under the pair
        // address itself.
        self.tokens
            .register(&pair_address, TokenMetadata::new("XYK Pair Shares", "XYK-LP", 18))?;

        let index = self.registry.insert(token0, token1, &pair_address);
        self.pairs
            .insert(pair_address.clone(), PairLedger::new(&pair_address, token0, token1));

        self.events.push(AmmEvent::PairCreated {
            token0: token0.to_string(),
            token1: token1.to_string(),
            pair: pair_address.clone(),
            index,
        });

        Ok(pair_address)
    }
}
