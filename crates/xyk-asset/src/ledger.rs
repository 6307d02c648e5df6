// SPDX-License-Identifier: AGPL-3.0-only
//! # Token Ledger
//!
//! Balances, allowances and supply for every registered asset.
//!
//! ## State Layout
//! - `assets: {asset_id → AssetState}`
//! - `AssetState.balances: {holder → u128}`
//! - `AssetState.allowances: {"{owner}:{spender}" → u128}`
//!
//! The allowance key mirrors the `allow:{owner}:{spender}` convention of the
//! contract state the ledger replaces. Zero balances and zero allowances are
//! removed from the maps so serialized state stays canonical.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::u128_str;
use crate::AssetError;
use crate::TokenMetadata;

/// Events emitted by ledger mutations, collected in order of occurrence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AssetEvent {
    /// Emitted on transfer, transfer_from, mint (`from` empty) and
    /// burn (`to` empty)
    Transfer {
        asset: String,
        from: String,
        to: String,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    /// Emitted on approve
    Approval {
        asset: String,
        owner: String,
        spender: String,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    /// Emitted when native value is wrapped
    Deposit {
        asset: String,
        to: String,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    /// Emitted when native value is unwrapped
    Withdrawal {
        asset: String,
        from: String,
        #[serde(with = "u128_str")]
        amount: u128,
    },
}

/// Per-asset state: metadata, live supply, balances and allowances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetState {
    pub metadata: TokenMetadata,
    #[serde(with = "u128_str")]
    pub total_supply: u128,
    /// BTreeMap guarantees deterministic iteration and serialization
    pub balances: BTreeMap<String, u128>,
    pub allowances: BTreeMap<String, u128>,
}

/// Build allowance map key.
fn allow_key(owner: &str, spender: &str) -> String {
    format!("{}:{}", owner, spender)
}

/// The multi-asset fungible token ledger.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TokenLedger {
    pub assets: BTreeMap<String, AssetState>,
    /// Events in emission order. Drained by the host after a committed
    /// operation; discarded with the rest of the state on rollback.
    #[serde(default)]
    pub events: Vec<AssetEvent>,
}

impl TokenLedger {
    pub fn new() -> Self {
        TokenLedger {
            assets: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Register a new asset with zero supply.
    pub fn register(&mut self, asset_id: &str, metadata: TokenMetadata) -> Result<(), AssetError> {
        metadata.validate()?;
        if self.assets.contains_key(asset_id) {
            return Err(AssetError::AssetExists(asset_id.to_string()));
        }
        self.assets.insert(
            asset_id.to_string(),
            AssetState {
                metadata,
                total_supply: 0,
                balances: BTreeMap::new(),
                allowances: BTreeMap::new(),
            },
        );
        Ok(())
    }

    pub fn is_registered(&self, asset_id: &str) -> bool {
        self.assets.contains_key(asset_id)
    }

    pub fn metadata(&self, asset_id: &str) -> Result<&TokenMetadata, AssetError> {
        self.asset(asset_id).map(|a| &a.metadata)
    }

    /// Balance of `holder` in atomic units. Unknown assets and absent
    /// holders both read as zero — this is a pure query.
    pub fn balance_of(&self, asset_id: &str, holder: &str) -> u128 {
        self.assets
            .get(asset_id)
            .and_then(|a| a.balances.get(holder))
            .copied()
            .unwrap_or(0)
    }

    /// Total outstanding supply. Unknown assets read as zero.
    pub fn total_supply(&self, asset_id: &str) -> u128 {
        self.assets.get(asset_id).map(|a| a.total_supply).unwrap_or(0)
    }

    pub fn allowance(&self, asset_id: &str, owner: &str, spender: &str) -> u128 {
        self.assets
            .get(asset_id)
            .and_then(|a| a.allowances.get(&allow_key(owner, spender)))
            .copied()
            .unwrap_or(0)
    }

    /// Create `amount` new units credited to `to`.
    /// Fails with `SupplyOverflow` past `max_supply` or on counter overflow.
    pub fn mint(&mut self, asset_id: &str, to: &str, amount: u128) -> Result<(), AssetError> {
        let asset = self.asset_mut(asset_id)?;
        let new_supply = asset
            .total_supply
            .checked_add(amount)
            .ok_or(AssetError::SupplyOverflow)?;
        if asset.metadata.max_supply > 0 && new_supply > asset.metadata.max_supply {
            return Err(AssetError::SupplyOverflow);
        }
        let bal = asset.balances.entry(to.to_string()).or_insert(0);
        *bal = bal.checked_add(amount).ok_or(AssetError::BalanceOverflow)?;
        asset.total_supply = new_supply;
        self.events.push(AssetEvent::Transfer {
            asset: asset_id.to_string(),
            from: String::new(),
            to: to.to_string(),
            amount,
        });
        Ok(())
    }

    /// Permanently destroy `amount` units held by `from`.
    pub fn burn(&mut self, asset_id: &str, from: &str, amount: u128) -> Result<(), AssetError> {
        let asset = self.asset_mut(asset_id)?;
        Self::debit(asset, from, amount)?;
        // debit cannot underflow the supply: burned units were outstanding
        asset.total_supply -= amount;
        self.events.push(AssetEvent::Transfer {
            asset: asset_id.to_string(),
            from: from.to_string(),
            to: String::new(),
            amount,
        });
        Ok(())
    }

    /// Move `amount` units from `from` to `to`.
    pub fn transfer(
        &mut self,
        asset_id: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<(), AssetError> {
        let asset = self.asset_mut(asset_id)?;
        Self::debit(asset, from, amount)?;
        Self::credit(asset, to, amount)?;
        self.events.push(AssetEvent::Transfer {
            asset: asset_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
        });
        Ok(())
    }

    /// Set the allowance granted by `owner` to `spender` (overwrite, not add).
    pub fn approve(
        &mut self,
        asset_id: &str,
        owner: &str,
        spender: &str,
        amount: u128,
    ) -> Result<(), AssetError> {
        let asset = self.asset_mut(asset_id)?;
        let key = allow_key(owner, spender);
        if amount == 0 {
            asset.allowances.remove(&key);
        } else {
            asset.allowances.insert(key, amount);
        }
        self.events.push(AssetEvent::Approval {
            asset: asset_id.to_string(),
            owner: owner.to_string(),
            spender: spender.to_string(),
            amount,
        });
        Ok(())
    }

    /// Move `amount` units from `from` to `to` on behalf of `spender`.
    /// The allowance is checked first and always decremented.
    pub fn transfer_from(
        &mut self,
        asset_id: &str,
        spender: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<(), AssetError> {
        let asset = self.asset_mut(asset_id)?;
        let key = allow_key(from, spender);
        let allowed = asset.allowances.get(&key).copied().unwrap_or(0);
        let remaining = allowed
            .checked_sub(amount)
            .ok_or(AssetError::InsufficientAllowance)?;
        Self::debit(asset, from, amount)?;
        Self::credit(asset, to, amount)?;
        if remaining == 0 {
            asset.allowances.remove(&key);
        } else {
            asset.allowances.insert(key, remaining);
        }
        self.events.push(AssetEvent::Transfer {
            asset: asset_id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
        });
        Ok(())
    }

    /// Drain and return the accumulated event log.
    pub fn drain_events(&mut self) -> Vec<AssetEvent> {
        std::mem::take(&mut self.events)
    }

    fn asset(&self, asset_id: &str) -> Result<&AssetState, AssetError> {
        self.assets
            .get(asset_id)
            .ok_or_else(|| AssetError::UnknownAsset(asset_id.to_string()))
    }

    fn asset_mut(&mut self, asset_id: &str) -> Result<&mut AssetState, AssetError> {
        self.assets
            .get_mut(asset_id)
            .ok_or_else(|| AssetError::UnknownAsset(asset_id.to_string()))
    }

    fn debit(asset: &mut AssetState, holder: &str, amount: u128) -> Result<(), AssetError> {
        let bal = asset.balances.get(holder).copied().unwrap_or(0);
        let new_bal = bal
            .checked_sub(amount)
            .ok_or(AssetError::InsufficientBalance)?;
        if new_bal == 0 {
            asset.balances.remove(holder);
        } else {
            asset.balances.insert(holder.to_string(), new_bal);
        }
        Ok(())
    }

    fn credit(asset: &mut AssetState, holder: &str, amount: u128) -> Result<(), AssetError> {
        if amount == 0 {
            return Ok(());
        }
        let bal = asset.balances.entry(holder.to_string()).or_insert(0);
        *bal = bal.checked_add(amount).ok_or(AssetError::BalanceOverflow)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// TESTS
// ─────────────────────────────────────────────────────────────
