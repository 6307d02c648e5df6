// SPDX-License-Identifier: AGPL-3.0-only
//! # XYK AMM Core
//!
//! Constant-product automated market maker over the [`xyk_asset`] ledger:
//! pair ledgers holding reserves and minting pool shares, a registry with
//! deterministic pair addressing, and a router for ratio-matched deposits
//! and multi-hop swaps.
//!
//! All amounts are u128 atomic units with integer-only math (NO f32/f64,
//! results must be identical on every host). State mutations run on a
//! snapshot and commit only on success, so any error leaves the engine
//! untouched.

pub mod config;
pub mod error;
pub mod event;
pub mod math;
pub mod pair;
pub mod registry;
pub mod router;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use xyk_asset::{TokenLedger, TokenMetadata, WrappedNative};

pub use config::{DexConfig, WrappedNativeConfig};
pub use error::AmmError;
pub use event::AmmEvent;
pub use pair::PairLedger;
pub use registry::{derive_pair_address, sort_assets, PairRegistry};

/// Swap fee numerator: input counts at 99.7% toward the invariant.
pub const FEE_NUMERATOR: u128 = 997;
/// Swap fee denominator.
pub const FEE_DENOMINATOR: u128 = 1000;
/// Default shares locked forever on a pair's first deposit.
pub const DEFAULT_MINIMUM_LIQUIDITY: u128 = 1_000;

/// Full serializable engine state: asset ledger, registry, pair ledgers
/// and the engine event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexState {
    pub tokens: TokenLedger,
    pub registry: PairRegistry,
    /// Pair address → pair ledger
    pub pairs: BTreeMap<String, PairLedger>,
    #[serde(default)]
    pub events: Vec<AmmEvent>,
}

impl DexState {
    pub fn new(registry_address: &str) -> Self {
        DexState {
            tokens: TokenLedger::new(),
            registry: PairRegistry::new(registry_address),
            pairs: BTreeMap::new(),
            events: Vec::new(),
        }
    }
}

/// The engine: validated config plus state, with snapshot-commit mutation.
///
/// Time is injected by the host through [`Dex::set_now`] so deadline checks
/// and reserve timestamps stay deterministic under replay.
#[derive(Debug)]
pub struct Dex {
    state: DexState,
    config: DexConfig,
    wrapped: WrappedNative,
    now: u64,
}

impl Dex {
    pub fn new(config: DexConfig) -> Result<Self, AmmError> {
        config.validate().map_err(AmmError::InvalidConfig)?;
        let mut state = DexState::new(&config.registry_address);
        state.registry.fee_to = config.fee_to.clone();
        let wn = &config.wrapped_native;
        let wrapped = WrappedNative::register(
            &mut state.tokens,
            &wn.asset_id,
            TokenMetadata::new(&wn.name, &wn.symbol, wn.decimals),
        )?;
        Ok(Dex {
            state,
            config,
            wrapped,
            now: 0,
        })
    }

    /// Rebuild an engine around previously serialized state.
    pub fn from_state(config: DexConfig, state: DexState) -> Result<Self, AmmError> {
        config.validate().map_err(AmmError::InvalidConfig)?;
        let wn = &config.wrapped_native;
        if !state.tokens.is_registered(&wn.asset_id) {
            return Err(AmmError::InvalidConfig(format!(
                "wrapped-native asset {} missing from state",
                wn.asset_id
            )));
        }
        let wrapped = WrappedNative {
            asset_id: wn.asset_id.clone(),
        };
        Ok(Dex {
            state,
            config,
            wrapped,
            now: 0,
        })
    }

    pub fn config(&self) -> &DexConfig {
        &self.config
    }

    pub fn state(&self) -> &DexState {
        &self.state
    }

    pub fn tokens(&self) -> &TokenLedger {
        &self.state.tokens
    }

    /// Direct ledger access for the host (genesis funding, asset listing).
    pub fn tokens_mut(&mut self) -> &mut TokenLedger {
        &mut self.state.tokens
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    /// Advance the injected clock. Engine time never moves on its own.
    pub fn set_now(&mut self, now: u64) {
        self.now = now;
    }

    /// Point the protocol fee switch at a collector, or turn it off.
    pub fn set_fee_to(&mut self, fee_to: Option<String>) {
        self.state.registry.fee_to = fee_to;
    }

    pub fn fee_to(&self) -> Option<&String> {
        self.state.registry.fee_to.as_ref()
    }

    // ─────────────────────────────────────────────────────────────
    // REGISTRY
    // ─────────────────────────────────────────────────────────────

    pub fn create_pair(&mut self, asset_a: &str, asset_b: &str) -> Result<String, AmmError> {
        let (asset_a, asset_b) = (asset_a.to_string(), asset_b.to_string());
        self.transact(move |state, _cfg, _now| state.create_pair(&asset_a, &asset_b))
    }

    /// Address the pair for (asset_a, asset_b) has, or will have once
    /// created. Pure computation.
    pub fn pair_address(&self, asset_a: &str, asset_b: &str) -> Result<String, AmmError> {
        self.state.registry.pair_address_for(asset_a, asset_b)
    }

    pub fn get_pair(&self, asset_a: &str, asset_b: &str) -> Result<Option<String>, AmmError> {
        Ok(self.state.registry.get_pair(asset_a, asset_b)?.cloned())
    }

    pub fn all_pairs_length(&self) -> u64 {
        self.state.registry.all_pairs_length()
    }

    pub fn pair_at(&self, index: u64) -> Option<String> {
        self.state.registry.pair_at(index).cloned()
    }

    // ─────────────────────────────────────────────────────────────
    // PAIR OPERATIONS (low level, pre-funded by the caller)
    // ─────────────────────────────────────────────────────────────

    pub fn pair_mint(&mut self, pair_address: &str, to: &str) -> Result<u128, AmmError> {
        let (pair_address, to) = (pair_address.to_string(), to.to_string());
        self.transact(move |state, cfg, now| state.pair_mint(&pair_address, &to, cfg, now))
    }

    pub fn pair_burn(&mut self, pair_address: &str, to: &str) -> Result<(u128, u128), AmmError> {
        let (pair_address, to) = (pair_address.to_string(), to.to_string());
        self.transact(move |state, _cfg, now| state.pair_burn(&pair_address, &to, now))
    }

    pub fn pair_swap(
        &mut self,
        pair_address: &str,
        amount0_out: u128,
        amount1_out: u128,
        to: &str,
    ) -> Result<(), AmmError> {
        let (pair_address, to) = (pair_address.to_string(), to.to_string());
        self.transact(move |state, _cfg, now| {
            state.pair_swap(&pair_address, amount0_out, amount1_out, &to, now)
        })
    }

    pub fn pair_skim(&mut self, pair_address: &str, to: &str) -> Result<(), AmmError> {
        let (pair_address, to) = (pair_address.to_string(), to.to_string());
        self.transact(move |state, _cfg, _now| state.pair_skim(&pair_address, &to))
    }

    pub fn pair_sync(&mut self, pair_address: &str) -> Result<(), AmmError> {
        let pair_address = pair_address.to_string();
        self.transact(move |state, _cfg, now| state.pair_sync(&pair_address, now))
    }

    // ─────────────────────────────────────────────────────────────
    // WRAPPED NATIVE
    // ─────────────────────────────────────────────────────────────

    /// Wrap native value received by the host, crediting `to`.
    pub fn wrap_native(&mut self, to: &str, amount: u128) -> Result<(), AmmError> {
        let (wrapped, to) = (self.wrapped.clone(), to.to_string());
        self.transact(move |state, _cfg, _now| {
            wrapped.deposit(&mut state.tokens, &to, amount)?;
            Ok(())
        })
    }

    /// Unwrap: burn `from`'s wrapped units so the host can release native
    /// value.
    pub fn unwrap_native(&mut self, from: &str, amount: u128) -> Result<(), AmmError> {
        let (wrapped, from) = (self.wrapped.clone(), from.to_string());
        self.transact(move |state, _cfg, _now| {
            wrapped.withdraw(&mut state.tokens, &from, amount)?;
            Ok(())
        })
    }

    pub fn wrapped_asset_id(&self) -> &str {
        &self.wrapped.asset_id
    }

    // ─────────────────────────────────────────────────────────────
    // OBSERVABILITY
    // ─────────────────────────────────────────────────────────────

    pub fn events(&self) -> &[AmmEvent] {
        &self.state.events
    }

    /// Drain the engine and asset event logs in emission order.
    pub fn drain_events(&mut self) -> (Vec<AmmEvent>, Vec<xyk_asset::AssetEvent>) {
        (
            std::mem::take(&mut self.state.events),
            self.state.tokens.drain_events(),
        )
    }

    /// Deterministic digest over supplies and reserves, for replay
    /// comparison between hosts.
    pub fn state_root(&self) -> String {
        let mut hasher = Sha3_256::new();
        for (asset_id, asset) in &self.state.tokens.assets {
            hasher.update(asset_id.as_bytes());
            hasher.update(asset.total_supply.to_be_bytes());
        }
        for (pair_address, pair) in &self.state.pairs {
            hasher.update(pair_address.as_bytes());
            hasher.update(pair.reserve0.to_be_bytes());
            hasher.update(pair.reserve1.to_be_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Solvency sweep over every pair. Reserves must be backed by actual
    /// balances, and a pair with no shares outstanding must be empty.
    pub fn audit(&self) -> Result<(), String> {
        for (pair_address, pair) in &self.state.pairs {
            let balance0 = self.state.tokens.balance_of(&pair.token0, pair_address);
            let balance1 = self.state.tokens.balance_of(&pair.token1, pair_address);
            if pair.reserve0 > balance0 || pair.reserve1 > balance1 {
                return Err(format!(
                    "pair {} reserves exceed balances: ({}, {}) > ({}, {})",
                    pair_address, pair.reserve0, pair.reserve1, balance0, balance1
                ));
            }
            if self.state.tokens.total_supply(pair_address) == 0
                && (pair.reserve0 != 0 || pair.reserve1 != 0)
            {
                return Err(format!(
                    "pair {} holds reserves with no shares outstanding",
                    pair_address
                ));
            }
        }
        Ok(())
    }

    /// Run `op` on a snapshot of the state, committing only on success.
    pub(crate) fn transact<T>(
        &mut self,
        op: impl FnOnce(&mut DexState, &DexConfig, u64) -> Result<T, AmmError>,
    ) -> Result<T, AmmError> {
        let mut working = self.state.clone();
        let value = op(&mut working, &self.config, self.now)?;
        self.state = working;
        Ok(value)
    }
}
