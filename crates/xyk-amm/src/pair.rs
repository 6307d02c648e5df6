// SPDX-License-Identifier: AGPL-3.0-only
//! # Pair Ledger
//!
//! One constant-product pool per canonical asset pair. The pair custodies
//! its reserves as ordinary asset-ledger balances held under the pair
//! address, and tracks the last synced reserves separately so deposits and
//! swap inputs can be measured as balance deltas. Its share token is
//! registered in the asset ledger under the pair address itself.
//!
//! Mutating operations take the pair's reentrancy lock for their whole
//! duration. State is only committed by the engine on success, so a failed
//! operation leaves no trace.

use serde::{Deserialize, Serialize};
use xyk_asset::u128_str;
use xyk_asset::TokenLedger;

use crate::config::DexConfig;
use crate::error::AmmError;
use crate::event::AmmEvent;
use crate::math;
use crate::DexState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PairLedger {
    /// Pair address, also the asset id of the pair's share token
    pub address: String,
    /// Canonically first asset
    pub token0: String,
    /// Canonically second asset
    pub token1: String,
    /// Last synced reserve of token0
    #[serde(with = "u128_str")]
    pub reserve0: u128,
    /// Last synced reserve of token1
    #[serde(with = "u128_str")]
    pub reserve1: u128,
    /// Timestamp of the last reserve sync
    pub last_update: u64,
    /// sqrt(reserve0 * reserve1) as of the last share mint/burn while the
    /// protocol fee was on, 0 while it is off
    #[serde(with = "u128_str")]
    pub root_k_last: u128,
    /// Reentrancy guard, never serialized as held
    #[serde(default)]
    pub locked: bool,
}

impl PairLedger {
    pub fn new(address: &str, token0: &str, token1: &str) -> Self {
        PairLedger {
            address: address.to_string(),
            token0: token0.to_string(),
            token1: token1.to_string(),
            reserve0: 0,
            reserve1: 0,
            last_update: 0,
            root_k_last: 0,
            locked: false,
        }
    }

    /// Canonical reserves and the last sync timestamp.
    pub fn reserves(&self) -> (u128, u128, u64) {
        (self.reserve0, self.reserve1, self.last_update)
    }

    fn lock(&mut self) -> Result<(), AmmError> {
        if self.locked {
            return Err(AmmError::Locked);
        }
        self.locked = true;
        Ok(())
    }

    fn unlock(&mut self) {
        self.locked = false;
    }
}

impl DexState {
    /// Mint pool shares against assets already transferred to the pair.
    ///
    /// Deposit amounts are measured as the pair's balance growth over its
    /// synced reserves. Returns the shares minted to `to`.
    pub fn pair_mint(
        &mut self,
        pair_address: &str,
        to: &str,
        cfg: &DexConfig,
        now: u64,
    ) -> Result<u128, AmmError> {
        let DexState {
            tokens,
            registry,
            pairs,
            events,
        } = self;
        let pair = pairs.get_mut(pair_address).ok_or(AmmError::PairNotFound)?;
        let fee_to = registry.fee_to.clone();
        pair.lock()?;
        let result = mint_locked(tokens, events, pair, to, fee_to.as_deref(), cfg, now);
        pair.unlock();
        result
    }

    /// Redeem the shares held by the pair for both assets, sent to `to`.
    ///
    /// Callers transfer shares to the pair address first, mirroring the
    /// deposit flow. Returns the canonical (amount0, amount1) paid out.
    pub fn pair_burn(
        &mut self,
        pair_address: &str,
        to: &str,
        now: u64,
    ) -> Result<(u128, u128), AmmError> {
        let DexState {
            tokens,
            registry,
            pairs,
            events,
        } = self;
        let pair = pairs.get_mut(pair_address).ok_or(AmmError::PairNotFound)?;
        let fee_to = registry.fee_to.clone();
        pair.lock()?;
        let result = burn_locked(tokens, events, pair, to, fee_to.as_deref(), now);
        pair.unlock();
        result
    }

    /// Swap against the pool: pay out the requested amounts, then verify
    /// the fee-adjusted invariant against the measured inputs.
    pub fn pair_swap(
        &mut self,
        pair_address: &str,
        amount0_out: u128,
        amount1_out: u128,
        to: &str,
        now: u64,
    ) -> Result<(), AmmError> {
        let DexState {
            tokens,
            pairs,
            events,
            ..
        } = self;
        let pair = pairs.get_mut(pair_address).ok_or(AmmError::PairNotFound)?;
        pair.lock()?;
        let result = swap_locked(tokens, events, pair, amount0_out, amount1_out, to, now);
        pair.unlock();
        result
    }

    /// Send any balance in excess of the synced reserves to `to`.
    pub fn pair_skim(&mut self, pair_address: &str, to: &str) -> Result<(), AmmError> {
        let DexState { tokens, pairs, .. } = self;
        let pair = pairs.get_mut(pair_address).ok_or(AmmError::PairNotFound)?;
        pair.lock()?;
        let result = skim_locked(tokens, pair, to);
        pair.unlock();
        result
    }

    /// Force the synced reserves up to the pair's actual balances.
    pub fn pair_sync(&mut self, pair_address: &str, now: u64) -> Result<(), AmmError> {
        let DexState {
            tokens,
            pairs,
            events,
            ..
        } = self;
        let pair = pairs.get_mut(pair_address).ok_or(AmmError::PairNotFound)?;
        pair.lock()?;
        let balance0 = tokens.balance_of(&pair.token0, &pair.address);
        let balance1 = tokens.balance_of(&pair.token1, &pair.address);
        update(pair, events, balance0, balance1, now);
        pair.unlock();
        Ok(())
    }
}

fn mint_locked(
    tokens: &mut TokenLedger,
    events: &mut Vec<AmmEvent>,
    pair: &mut PairLedger,
    to: &str,
    fee_to: Option<&str>,
    cfg: &DexConfig,
    now: u64,
) -> Result<u128, AmmError> {
    let balance0 = tokens.balance_of(&pair.token0, &pair.address);
    let balance1 = tokens.balance_of(&pair.token1, &pair.address);
    let amount0 = balance0.saturating_sub(pair.reserve0);
    let amount1 = balance1.saturating_sub(pair.reserve1);

    let fee_on = mint_fee(tokens, pair, fee_to)?;
    let total_shares = tokens.total_supply(&pair.address);

    let shares = if total_shares == 0 {
        let root = math::sqrt_product(amount0, amount1);
        let shares = root
            .checked_sub(cfg.minimum_liquidity)
            .ok_or(AmmError::InsufficientInitialLiquidity)?;
        // the locked minimum makes the share supply irreducible
        tokens.mint(&pair.address, &cfg.share_lock_address, cfg.minimum_liquidity)?;
        shares
    } else {
        math::shares_for_deposit(amount0, amount1, pair.reserve0, pair.reserve1, total_shares)?
    };

    if shares == 0 {
        return Err(AmmError::InsufficientLiquidityMinted);
    }
    tokens.mint(&pair.address, to, shares)?;

    update(pair, events, balance0, balance1, now);
    if fee_on {
        pair.root_k_last = math::sqrt_product(pair.reserve0, pair.reserve1);
    }

    events.push(AmmEvent::Mint {
        pair: pair.address.clone(),
        to: to.to_string(),
        amount0,
        amount1,
        shares,
    });
    Ok(shares)
}

fn burn_locked(
    tokens: &mut TokenLedger,
    events: &mut Vec<AmmEvent>,
    pair: &mut PairLedger,
    to: &str,
    fee_to: Option<&str>,
    now: u64,
) -> Result<(u128, u128), AmmError> {
    let balance0 = tokens.balance_of(&pair.token0, &pair.address);
    let balance1 = tokens.balance_of(&pair.token1, &pair.address);
    let shares = tokens.balance_of(&pair.address, &pair.address);

    let fee_on = mint_fee(tokens, pair, fee_to)?;
    let total_shares = tokens.total_supply(&pair.address);
    if total_shares == 0 {
        return Err(AmmError::InsufficientLiquidityBurned);
    }

    // pro-rata over actual balances, not synced reserves
    let amount0 = math::mul_div(shares, balance0, total_shares)?;
    let amount1 = math::mul_div(shares, balance1, total_shares)?;
    if amount0 == 0 || amount1 == 0 {
        return Err(AmmError::InsufficientLiquidityBurned);
    }

    tokens.burn(&pair.address, &pair.address, shares)?;
    tokens.transfer(&pair.token0, &pair.address, to, amount0)?;
    tokens.transfer(&pair.token1, &pair.address, to, amount1)?;

    let balance0 = tokens.balance_of(&pair.token0, &pair.address);
    let balance1 = tokens.balance_of(&pair.token1, &pair.address);
    update(pair, events, balance0, balance1, now);
    if fee_on {
        pair.root_k_last = math::sqrt_product(pair.reserve0, pair.reserve1);
    }

    events.push(AmmEvent::Burn {
        pair: pair.address.clone(),
        to: to.to_string(),
        amount0,
        amount1,
        shares,
    });
    Ok((amount0, amount1))
}

fn swap_locked(
    tokens: &mut TokenLedger,
    events: &mut Vec<AmmEvent>,
    pair: &mut PairLedger,
    amount0_out: u128,
    amount1_out: u128,
    to: &str,
    now: u64,
) -> Result<(), AmmError> {
    if amount0_out == 0 && amount1_out == 0 {
        return Err(AmmError::InsufficientOutputAmount);
    }
    if amount0_out >= pair.reserve0 || amount1_out >= pair.reserve1 {
        return Err(AmmError::InsufficientLiquidity);
    }
    if to == pair.token0 || to == pair.token1 {
        return Err(AmmError::InvalidRecipient);
    }

    // pay outputs first, then measure what came in
    if amount0_out > 0 {
        tokens.transfer(&pair.token0, &pair.address, to, amount0_out)?;
    }
    if amount1_out > 0 {
        tokens.transfer(&pair.token1, &pair.address, to, amount1_out)?;
    }

    let balance0 = tokens.balance_of(&pair.token0, &pair.address);
    let balance1 = tokens.balance_of(&pair.token1, &pair.address);
    let amount0_in = balance0.saturating_sub(pair.reserve0 - amount0_out);
    let amount1_in = balance1.saturating_sub(pair.reserve1 - amount1_out);
    if amount0_in == 0 && amount1_in == 0 {
        return Err(AmmError::InsufficientInputAmount);
    }

    if !math::k_after_fee_holds(
        balance0,
        balance1,
        amount0_in,
        amount1_in,
        pair.reserve0,
        pair.reserve1,
    ) {
        return Err(AmmError::InvariantViolation);
    }

    update(pair, events, balance0, balance1, now);
    events.push(AmmEvent::Swap {
        pair: pair.address.clone(),
        to: to.to_string(),
        amount0_in,
        amount1_in,
        amount0_out,
        amount1_out,
    });
    Ok(())
}

fn skim_locked(
    tokens: &mut TokenLedger,
    pair: &mut PairLedger,
    to: &str,
) -> Result<(), AmmError> {
    let excess0 = tokens
        .balance_of(&pair.token0, &pair.address)
        .saturating_sub(pair.reserve0);
    let excess1 = tokens
        .balance_of(&pair.token1, &pair.address)
        .saturating_sub(pair.reserve1);
    if excess0 > 0 {
        tokens.transfer(&pair.token0, &pair.address, to, excess0)?;
    }
    if excess1 > 0 {
        tokens.transfer(&pair.token1, &pair.address, to, excess1)?;
    }
    Ok(())
}

/// Collect the protocol's share of pool growth since the last mint/burn.
///
/// When the fee switch is on and sqrt(K) has grown, mints the collector
/// shares worth one sixth of the growth. When off, clears the growth
/// baseline so past growth is never charged retroactively.
fn mint_fee(
    tokens: &mut TokenLedger,
    pair: &mut PairLedger,
    fee_to: Option<&str>,
) -> Result<bool, AmmError> {
    match fee_to {
        Some(fee_to) => {
            if pair.root_k_last != 0 {
                let root_k = math::sqrt_product(pair.reserve0, pair.reserve1);
                if root_k > pair.root_k_last {
                    let total_shares = tokens.total_supply(&pair.address);
                    let shares =
                        math::protocol_fee_shares(total_shares, root_k, pair.root_k_last)?;
                    if shares > 0 {
                        tokens.mint(&pair.address, fee_to, shares)?;
                    }
                }
            }
            Ok(true)
        }
        None => {
            if pair.root_k_last != 0 {
                pair.root_k_last = 0;
            }
            Ok(false)
        }
    }
}

fn update(
    pair: &mut PairLedger,
    events: &mut Vec<AmmEvent>,
    balance0: u128,
    balance1: u128,
    now: u64,
) {
    pair.reserve0 = balance0;
    pair.reserve1 = balance1;
    pair.last_update = now;
    events.push(AmmEvent::Sync {
        pair: pair.address.clone(),
        reserve0: balance0,
        reserve1: balance1,
    });
}
