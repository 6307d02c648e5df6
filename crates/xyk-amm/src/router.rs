// SPDX-License-Identifier: AGPL-3.0-only
//! # Router
//!
//! Stateless orchestration over the pair ledgers: ratio-matched liquidity
//! provision, multi-hop swaps along an asset path, and slippage/deadline
//! guards. The router owns no funds between operations; it moves caller
//! assets via allowances granted to the configured router address, and
//! every operation commits atomically or not at all.

use crate::config::DexConfig;
use crate::error::AmmError;
use crate::math;
use crate::registry::sort_assets;
use crate::{Dex, DexState};

fn ensure_deadline(now: u64, deadline: u64) -> Result<(), AmmError> {
    if now > deadline {
        return Err(AmmError::Expired);
    }
    Ok(())
}

/// Pair address plus reserves oriented to the (asset_in, asset_out) order.
fn reserves_for(
    state: &DexState,
    asset_in: &str,
    asset_out: &str,
) -> Result<(String, u128, u128), AmmError> {
    let pair_address = state
        .registry
        .get_pair(asset_in, asset_out)?
        .ok_or(AmmError::PairNotFound)?
        .clone();
    let pair = state
        .pairs
        .get(&pair_address)
        .ok_or(AmmError::PairNotFound)?;
    let (reserve0, reserve1, _) = pair.reserves();
    if asset_in == pair.token0 {
        Ok((pair_address, reserve0, reserve1))
    } else {
        Ok((pair_address, reserve1, reserve0))
    }
}

/// Chained amounts for an exact input along `path`.
fn amounts_out(state: &DexState, amount_in: u128, path: &[&str]) -> Result<Vec<u128>, AmmError> {
    if path.len() < 2 {
        return Err(AmmError::InvalidPath);
    }
    let mut amounts = Vec::with_capacity(path.len());
    amounts.push(amount_in);
    for hop in path.windows(2) {
        let (_, reserve_in, reserve_out) = reserves_for(state, hop[0], hop[1])?;
        let last = amounts[amounts.len() - 1];
        amounts.push(math::get_amount_out(last, reserve_in, reserve_out)?);
    }
    Ok(amounts)
}

/// Chained amounts for an exact output along `path`, computed backwards.
fn amounts_in(state: &DexState, amount_out: u128, path: &[&str]) -> Result<Vec<u128>, AmmError> {
    if path.len() < 2 {
        return Err(AmmError::InvalidPath);
    }
    let mut amounts = vec![0u128; path.len()];
    amounts[path.len() - 1] = amount_out;
    for i in (1..path.len()).rev() {
        let (_, reserve_in, reserve_out) = reserves_for(state, path[i - 1], path[i])?;
        amounts[i - 1] = math::get_amount_in(amounts[i], reserve_in, reserve_out)?;
    }
    Ok(amounts)
}

/// Execute the hops of a pre-funded swap. The input for hop `i` already
/// sits in pair `i`; each intermediate output lands directly in the next
/// pair, the final output in `to`.
fn swap_chain(
    state: &mut DexState,
    amounts: &[u128],
    path: &[&str],
    to: &str,
    now: u64,
) -> Result<(), AmmError> {
    for i in 0..path.len() - 1 {
        let (input, output) = (path[i], path[i + 1]);
        let (token0, _) = sort_assets(input, output)?;
        let amount_out = amounts[i + 1];
        let (amount0_out, amount1_out) = if input == token0 {
            (0, amount_out)
        } else {
            (amount_out, 0)
        };
        let recipient = if i < path.len() - 2 {
            let (next_pair, _, _) = reserves_for(state, output, path[i + 2])?;
            next_pair
        } else {
            to.to_string()
        };
        let (pair_address, _, _) = reserves_for(state, input, output)?;
        state.pair_swap(&pair_address, amount0_out, amount1_out, &recipient, now)?;
    }
    Ok(())
}

/// Deposit amounts that keep the pool ratio, within the caller's bounds.
/// Creates the pair on first use.
#[allow(clippy::too_many_arguments)]
fn optimal_deposit(
    state: &mut DexState,
    asset_a: &str,
    asset_b: &str,
    amount_a_desired: u128,
    amount_b_desired: u128,
    amount_a_min: u128,
    amount_b_min: u128,
) -> Result<(u128, u128), AmmError> {
    if state.registry.get_pair(asset_a, asset_b)?.is_none() {
        state.create_pair(asset_a, asset_b)?;
    }
    let (_, reserve_a, reserve_b) = reserves_for(state, asset_a, asset_b)?;
    if reserve_a == 0 && reserve_b == 0 {
        return Ok((amount_a_desired, amount_b_desired));
    }
    let amount_b_optimal = math::quote(amount_a_desired, reserve_a, reserve_b)?;
    if amount_b_optimal <= amount_b_desired {
        if amount_b_optimal < amount_b_min {
            return Err(AmmError::InsufficientBAmount);
        }
        Ok((amount_a_desired, amount_b_optimal))
    } else {
        let amount_a_optimal = math::quote(amount_b_desired, reserve_b, reserve_a)?;
        if amount_a_optimal < amount_a_min {
            return Err(AmmError::InsufficientAAmount);
        }
        Ok((amount_a_optimal, amount_b_desired))
    }
}

impl Dex {
    /// Add liquidity to the (asset_a, asset_b) pool, creating it on first
    /// use. Returns the amounts actually deposited and the shares minted
    /// to `to`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &mut self,
        caller: &str,
        asset_a: &str,
        asset_b: &str,
        amount_a_desired: u128,
        amount_b_desired: u128,
        amount_a_min: u128,
        amount_b_min: u128,
        to: &str,
        deadline: u64,
    ) -> Result<(u128, u128, u128), AmmError> {
        let (caller, asset_a, asset_b, to) = (
            caller.to_string(),
            asset_a.to_string(),
            asset_b.to_string(),
            to.to_string(),
        );
        self.transact(move |state, cfg: &DexConfig, now| {
            ensure_deadline(now, deadline)?;
            let (amount_a, amount_b) = optimal_deposit(
                state,
                &asset_a,
                &asset_b,
                amount_a_desired,
                amount_b_desired,
                amount_a_min,
                amount_b_min,
            )?;
            let (pair_address, _, _) = reserves_for(state, &asset_a, &asset_b)?;
            state.tokens.transfer_from(
                &asset_a,
                &cfg.router_address,
                &caller,
                &pair_address,
                amount_a,
            )?;
            state.tokens.transfer_from(
                &asset_b,
                &cfg.router_address,
                &caller,
                &pair_address,
                amount_b,
            )?;
            let shares = state.pair_mint(&pair_address, &to, cfg, now)?;
            Ok((amount_a, amount_b, shares))
        })
    }

    /// Redeem `shares` of the (asset_a, asset_b) pool for both assets.
    /// Returns the amounts paid out in (asset_a, asset_b) order.
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity(
        &mut self,
        caller: &str,
        asset_a: &str,
        asset_b: &str,
        shares: u128,
        amount_a_min: u128,
        amount_b_min: u128,
        to: &str,
        deadline: u64,
    ) -> Result<(u128, u128), AmmError> {
        let (caller, asset_a, asset_b, to) = (
            caller.to_string(),
            asset_a.to_string(),
            asset_b.to_string(),
            to.to_string(),
        );
        self.transact(move |state, cfg: &DexConfig, now| {
            ensure_deadline(now, deadline)?;
            let (pair_address, _, _) = reserves_for(state, &asset_a, &asset_b)?;
            // shares ride to the pair first, exactly like deposits
            state.tokens.transfer_from(
                &pair_address,
                &cfg.router_address,
                &caller,
                &pair_address,
                shares,
            )?;
            let (amount0, amount1) = state.pair_burn(&pair_address, &to, now)?;
            let (token0, _) = sort_assets(&asset_a, &asset_b)?;
            let (amount_a, amount_b) = if asset_a == token0 {
                (amount0, amount1)
            } else {
                (amount1, amount0)
            };
            if amount_a < amount_a_min {
                return Err(AmmError::InsufficientAAmount);
            }
            if amount_b < amount_b_min {
                return Err(AmmError::InsufficientBAmount);
            }
            Ok((amount_a, amount_b))
        })
    }

    /// Swap an exact input along `path`, requiring at least
    /// `amount_out_min` of the final asset. Returns the amount at every
    /// step of the path.
    pub fn swap_exact_tokens_for_tokens(
        &mut self,
        caller: &str,
        amount_in: u128,
        amount_out_min: u128,
        path: &[&str],
        to: &str,
        deadline: u64,
    ) -> Result<Vec<u128>, AmmError> {
        let caller = caller.to_string();
        let to = to.to_string();
        let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        self.transact(move |state, cfg: &DexConfig, now| {
            ensure_deadline(now, deadline)?;
            let path: Vec<&str> = path.iter().map(String::as_str).collect();
            let amounts = amounts_out(state, amount_in, &path)?;
            if amounts[amounts.len() - 1] < amount_out_min {
                return Err(AmmError::InsufficientOutputAmount);
            }
            let (first_pair, _, _) = reserves_for(state, path[0], path[1])?;
            state.tokens.transfer_from(
                path[0],
                &cfg.router_address,
                &caller,
                &first_pair,
                amounts[0],
            )?;
            swap_chain(state, &amounts, &path, &to, now)?;
            Ok(amounts)
        })
    }

    /// Swap for an exact output along `path`, spending at most
    /// `amount_in_max` of the first asset.
    pub fn swap_tokens_for_exact_tokens(
        &mut self,
        caller: &str,
        amount_out: u128,
        amount_in_max: u128,
        path: &[&str],
        to: &str,
        deadline: u64,
    ) -> Result<Vec<u128>, AmmError> {
        let caller = caller.to_string();
        let to = to.to_string();
        let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        self.transact(move |state, cfg: &DexConfig, now| {
            ensure_deadline(now, deadline)?;
            let path: Vec<&str> = path.iter().map(String::as_str).collect();
            let amounts = amounts_in(state, amount_out, &path)?;
            if amounts[0] > amount_in_max {
                return Err(AmmError::ExcessiveInputAmount);
            }
            let (first_pair, _, _) = reserves_for(state, path[0], path[1])?;
            state.tokens.transfer_from(
                path[0],
                &cfg.router_address,
                &caller,
                &first_pair,
                amounts[0],
            )?;
            swap_chain(state, &amounts, &path, &to, now)?;
            Ok(amounts)
        })
    }

    /// Chained quote for an exact input along `path`. Read-only.
    pub fn get_amounts_out(&self, amount_in: u128, path: &[&str]) -> Result<Vec<u128>, AmmError> {
        amounts_out(self.state(), amount_in, path)
    }

    /// Chained quote for an exact output along `path`. Read-only.
    pub fn get_amounts_in(&self, amount_out: u128, path: &[&str]) -> Result<Vec<u128>, AmmError> {
        amounts_in(self.state(), amount_out, path)
    }

    /// Reserves of the (asset_a, asset_b) pool, in that order.
    pub fn get_reserves(&self, asset_a: &str, asset_b: &str) -> Result<(u128, u128), AmmError> {
        let (_, reserve_a, reserve_b) = reserves_for(self.state(), asset_a, asset_b)?;
        Ok((reserve_a, reserve_b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DexConfig;
    use xyk_asset::TokenMetadata;

    const ONE: u128 = 1_000_000_000_000_000_000;
    const ROUTER: &str = "xyk:router";
    const FAR_FUTURE: u64 = u64::MAX;

    fn setup() -> Dex {
        let mut dex = Dex::new(DexConfig::default()).unwrap();
        for (id, name) in [("TKA", "Token A"), ("TKB", "Token B"), ("TKC", "Token C")] {
            dex.tokens_mut()
                .register(id, TokenMetadata::new(name, id, 18))
                .unwrap();
            dex.tokens_mut().mint(id, "alice", 10_000 * ONE).unwrap();
            dex.tokens_mut()
                .approve(id, "alice", ROUTER, u128::MAX)
                .unwrap();
        }
        dex
    }

    fn seeded() -> Dex {
        let mut dex = setup();
        dex.add_liquidity(
            "alice", "TKA", "TKB", 100 * ONE, 200 * ONE, 0, 0, "alice", FAR_FUTURE,
        )
        .unwrap();
        dex
    }

    #[test]
    fn test_add_liquidity_first_deposit() {
        let mut dex = setup();
        let (amount_a, amount_b, shares) = dex
            .add_liquidity(
                "alice", "TKA", "TKB", 100 * ONE, 200 * ONE, 0, 0, "alice", FAR_FUTURE,
            )
            .unwrap();
        assert_eq!((amount_a, amount_b), (100 * ONE, 200 * ONE));
        assert_eq!(shares, math::sqrt_product(100 * ONE, 200 * ONE) - 1_000);
        assert_eq!(dex.get_reserves("TKA", "TKB").unwrap(), (100 * ONE, 200 * ONE));
        assert_eq!(dex.get_reserves("TKB", "TKA").unwrap(), (200 * ONE, 100 * ONE));
    }

    #[test]
    fn test_add_liquidity_matches_ratio() {
        let mut dex = seeded();
        // desired B far above the ratio: only the matched amount is taken
        let (amount_a, amount_b, _) = dex
            .add_liquidity(
                "alice", "TKA", "TKB", 10 * ONE, 50 * ONE, 0, 0, "alice", FAR_FUTURE,
            )
            .unwrap();
        assert_eq!((amount_a, amount_b), (10 * ONE, 20 * ONE));
        // desired A above the ratio: A is trimmed instead
        let (amount_a, amount_b, _) = dex
            .add_liquidity(
                "alice", "TKA", "TKB", 10 * ONE, 10 * ONE, 0, 0, "alice", FAR_FUTURE,
            )
            .unwrap();
        assert_eq!((amount_a, amount_b), (5 * ONE, 10 * ONE));
    }

    #[test]
    fn test_add_liquidity_min_bounds() {
        let mut dex = seeded();
        assert_eq!(
            dex.add_liquidity(
                "alice", "TKA", "TKB", 10 * ONE, 50 * ONE, 0, 21 * ONE, "alice", FAR_FUTURE,
            )
            .unwrap_err(),
            AmmError::InsufficientBAmount
        );
        assert_eq!(
            dex.add_liquidity(
                "alice", "TKA", "TKB", 10 * ONE, 10 * ONE, 6 * ONE, 0, "alice", FAR_FUTURE,
            )
            .unwrap_err(),
            AmmError::InsufficientAAmount
        );
    }

    #[test]
    fn test_add_liquidity_expired_deadline() {
        let mut dex = setup();
        dex.set_now(1_000);
        assert_eq!(
            dex.add_liquidity("alice", "TKA", "TKB", ONE, ONE, 0, 0, "alice", 999)
                .unwrap_err(),
            AmmError::Expired
        );
    }

    #[test]
    fn test_add_liquidity_rolls_back_on_failure() {
        let mut dex = setup();
        let before = dex.tokens().balance_of("TKA", "alice");
        // second call fails the B minimum after the pair exists
        dex.add_liquidity(
            "alice", "TKA", "TKB", 100 * ONE, 200 * ONE, 0, 0, "alice", FAR_FUTURE,
        )
        .unwrap();
        let mid = dex.tokens().balance_of("TKA", "alice");
        assert!(dex
            .add_liquidity(
                "alice", "TKA", "TKB", 10 * ONE, 50 * ONE, 0, 21 * ONE, "alice", FAR_FUTURE,
            )
            .is_err());
        assert_eq!(dex.tokens().balance_of("TKA", "alice"), mid);
        assert_ne!(before, mid);
    }

    #[test]
    fn test_remove_liquidity_round_trip() {
        let mut dex = setup();
        let (_, _, shares) = dex
            .add_liquidity(
                "alice", "TKA", "TKB", 100 * ONE, 200 * ONE, 0, 0, "alice", FAR_FUTURE,
            )
            .unwrap();
        let pair = dex.get_pair("TKA", "TKB").unwrap().unwrap();
        dex.tokens_mut()
            .approve(&pair, "alice", ROUTER, shares)
            .unwrap();

        let (amount_a, amount_b) = dex
            .remove_liquidity("alice", "TKA", "TKB", shares, 0, 0, "alice", FAR_FUTURE)
            .unwrap();

        // all shares gone, only the locked minimum's slice stays pooled
        assert_eq!(dex.tokens().balance_of(&pair, "alice"), 0);
        assert!(amount_a > 99 * ONE && amount_a < 100 * ONE);
        assert!(amount_b > 199 * ONE && amount_b < 200 * ONE);
    }

    #[test]
    fn test_remove_liquidity_min_bounds() {
        let mut dex = setup();
        let (_, _, shares) = dex
            .add_liquidity(
                "alice", "TKA", "TKB", 100 * ONE, 200 * ONE, 0, 0, "alice", FAR_FUTURE,
            )
            .unwrap();
        let pair = dex.get_pair("TKA", "TKB").unwrap().unwrap();
        dex.tokens_mut()
            .approve(&pair, "alice", ROUTER, shares)
            .unwrap();
        assert_eq!(
            dex.remove_liquidity(
                "alice", "TKA", "TKB", shares, 100 * ONE, 0, "alice", FAR_FUTURE
            )
            .unwrap_err(),
            AmmError::InsufficientAAmount
        );
    }

    #[test]
    fn test_swap_exact_tokens_single_hop() {
        let mut dex = seeded();
        let expected = math::get_amount_out(5 * ONE, 100 * ONE, 200 * ONE).unwrap();
        let amounts = dex
            .swap_exact_tokens_for_tokens(
                "alice", 5 * ONE, expected, &["TKA", "TKB"], "bob", FAR_FUTURE,
            )
            .unwrap();
        assert_eq!(amounts, vec![5 * ONE, expected]);
        assert_eq!(dex.tokens().balance_of("TKB", "bob"), expected);
    }

    #[test]
    fn test_swap_exact_tokens_slippage_guard() {
        let mut dex = seeded();
        let expected = math::get_amount_out(5 * ONE, 100 * ONE, 200 * ONE).unwrap();
        assert_eq!(
            dex.swap_exact_tokens_for_tokens(
                "alice", 5 * ONE, expected + 1, &["TKA", "TKB"], "bob", FAR_FUTURE,
            )
            .unwrap_err(),
            AmmError::InsufficientOutputAmount
        );
        // guard failure moved nothing
        assert_eq!(dex.tokens().balance_of("TKB", "bob"), 0);
        assert_eq!(dex.get_reserves("TKA", "TKB").unwrap(), (100 * ONE, 200 * ONE));
    }

    #[test]
    fn test_swap_exact_tokens_multi_hop() {
        let mut dex = seeded();
        dex.add_liquidity(
            "alice", "TKB", "TKC", 200 * ONE, 100 * ONE, 0, 0, "alice", FAR_FUTURE,
        )
        .unwrap();

        let amounts = dex
            .swap_exact_tokens_for_tokens(
                "alice", 5 * ONE, 0, &["TKA", "TKB", "TKC"], "bob", FAR_FUTURE,
            )
            .unwrap();
        assert_eq!(amounts.len(), 3);
        let hop1 = math::get_amount_out(5 * ONE, 100 * ONE, 200 * ONE).unwrap();
        let hop2 = math::get_amount_out(hop1, 200 * ONE, 100 * ONE).unwrap();
        assert_eq!(amounts[1], hop1);
        assert_eq!(amounts[2], hop2);
        assert_eq!(dex.tokens().balance_of("TKC", "bob"), hop2);
        // intermediate asset never leaves the pools
        assert_eq!(dex.tokens().balance_of("TKB", "bob"), 0);
    }

    #[test]
    fn test_swap_exact_tokens_invalid_path() {
        let mut dex = seeded();
        assert_eq!(
            dex.swap_exact_tokens_for_tokens("alice", ONE, 0, &["TKA"], "bob", FAR_FUTURE)
                .unwrap_err(),
            AmmError::InvalidPath
        );
    }

    #[test]
    fn test_swap_exact_tokens_missing_pair() {
        let mut dex = seeded();
        assert_eq!(
            dex.swap_exact_tokens_for_tokens(
                "alice", ONE, 0, &["TKA", "TKC"], "bob", FAR_FUTURE
            )
            .unwrap_err(),
            AmmError::PairNotFound
        );
    }

    #[test]
    fn test_swap_tokens_for_exact_output() {
        let mut dex = seeded();
        let want = 10 * ONE;
        let need = math::get_amount_in(want, 100 * ONE, 200 * ONE).unwrap();
        let amounts = dex
            .swap_tokens_for_exact_tokens(
                "alice", want, need, &["TKA", "TKB"], "bob", FAR_FUTURE,
            )
            .unwrap();
        assert_eq!(amounts, vec![need, want]);
        assert_eq!(dex.tokens().balance_of("TKB", "bob"), want);
    }

    #[test]
    fn test_swap_tokens_for_exact_input_cap() {
        let mut dex = seeded();
        let want = 10 * ONE;
        let need = math::get_amount_in(want, 100 * ONE, 200 * ONE).unwrap();
        assert_eq!(
            dex.swap_tokens_for_exact_tokens(
                "alice", want, need - 1, &["TKA", "TKB"], "bob", FAR_FUTURE,
            )
            .unwrap_err(),
            AmmError::ExcessiveInputAmount
        );
    }

    #[test]
    fn test_quotes_match_execution() {
        let mut dex = seeded();
        let quoted = dex.get_amounts_out(5 * ONE, &["TKA", "TKB"]).unwrap();
        let executed = dex
            .swap_exact_tokens_for_tokens(
                "alice", 5 * ONE, 0, &["TKA", "TKB"], "bob", FAR_FUTURE,
            )
            .unwrap();
        assert_eq!(quoted, executed);
    }

    #[test]
    fn test_swap_without_allowance_rolls_back() {
        let mut dex = seeded();
        dex.tokens_mut().approve("TKA", "alice", ROUTER, 0).unwrap();
        assert_eq!(
            dex.swap_exact_tokens_for_tokens(
                "alice", 5 * ONE, 0, &["TKA", "TKB"], "bob", FAR_FUTURE,
            )
            .unwrap_err(),
            AmmError::Asset(xyk_asset::AssetError::InsufficientAllowance)
        );
        assert_eq!(dex.get_reserves("TKA", "TKB").unwrap(), (100 * ONE, 200 * ONE));
    }
}
