// SPDX-License-Identifier: AGPL-3.0-only
//! # Constant-Product Math
//!
//! All pool arithmetic lives here. Amounts are u128 atomic units; every
//! intermediate product is widened to 256 or 512 bits so no sequence of
//! in-range inputs can overflow. NO floating point anywhere, all rounding
//! is explicit integer division (floor unless stated otherwise).

use uint::construct_uint;

use crate::error::AmmError;
use crate::{FEE_DENOMINATOR, FEE_NUMERATOR};

construct_uint! {
    /// 256-bit unsigned integer for products of two u128 amounts.
    pub struct U256(4);
}

construct_uint! {
    /// 512-bit unsigned integer for fee-scaled invariant products.
    pub struct U512(8);
}

/// Narrow a 256-bit intermediate back into the u128 amount domain.
fn to_u128(value: U256) -> Result<u128, AmmError> {
    if value.bits() > 128 {
        return Err(AmmError::AmountOverflow);
    }
    Ok(value.as_u128())
}

fn to_u128_wide(value: U512) -> Result<u128, AmmError> {
    if value.bits() > 128 {
        return Err(AmmError::AmountOverflow);
    }
    Ok(value.low_u128())
}

/// floor(a * b / denominator) with a 512-bit intermediate.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, AmmError> {
    if denominator == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }
    let wide = U512::from(a) * U512::from(b) / U512::from(denominator);
    to_u128_wide(wide)
}

/// floor(sqrt(a * b)). Always fits u128 since the product fits 256 bits.
pub fn sqrt_product(a: u128, b: u128) -> u128 {
    (U256::from(a) * U256::from(b)).integer_sqrt().as_u128()
}

/// Equivalent amount of the other asset at the current reserve ratio.
///
/// `amount_b = amount_a * reserve_b / reserve_a`, floor rounded. Used for
/// deposit ratio matching, never for swap pricing (no fee applied).
pub fn quote(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128, AmmError> {
    if amount_a == 0 {
        return Err(AmmError::InsufficientInputAmount);
    }
    if reserve_a == 0 || reserve_b == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }
    mul_div(amount_a, reserve_b, reserve_a)
}

/// Maximum output for an exact input, after the swap fee.
///
/// `out = in*997*reserve_out / (reserve_in*1000 + in*997)`, floor rounded
/// in the pool's favor.
pub fn get_amount_out(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
) -> Result<u128, AmmError> {
    if amount_in == 0 {
        return Err(AmmError::InsufficientInputAmount);
    }
    if reserve_in == 0 || reserve_out == 0 {
        return Err(AmmError::InsufficientLiquidity);
    }
    let amount_in_with_fee = U512::from(amount_in) * U512::from(FEE_NUMERATOR);
    let numerator = amount_in_with_fee * U512::from(reserve_out);
    let denominator = U512::from(reserve_in) * U512::from(FEE_DENOMINATOR) + amount_in_with_fee;
    to_u128_wide(numerator / denominator)
}

/// Minimum input for an exact output, after the swap fee.
///
/// `in = reserve_in*out*1000 / ((reserve_out - out)*997) + 1`. The +1
/// rounds up so the pool never receives less than the fee formula demands.
pub fn get_amount_in(
    amount_out: u128,
    reserve_in: u128,
    reserve_out: u128,
) -> Result<u128, AmmError> {
    if amount_out == 0 {
        return Err(AmmError::InsufficientOutputAmount);
    }
    if reserve_in == 0 || reserve_out == 0 || amount_out >= reserve_out {
        return Err(AmmError::InsufficientLiquidity);
    }
    let numerator = U512::from(reserve_in) * U512::from(amount_out) * U512::from(FEE_DENOMINATOR);
    let denominator = U512::from(reserve_out - amount_out) * U512::from(FEE_NUMERATOR);
    to_u128_wide(numerator / denominator + U512::from(1u8))
}

/// Fee-adjusted constant-product check after a swap settles.
///
/// Scales both post-swap balances by 1000, subtracts 3x the measured
/// inputs (the 0.3% fee), and requires the adjusted product to be at
/// least the pre-swap `reserve0 * reserve1 * 1000^2`.
pub fn k_after_fee_holds(
    balance0: u128,
    balance1: u128,
    amount0_in: u128,
    amount1_in: u128,
    reserve0: u128,
    reserve1: u128,
) -> bool {
    let fee = U512::from(FEE_DENOMINATOR - FEE_NUMERATOR);
    let adjusted0 =
        U512::from(balance0) * U512::from(FEE_DENOMINATOR) - U512::from(amount0_in) * fee;
    let adjusted1 =
        U512::from(balance1) * U512::from(FEE_DENOMINATOR) - U512::from(amount1_in) * fee;
    let k_before = U512::from(reserve0)
        * U512::from(reserve1)
        * U512::from(FEE_DENOMINATOR)
        * U512::from(FEE_DENOMINATOR);
    adjusted0 * adjusted1 >= k_before
}

/// Shares minted against a proportional deposit: min of the two ratios.
pub fn shares_for_deposit(
    amount0: u128,
    amount1: u128,
    reserve0: u128,
    reserve1: u128,
    total_shares: u128,
) -> Result<u128, AmmError> {
    let by0 = mul_div(amount0, total_shares, reserve0)?;
    let by1 = mul_div(amount1, total_shares, reserve1)?;
    Ok(by0.min(by1))
}

/// Protocol-fee shares minted to the fee collector when liquidity grows.
///
/// `total * (root_k - root_k_last) / (root_k * 5 + root_k_last)`, which
/// hands the collector one sixth of the growth in sqrt(K).
pub fn protocol_fee_shares(
    total_shares: u128,
    root_k: u128,
    root_k_last: u128,
) -> Result<u128, AmmError> {
    if root_k <= root_k_last {
        return Ok(0);
    }
    let numerator = U256::from(total_shares) * U256::from(root_k - root_k_last);
    let denominator = U256::from(root_k) * U256::from(5u8) + U256::from(root_k_last);
    to_u128(numerator / denominator)
}
