// SPDX-License-Identifier: AGPL-3.0-only
//! Failure taxonomy for the AMM core.
//!
//! Every failure is synchronous and fatal to the current operation: the
//! engine unwinds the whole operation, including any speculative transfers
//! already issued, and leaves all ledger state exactly as before the call.
//! Retry is a caller policy, never the core's.

use serde::{Deserialize, Serialize};
use xyk_asset::AssetError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmmError {
    // ── input validation ──
    /// A pair cannot be created from two identical assets
    IdenticalAssets,
    /// A pair for this canonical asset pair already exists
    PairExists,
    /// No pair registered for this asset pair
    PairNotFound,
    /// Swap path holds fewer than two assets
    InvalidPath,
    /// Swap output may not be sent to one of the pool's own tokens
    InvalidRecipient,
    /// Router deadline lies in the past
    Expired,

    // ── economic guards ──
    /// Requested swap output is zero, or realized output below the minimum
    InsufficientOutputAmount,
    /// Realized input is zero
    InsufficientInputAmount,
    /// Required input exceeds the caller's maximum (exact-output swaps)
    ExcessiveInputAmount,
    /// Ratio-matched amount of asset A fell below the caller's minimum
    InsufficientAAmount,
    /// Ratio-matched amount of asset B fell below the caller's minimum
    InsufficientBAmount,
    /// First deposit too small to cover the locked minimum liquidity
    InsufficientInitialLiquidity,
    /// Deposit mints zero shares
    InsufficientLiquidityMinted,
    /// Redemption yields zero of either asset
    InsufficientLiquidityBurned,

    // ── invariant ──
    /// The fee-adjusted constant-product check failed
    InvariantViolation,
    /// A reserve is empty or a requested output would deplete it
    InsufficientLiquidity,
    /// A 256-bit intermediate result does not fit the u128 amount domain
    AmountOverflow,

    // ── reentrancy ──
    /// The pair ledger is already executing a mutating call
    Locked,

    // ── ambient ──
    /// Engine configuration failed validation
    InvalidConfig(String),
    /// Propagated asset-ledger failure
    Asset(AssetError),
}

impl std::fmt::Display for AmmError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AmmError::IdenticalAssets => write!(f, "Identical assets"),
            AmmError::PairExists => write!(f, "Pair already exists"),
            AmmError::PairNotFound => write!(f, "Pair not found"),
            AmmError::InvalidPath => write!(f, "Swap path must hold at least two assets"),
            AmmError::InvalidRecipient => write!(f, "Invalid swap recipient"),
            AmmError::Expired => write!(f, "Deadline expired"),
            AmmError::InsufficientOutputAmount => write!(f, "Insufficient output amount"),
            AmmError::InsufficientInputAmount => write!(f, "Insufficient input amount"),
            AmmError::ExcessiveInputAmount => write!(f, "Excessive input amount"),
            AmmError::InsufficientAAmount => write!(f, "Insufficient amount of asset A"),
            AmmError::InsufficientBAmount => write!(f, "Insufficient amount of asset B"),
            AmmError::InsufficientInitialLiquidity => {
                write!(f, "Initial liquidity below locked minimum")
            }
            AmmError::InsufficientLiquidityMinted => write!(f, "Insufficient liquidity minted"),
            AmmError::InsufficientLiquidityBurned => write!(f, "Insufficient liquidity burned"),
            AmmError::InvariantViolation => {
                write!(f, "Constant-product invariant violated (K)")
            }
            AmmError::InsufficientLiquidity => write!(f, "Insufficient liquidity"),
            AmmError::AmountOverflow => write!(f, "Amount overflow"),
            AmmError::Locked => write!(f, "Pair ledger is locked"),
            AmmError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            AmmError::Asset(err) => write!(f, "Asset ledger: {}", err),
        }
    }
}

impl std::error::Error for AmmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmmError::Asset(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AssetError> for AmmError {
    fn from(err: AssetError) -> Self {
        AmmError::Asset(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AmmError::Expired.to_string(), "Deadline expired");
        assert_eq!(
            AmmError::Asset(AssetError::InsufficientBalance).to_string(),
            "Asset ledger: Insufficient balance"
        );
    }

    #[test]
    fn test_asset_error_converts() {
        fn fails() -> Result<(), AmmError> {
            Err(AssetError::InsufficientAllowance)?
        }
        assert_eq!(
            fails().unwrap_err(),
            AmmError::Asset(AssetError::InsufficientAllowance)
        );
    }
}
