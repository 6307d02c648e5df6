// SPDX-License-Identifier: AGPL-3.0-only
//! Engine events appended by pair and registry operations. Serialized with
//! string amounts so JSON consumers never lose 128-bit precision.

use serde::{Deserialize, Serialize};
use xyk_asset::u128_str;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AmmEvent {
    PairCreated {
        token0: String,
        token1: String,
        pair: String,
        index: u64,
    },
    Mint {
        pair: String,
        to: String,
        #[serde(with = "u128_str")]
        amount0: u128,
        #[serde(with = "u128_str")]
        amount1: u128,
        #[serde(with = "u128_str")]
        shares: u128,
    },
    Burn {
        pair: String,
        to: String,
        #[serde(with = "u128_str")]
        amount0: u128,
        #[serde(with = "u128_str")]
        amount1: u128,
        #[serde(with = "u128_str")]
        shares: u128,
    },
    Swap {
        pair: String,
        to: String,
        #[serde(with = "u128_str")]
        amount0_in: u128,
        #[serde(with = "u128_str")]
        amount1_in: u128,
        #[serde(with = "u128_str")]
        amount0_out: u128,
        #[serde(with = "u128_str")]
        amount1_out: u128,
    },
    /// Reserves resynchronized to ledger balances
    Sync {
        pair: String,
        #[serde(with = "u128_str")]
        reserve0: u128,
        #[serde(with = "u128_str")]
        reserve1: u128,
    },
}
