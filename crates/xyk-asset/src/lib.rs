// SPDX-License-Identifier: AGPL-3.0-only
//! # XYK Asset — Fungible-Asset Ledger
//!
//! Multi-token fungible-asset ledger for the XYK exchange engine.
//!
//! ## Overview
//! Every asset traded on the exchange lives in a single [`TokenLedger`]:
//! plain fungible tokens, the wrapped-native adapter, and the liquidity-share
//! tokens issued by pair ledgers (registered under the pair's own address).
//! The interface is the classic fungible standard — `balance_of`, `transfer`,
//! `approve` / `allowance` / `transfer_from`, `mint`, `burn` — so the AMM
//! core performs all asset movement through one uniform surface.
//!
//! ## Rules
//! - All amounts are atomic units (`u128`) — NO floating-point arithmetic
//! - `BTreeMap` everywhere for deterministic iteration and serialization
//! - Balance and supply updates use checked arithmetic; overflow is an error,
//!   never a wrap

use serde::{Deserialize, Serialize};

pub mod ledger;
pub mod token;
pub mod wrapped;

pub use ledger::{AssetEvent, AssetState, TokenLedger};
pub use token::TokenMetadata;
pub use wrapped::WrappedNative;

// ─────────────────────────────────────────────────────────────
// u128 ↔ String serialization (JSON doesn't support 128-bit integers)
// ─────────────────────────────────────────────────────────────

pub mod u128_str {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(val: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────
// ERRORS
// ─────────────────────────────────────────────────────────────

/// Failures raised by the asset ledger. Every failure aborts the enclosing
/// operation; the ledger never applies a partial balance update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetError {
    /// No asset registered under this identifier
    UnknownAsset(String),
    /// An asset with this identifier already exists
    AssetExists(String),
    /// Holder balance is below the requested amount
    InsufficientBalance,
    /// Spender allowance is below the requested amount
    InsufficientAllowance,
    /// Minting would exceed `max_supply` or overflow the supply counter
    SupplyOverflow,
    /// Crediting would overflow the recipient balance
    BalanceOverflow,
    /// Token metadata failed validation
    InvalidMetadata(String),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AssetError::UnknownAsset(id) => write!(f, "Unknown asset: {}", id),
            AssetError::AssetExists(id) => write!(f, "Asset already exists: {}", id),
            AssetError::InsufficientBalance => write!(f, "Insufficient balance"),
            AssetError::InsufficientAllowance => write!(f, "Insufficient allowance"),
            AssetError::SupplyOverflow => write!(f, "Supply overflow"),
            AssetError::BalanceOverflow => write!(f, "Balance overflow"),
            AssetError::InvalidMetadata(msg) => write!(f, "Invalid metadata: {}", msg),
        }
    }
}

impl std::error::Error for AssetError {}
