// SPDX-License-Identifier: AGPL-3.0-only
//! Token metadata and validation rules shared by all registered assets.

use serde::{Deserialize, Serialize};

use crate::u128_str;
use crate::AssetError;

/// Metadata recorded when an asset is registered in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Human-readable name (e.g. "Wrapped Native")
    pub name: String,
    /// Ticker symbol (e.g. "WNAT"), max 8 characters
    pub symbol: String,
    /// Decimal places for display, 0-18. Pool math never inspects this.
    pub decimals: u8,
    /// Maximum supply cap in atomic units (0 = no cap)
    #[serde(default, with = "u128_str")]
    pub max_supply: u128,
}

impl TokenMetadata {
    pub fn new(name: &str, symbol: &str, decimals: u8) -> Self {
        TokenMetadata {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            max_supply: 0,
        }
    }

    /// Validate metadata fields.
    pub fn validate(&self) -> Result<(), AssetError> {
        if self.name.is_empty() || self.name.len() > 64 {
            return Err(AssetError::InvalidMetadata(
                "name must be 1-64 characters".to_string(),
            ));
        }
        if self.symbol.is_empty() || self.symbol.len() > 8 {
            return Err(AssetError::InvalidMetadata(
                "symbol must be 1-8 characters".to_string(),
            ));
        }
        if self.decimals > 18 {
            return Err(AssetError::InvalidMetadata(
                "decimals must be 0-18".to_string(),
            ));
        }
        Ok(())
    }
}
