// SPDX-License-Identifier: AGPL-3.0-only
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fs;
use std::path::Path;

/// Serde adapter for u128 ↔ TOML: serialize as string, deserialize from string or integer.
/// TOML crate doesn't natively support u128, so we round-trip through strings.
mod u128_toml {
    use super::*;

    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        use serde::de::{self, Visitor};
        struct U128Visitor;

        impl<'de> Visitor<'de> for U128Visitor {
            type Value = u128;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a u128 as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                if v >= 0 {
                    Ok(v as u128)
                } else {
                    Err(E::custom("negative value for u128"))
                }
            }
        }

        d.deserialize_any(U128Visitor)
    }
}

/// Engine deployment configuration
/// Fixes the well-known addresses and the share lock before genesis

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DexConfig {
    /// Address the registry derives pair addresses under
    pub registry_address: String,
    /// Address the router spends caller allowances from
    pub router_address: String,
    /// Unspendable address holding the permanently locked first-mint shares
    pub share_lock_address: String,
    /// Shares locked on a pair's first deposit
    #[serde(with = "u128_toml")]
    pub minimum_liquidity: u128,
    /// Protocol fee collector, None disables the fee switch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_to: Option<String>,
    pub wrapped_native: WrappedNativeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedNativeConfig {
    pub asset_id: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            registry_address: "xyk:registry".to_string(),
            router_address: "xyk:router".to_string(),
            share_lock_address: "xyk:locked".to_string(),
            minimum_liquidity: 1_000,
            fee_to: None,
            wrapped_native: WrappedNativeConfig {
                asset_id: "WNAT".to_string(),
                name: "Wrapped Native".to_string(),
                symbol: "WNAT".to_string(),
                decimals: 18,
            },
        }
    }
}

impl DexConfig {
    /// Load engine config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: DexConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save engine config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.registry_address.is_empty() {
            return Err("registry_address cannot be empty".to_string());
        }

        if self.router_address.is_empty() {
            return Err("router_address cannot be empty".to_string());
        }

        if self.share_lock_address.is_empty() {
            return Err("share_lock_address cannot be empty".to_string());
        }

        if self.share_lock_address == self.router_address
            || self.share_lock_address == self.registry_address
        {
            return Err("share_lock_address must not alias another engine address".to_string());
        }

        if self.minimum_liquidity == 0 {
            return Err("minimum_liquidity must be > 0".to_string());
        }

        if let Some(fee_to) = &self.fee_to {
            if fee_to.is_empty() {
                return Err("fee_to cannot be empty when set".to_string());
            }
        }

        if self.wrapped_native.asset_id.is_empty() {
            return Err("wrapped_native.asset_id cannot be empty".to_string());
        }

        if self.wrapped_native.decimals > 18 {
            return Err("wrapped_native.decimals must be 0-18".to_string());
        }

        Ok(())
    }
}
