// SPDX-License-Identifier: AGPL-3.0-only
//! # Wrapped-Native Adapter
//!
//! Presents the chain's native value as an ordinary fungible asset so the
//! exchange core never has to special-case it. `deposit` mints wrapped units
//! against received native value, `withdraw` burns them for redemption.
//! Custody of the underlying native value sits with the surrounding host,
//! exactly like a wrapped-asset bridge operator.

use serde::{Deserialize, Serialize};

use crate::ledger::{AssetEvent, TokenLedger};
use crate::AssetError;
use crate::TokenMetadata;

/// Handle to the wrapped-native asset registered in a [`TokenLedger`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WrappedNative {
    pub asset_id: String,
}

impl WrappedNative {
    /// Register the wrapped-native asset and return its handle.
    pub fn register(
        ledger: &mut TokenLedger,
        asset_id: &str,
        metadata: TokenMetadata,
    ) -> Result<Self, AssetError> {
        ledger.register(asset_id, metadata)?;
        Ok(WrappedNative {
            asset_id: asset_id.to_string(),
        })
    }

    /// Wrap `amount` of native value, crediting `to`.
    pub fn deposit(
        &self,
        ledger: &mut TokenLedger,
        to: &str,
        amount: u128,
    ) -> Result<(), AssetError> {
        ledger.mint(&self.asset_id, to, amount)?;
        ledger.events.push(AssetEvent::Deposit {
            asset: self.asset_id.clone(),
            to: to.to_string(),
            amount,
        });
        Ok(())
    }

    /// Unwrap `amount`, burning wrapped units held by `from`.
    pub fn withdraw(
        &self,
        ledger: &mut TokenLedger,
        from: &str,
        amount: u128,
    ) -> Result<(), AssetError> {
        ledger.burn(&self.asset_id, from, amount)?;
        ledger.events.push(AssetEvent::Withdrawal {
            asset: self.asset_id.clone(),
            from: from.to_string(),
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (TokenLedger, WrappedNative) {
        let mut ledger = TokenLedger::new();
        let wrapped = WrappedNative::register(
            &mut ledger,
            "WNAT",
            TokenMetadata::new("Wrapped Native", "WNAT", 18),
        )
        .unwrap();
        (ledger, wrapped)
    }

    #[test]
    fn test_deposit_mints_wrapped_units() {
        let (mut ledger, wrapped) = setup();
        wrapped.deposit(&mut ledger, "alice", 1_000).unwrap();
        assert_eq!(ledger.balance_of("WNAT", "alice"), 1_000);
        assert_eq!(ledger.total_supply("WNAT"), 1_000);
    }

    #[test]
    fn test_withdraw_burns_wrapped_units() {
        let (mut ledger, wrapped) = setup();
        wrapped.deposit(&mut ledger, "alice", 1_000).unwrap();
        wrapped.withdraw(&mut ledger, "alice", 600).unwrap();
        assert_eq!(ledger.balance_of("WNAT", "alice"), 400);
        assert_eq!(ledger.total_supply("WNAT"), 400);
    }

    #[test]
    fn test_withdraw_more_than_held() {
        let (mut ledger, wrapped) = setup();
        wrapped.deposit(&mut ledger, "alice", 100).unwrap();
        assert_eq!(
            wrapped.withdraw(&mut ledger, "alice", 101).unwrap_err(),
            AssetError::InsufficientBalance
        );
    }

    #[test]
    fn test_wrapped_units_transfer_like_any_asset() {
        let (mut ledger, wrapped) = setup();
        wrapped.deposit(&mut ledger, "alice", 500).unwrap();
        ledger.transfer("WNAT", "alice", "bob", 200).unwrap();
        assert_eq!(ledger.balance_of("WNAT", "bob"), 200);
    }

    #[test]
    fn test_deposit_emits_event() {
        let (mut ledger, wrapped) = setup();
        ledger.drain_events();
        wrapped.deposit(&mut ledger, "alice", 5).unwrap();
        let events = ledger.drain_events();
        // mint Transfer followed by the Deposit marker
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], AssetEvent::Deposit { .. }));
    }
}
