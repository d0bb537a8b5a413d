//! Supply conservation invariant checker.
//!
//! Invariant enforced by the in-memory ledger:
//! ```text
//! ∀ asset: Σ balances == Σ minted − Σ burned
//! ```
//!
//! Transfers (escrow custody, pool reserves, settlement) only move balances
//! between accounts, so they never change either side of the equation.

use std::collections::{BTreeSet, HashMap};

use escrowswap_types::{Amount, AssetId, EscrowSwapError, Result};

/// Tracks per-asset issuance totals.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    minted: HashMap<AssetId, Amount>,
    burned: HashMap<AssetId, Amount>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, asset: &AssetId, amount: Amount) -> Result<()> {
        let total = self.minted.entry(asset.clone()).or_insert(0);
        *total = total
            .checked_add(amount)
            .ok_or(EscrowSwapError::ArithmeticOverflow("minted supply"))?;
        Ok(())
    }

    pub fn record_burn(&mut self, asset: &AssetId, amount: Amount) {
        *self.burned.entry(asset.clone()).or_insert(0) += amount;
    }

    /// Expected circulating supply: minted − burned.
    #[must_use]
    pub fn expected_supply(&self, asset: &AssetId) -> Amount {
        self.total_minted(asset)
            .saturating_sub(self.total_burned(asset))
    }

    /// Compare the actual sum of balances with the expected supply.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if they differ.
    pub fn verify(&self, asset: &AssetId, actual_supply: Amount) -> Result<()> {
        let expected = self.expected_supply(asset);
        if actual_supply != expected {
            return Err(EscrowSwapError::InvariantViolation {
                reason: format!(
                    "asset {asset}: actual supply {actual_supply} != expected {expected} \
                     (minted={}, burned={})",
                    self.total_minted(asset),
                    self.total_burned(asset),
                ),
            });
        }
        Ok(())
    }

    /// Every asset ever minted, in order.
    #[must_use]
    pub fn tracked_assets(&self) -> BTreeSet<AssetId> {
        self.minted.keys().cloned().collect()
    }

    #[must_use]
    pub fn is_tracked(&self, asset: &AssetId) -> bool {
        self.minted.contains_key(asset)
    }

    #[must_use]
    pub fn total_minted(&self, asset: &AssetId) -> Amount {
        self.minted.get(asset).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_burned(&self, asset: &AssetId) -> Amount {
        self.burned.get(asset).copied().unwrap_or(0)
    }
}
