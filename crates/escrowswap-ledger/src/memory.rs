//! In-memory ledger.
//!
//! Tracks per-(account, asset) balances behind a single mutex. Batches from
//! [`Ledger::transfer_all`] are validated and applied under one lock
//! acquisition, so no other thread ever observes a half-applied batch.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use escrowswap_types::{AccountId, Amount, AssetId, EscrowSwapError, Result};

use crate::ledger::{Ledger, Transfer};
use crate::supply::SupplyConservation;

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<(AccountId, AssetId), Amount>,
    supply: SupplyConservation,
}

impl LedgerState {
    fn balance(&self, account: AccountId, asset: &AssetId) -> Amount {
        self.balances
            .get(&(account, asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn debit(&mut self, account: AccountId, asset: &AssetId, amount: Amount) -> Result<()> {
        let available = self.balance(account, asset);
        if available < amount {
            return Err(EscrowSwapError::InsufficientBalance {
                asset: asset.clone(),
                needed: amount,
                available,
            });
        }
        self.balances
            .insert((account, asset.clone()), available - amount);
        Ok(())
    }

    fn credit(&mut self, account: AccountId, asset: &AssetId, amount: Amount) -> Result<()> {
        let entry = self.balances.entry((account, asset.clone())).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(EscrowSwapError::ArithmeticOverflow("ledger balance"))?;
        Ok(())
    }

    fn apply(&mut self, leg: &Transfer) -> Result<()> {
        if leg.from == leg.to || leg.amount == 0 {
            // Still surface an overdraft on a self-transfer.
            let available = self.balance(leg.from, &leg.asset);
            if available < leg.amount {
                return Err(EscrowSwapError::InsufficientBalance {
                    asset: leg.asset.clone(),
                    needed: leg.amount,
                    available,
                });
            }
            return Ok(());
        }
        self.debit(leg.from, &leg.asset, leg.amount)?;
        if let Err(err) = self.credit(leg.to, &leg.asset, leg.amount) {
            // Credit can only fail on overflow; undo the debit.
            self.balances
                .entry((leg.from, leg.asset.clone()))
                .and_modify(|b| *b += leg.amount);
            return Err(err);
        }
        Ok(())
    }
}

/// A process-local ledger with supply tracking.
///
/// Assets become listed when first minted. Transfers of unlisted assets
/// fail with `InvalidAsset`.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|_| EscrowSwapError::Internal("ledger lock poisoned".into()))
    }

    /// Issue new units of `asset` to `account`, listing the asset.
    pub fn mint(&self, account: AccountId, asset: &AssetId, amount: Amount) -> Result<()> {
        if asset.is_null() {
            return Err(EscrowSwapError::ZeroAddress);
        }
        let mut state = self.lock()?;
        state.supply.record_mint(asset, amount)?;
        state.credit(account, asset, amount)
    }

    /// Destroy units of `asset` held by `account`.
    pub fn burn(&self, account: AccountId, asset: &AssetId, amount: Amount) -> Result<()> {
        let mut state = self.lock()?;
        state.debit(account, asset, amount)?;
        state.supply.record_burn(asset, amount);
        Ok(())
    }

    /// Sum of every account's balance in `asset`.
    pub fn total_supply(&self, asset: &AssetId) -> Result<Amount> {
        let state = self.lock()?;
        Ok(state
            .balances
            .iter()
            .filter(|((_, a), _)| a == asset)
            .map(|(_, amount)| *amount)
            .sum())
    }

    /// Check Σ balances == minted − burned for `asset`.
    pub fn verify_supply(&self, asset: &AssetId) -> Result<()> {
        let actual = self.total_supply(asset)?;
        self.lock()?.supply.verify(asset, actual)
    }

    /// Every listed asset.
    pub fn assets(&self) -> Result<BTreeSet<AssetId>> {
        Ok(self.lock()?.supply.tracked_assets())
    }
}

impl Ledger for InMemoryLedger {
    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<()> {
        self.transfer_all(&[Transfer::new(from, to, asset, amount)])
    }

    fn balance_of(&self, account: AccountId, asset: &AssetId) -> Amount {
        self.try_balance_of(account, asset).unwrap_or(0)
    }

    fn try_balance_of(&self, account: AccountId, asset: &AssetId) -> Result<Amount> {
        Ok(self.lock()?.balance(account, asset))
    }

    fn is_listed(&self, asset: &AssetId) -> bool {
        self.state
            .lock()
            .is_ok_and(|state| state.supply.is_tracked(asset))
    }

    fn transfer_all(&self, legs: &[Transfer]) -> Result<()> {
        let mut state = self.lock()?;
        for leg in legs {
            if !state.supply.is_tracked(&leg.asset) {
                return Err(EscrowSwapError::InvalidAsset(leg.asset.clone()));
            }
        }
        for (applied, leg) in legs.iter().enumerate() {
            if let Err(err) = state.apply(leg) {
                for done in legs[..applied].iter().rev() {
                    // Reversing a leg we just applied under the same lock
                    // cannot overdraw.
                    state.apply(&done.reversed())?;
                }
                return Err(err);
            }
        }
        Ok(())
    }
}
