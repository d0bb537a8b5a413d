//! The fungible-balance ledger interface.
//!
//! EscrowSwap never owns balances itself. Escrow custody and pool reserves
//! are ordinary ledger accounts; every movement of funds is a
//! [`Ledger::transfer`]. Multi-leg movements go through
//! [`Ledger::transfer_all`], which is all-or-nothing.

use std::fmt;

use escrowswap_types::{AccountId, Amount, AssetId, EscrowSwapError, Result};

/// One leg of a multi-transfer batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: AccountId,
    pub to: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
}

impl Transfer {
    #[must_use]
    pub fn new(from: AccountId, to: AccountId, asset: &AssetId, amount: Amount) -> Self {
        Self {
            from,
            to,
            asset: asset.clone(),
            amount,
        }
    }

    /// The same leg in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            asset: self.asset.clone(),
            amount: self.amount,
        }
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} -> {}", self.amount, self.asset, self.from, self.to)
    }
}

/// Balance ledger consumed by the escrow engine and liquidity pools.
///
/// Implementations must be atomic and immediately consistent: once
/// `transfer` returns `Ok`, every subsequent `balance_of` reflects it.
pub trait Ledger: Send + Sync {
    /// Move `amount` of `asset` from one account to another.
    ///
    /// # Errors
    /// Returns `InsufficientBalance` if `from` holds less than `amount`;
    /// nothing changes in that case.
    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<()>;

    /// Current balance of `account` in `asset` (zero if unknown).
    fn balance_of(&self, account: AccountId, asset: &AssetId) -> Amount;

    /// Like [`Ledger::balance_of`], but surfaces a failing backend instead
    /// of reading zero. Engines use this wherever a balance becomes state.
    ///
    /// # Errors
    /// Implementation-specific; `Internal` for the in-memory ledger.
    fn try_balance_of(&self, account: AccountId, asset: &AssetId) -> Result<Amount> {
        Ok(self.balance_of(account, asset))
    }

    /// Whether `asset` is a valid asset on this ledger.
    fn is_listed(&self, asset: &AssetId) -> bool {
        !asset.is_null()
    }

    /// Apply every leg or none of them.
    ///
    /// The default applies legs in order and, on the first failure, reverts
    /// the legs already applied in reverse order. Implementations that can
    /// apply a batch under a single lock should override it.
    ///
    /// # Errors
    /// Returns the error of the failing leg. Returns `InvariantViolation`
    /// if a revert itself fails, which leaves the ledger inconsistent.
    fn transfer_all(&self, legs: &[Transfer]) -> Result<()> {
        for (applied, leg) in legs.iter().enumerate() {
            if let Err(err) = self.transfer(leg.from, leg.to, &leg.asset, leg.amount) {
                for done in legs[..applied].iter().rev() {
                    let undo = done.reversed();
                    if let Err(revert_err) =
                        self.transfer(undo.from, undo.to, &undo.asset, undo.amount)
                    {
                        tracing::error!(
                            leg = %done,
                            error = %revert_err,
                            "Failed to revert transfer leg"
                        );
                        return Err(EscrowSwapError::InvariantViolation {
                            reason: format!("revert of {done} failed: {revert_err}"),
                        });
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

impl<L: Ledger + ?Sized> Ledger for std::sync::Arc<L> {
    fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        asset: &AssetId,
        amount: Amount,
    ) -> Result<()> {
        (**self).transfer(from, to, asset, amount)
    }

    fn balance_of(&self, account: AccountId, asset: &AssetId) -> Amount {
        (**self).balance_of(account, asset)
    }

    fn try_balance_of(&self, account: AccountId, asset: &AssetId) -> Result<Amount> {
        (**self).try_balance_of(account, asset)
    }

    fn is_listed(&self, asset: &AssetId) -> bool {
        (**self).is_listed(asset)
    }

    fn transfer_all(&self, legs: &[Transfer]) -> Result<()> {
        (**self).transfer_all(legs)
    }
}
