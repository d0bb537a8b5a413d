//! Constant-product liquidity pool for one canonical pair.
//!
//! Reserves live in the pool's custody account on the ledger; the pool
//! keeps a mirror of them that is re-read after every state change. Share
//! balances are pool-internal.
//!
//! ```text
//! reserve_a == 0  ⟺  reserve_b == 0  ⟺  total_shares == 0
//! ```
//!
//! Every operation computes its full outcome, checks it, and only then
//! moves funds with a single [`Ledger::transfer_all`] batch. A rejected call
//! leaves reserves, shares and balances untouched.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use escrowswap_ledger::{EventSink, Ledger, Transfer};
use escrowswap_types::constants::MINIMUM_LIQUIDITY;
use escrowswap_types::{
    AccountId, Amount, AssetId, EscrowSwapError, Observation, PairKey, PoolId, Result,
};
use rust_decimal::Decimal;

use crate::math;

/// Result of [`LiquidityPool::deposit`], in canonical pair order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    pub amount_a: Amount,
    pub amount_b: Amount,
    pub shares: Amount,
}

/// Result of [`LiquidityPool::withdraw`], in canonical pair order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub amount_a: Amount,
    pub amount_b: Amount,
}

/// Result of [`LiquidityPool::swap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swap {
    pub amount_in: Amount,
    pub amount_out: Amount,
}

/// Shared handle to a pool. All pool mutation happens under its mutex.
pub type PoolHandle = Arc<Mutex<LiquidityPool>>;

pub(crate) fn lock(handle: &PoolHandle) -> Result<MutexGuard<'_, LiquidityPool>> {
    handle
        .lock()
        .map_err(|_| EscrowSwapError::Internal("pool lock poisoned".into()))
}

/// A constant-product pool.
pub struct LiquidityPool {
    pair: PairKey,
    pool_id: PoolId,
    custody: AccountId,
    reserve_a: Amount,
    reserve_b: Amount,
    total_shares: Amount,
    shares: HashMap<AccountId, Amount>,
    k_last: Amount,
    sink: Arc<dyn EventSink>,
}

impl fmt::Debug for LiquidityPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiquidityPool")
            .field("pair", &self.pair)
            .field("pool_id", &self.pool_id)
            .field("reserve_a", &self.reserve_a)
            .field("reserve_b", &self.reserve_b)
            .field("total_shares", &self.total_shares)
            .field("k_last", &self.k_last)
            .finish_non_exhaustive()
    }
}

impl LiquidityPool {
    /// An empty pool with a custody account of its own, derived from the
    /// pair and a fresh instance id.
    #[must_use]
    pub fn new(pair: PairKey, sink: Arc<dyn EventSink>) -> Self {
        let pool_id = pair.pool_id();
        Self {
            custody: pool_id.custody_account(AccountId::new()),
            pair,
            pool_id,
            reserve_a: 0,
            reserve_b: 0,
            total_shares: 0,
            shares: HashMap::new(),
            k_last: 0,
            sink,
        }
    }

    /// Add liquidity at the current ratio.
    ///
    /// The first deposit sets the ratio and mints `isqrt(a·b) − 1000`
    /// shares; the remaining 1000 are locked to [`AccountId::ZERO`] forever.
    /// Later deposits take `amount_a_desired` and the matching `b` if that
    /// fits under `amount_b_desired`, otherwise `amount_b_desired` and the
    /// matching `a`.
    ///
    /// # Errors
    /// `ZeroAddress`, `ZeroAmount`, `InsufficientInitialLiquidity`,
    /// `InsufficientAAmount`, `InsufficientBAmount`,
    /// `InsufficientLiquidityMinted`, or a ledger error.
    pub fn deposit<L: Ledger + ?Sized>(
        &mut self,
        ledger: &L,
        depositor: AccountId,
        amount_a_desired: Amount,
        amount_b_desired: Amount,
        amount_a_min: Amount,
        amount_b_min: Amount,
    ) -> Result<Deposit> {
        if depositor.is_zero() {
            return Err(EscrowSwapError::ZeroAddress);
        }
        if amount_a_desired == 0 {
            return Err(EscrowSwapError::ZeroAmount {
                field: "amount_a_desired",
            });
        }
        if amount_b_desired == 0 {
            return Err(EscrowSwapError::ZeroAmount {
                field: "amount_b_desired",
            });
        }

        let first = self.total_shares == 0;
        let (amount_a, amount_b) = if first {
            (amount_a_desired, amount_b_desired)
        } else {
            self.optimal_amounts(amount_a_desired, amount_b_desired, amount_a_min, amount_b_min)?
        };

        let (shares, locked) = if first {
            (math::initial_shares(amount_a, amount_b)?, MINIMUM_LIQUIDITY)
        } else {
            let minted = math::proportional_shares(
                amount_a,
                amount_b,
                self.reserve_a,
                self.reserve_b,
                self.total_shares,
            )?;
            (minted, 0)
        };
        if shares == 0 {
            return Err(EscrowSwapError::InsufficientLiquidityMinted);
        }
        let new_total = self
            .total_shares
            .checked_add(shares)
            .and_then(|t| t.checked_add(locked))
            .ok_or(EscrowSwapError::ArithmeticOverflow("total shares"))?;

        ledger.transfer_all(&[
            Transfer::new(depositor, self.custody, self.pair.asset_a(), amount_a),
            Transfer::new(depositor, self.custody, self.pair.asset_b(), amount_b),
        ])?;

        if locked > 0 {
            *self.shares.entry(AccountId::ZERO).or_insert(0) += locked;
        }
        *self.shares.entry(depositor).or_insert(0) += shares;
        self.total_shares = new_total;
        self.settle(ledger)?;

        tracing::debug!(
            pool = %self.pool_id,
            depositor = %depositor,
            amount_a = %amount_a,
            amount_b = %amount_b,
            shares = %shares,
            "Liquidity added"
        );
        Ok(Deposit {
            amount_a,
            amount_b,
            shares,
        })
    }

    fn optimal_amounts(
        &self,
        amount_a_desired: Amount,
        amount_b_desired: Amount,
        amount_a_min: Amount,
        amount_b_min: Amount,
    ) -> Result<(Amount, Amount)> {
        let b_optimal = math::quote(amount_a_desired, self.reserve_a, self.reserve_b)?;
        if b_optimal <= amount_b_desired {
            if b_optimal < amount_b_min {
                return Err(EscrowSwapError::InsufficientBAmount {
                    optimal: b_optimal,
                    minimum: amount_b_min,
                });
            }
            return Ok((amount_a_desired, b_optimal));
        }
        let a_optimal = math::quote(amount_b_desired, self.reserve_b, self.reserve_a)?;
        if a_optimal > amount_a_desired || a_optimal < amount_a_min {
            return Err(EscrowSwapError::InsufficientAAmount {
                optimal: a_optimal,
                minimum: amount_a_min,
            });
        }
        Ok((a_optimal, amount_b_desired))
    }

    /// Burn `shares` and pay out the pro-rata slice of both reserves.
    ///
    /// # Errors
    /// `ZeroAddress` for the burn sink, `InsufficientShares` if the
    /// withdrawer holds fewer shares,
    /// `InsufficientLiquidityBurned` if either payout rounds to zero.
    pub fn withdraw<L: Ledger + ?Sized>(
        &mut self,
        ledger: &L,
        withdrawer: AccountId,
        shares: Amount,
    ) -> Result<Withdrawal> {
        // Locked minimum liquidity is never withdrawable.
        if withdrawer.is_zero() {
            return Err(EscrowSwapError::ZeroAddress);
        }
        let held = self.shares_of(&withdrawer);
        if held < shares {
            return Err(EscrowSwapError::InsufficientShares {
                needed: shares,
                available: held,
            });
        }
        let amount_a = math::pro_rata(shares, self.reserve_a, self.total_shares)?;
        let amount_b = math::pro_rata(shares, self.reserve_b, self.total_shares)?;
        if amount_a == 0 || amount_b == 0 {
            return Err(EscrowSwapError::InsufficientLiquidityBurned);
        }

        ledger.transfer_all(&[
            Transfer::new(self.custody, withdrawer, self.pair.asset_a(), amount_a),
            Transfer::new(self.custody, withdrawer, self.pair.asset_b(), amount_b),
        ])?;

        if let Some(balance) = self.shares.get_mut(&withdrawer) {
            *balance -= shares;
            if *balance == 0 {
                self.shares.remove(&withdrawer);
            }
        }
        self.total_shares -= shares;
        self.settle(ledger)?;

        tracing::debug!(
            pool = %self.pool_id,
            withdrawer = %withdrawer,
            shares = %shares,
            amount_a = %amount_a,
            amount_b = %amount_b,
            "Liquidity removed"
        );
        Ok(Withdrawal { amount_a, amount_b })
    }

    /// Exact-in swap of `amount_in` units of `asset_in` for the other asset.
    ///
    /// # Errors
    /// `InvalidAsset`, `InsufficientInputAmount`, `InsufficientLiquidity`,
    /// `InsufficientOutputAmount`, or `InvariantViolation` if the product
    /// would decrease.
    pub fn swap<L: Ledger + ?Sized>(
        &mut self,
        ledger: &L,
        trader: AccountId,
        asset_in: &AssetId,
        amount_in: Amount,
        amount_out_min: Amount,
    ) -> Result<Swap> {
        if trader.is_zero() {
            return Err(EscrowSwapError::ZeroAddress);
        }
        let asset_out = self
            .pair
            .other(asset_in)
            .ok_or_else(|| EscrowSwapError::InvalidAsset(asset_in.clone()))?
            .clone();
        let (reserve_in, reserve_out) = self.directed_reserves(asset_in)?;
        let amount_out = math::get_amount_out(amount_in, reserve_in, reserve_out)?;
        if amount_out == 0 || amount_out < amount_out_min {
            return Err(EscrowSwapError::InsufficientOutputAmount {
                amount_out,
                minimum: amount_out_min,
            });
        }

        let k_before = math::product(reserve_in, reserve_out)?;
        let new_in = reserve_in
            .checked_add(amount_in)
            .ok_or(EscrowSwapError::ArithmeticOverflow("reserve in"))?;
        let k_after = math::product(new_in, reserve_out - amount_out)?;
        if k_after < k_before {
            tracing::error!(
                pool = %self.pool_id,
                k_before = %k_before,
                k_after = %k_after,
                "Swap would decrease the reserve product"
            );
            return Err(EscrowSwapError::InvariantViolation {
                reason: format!("k decreased from {k_before} to {k_after}"),
            });
        }

        ledger.transfer_all(&[
            Transfer::new(trader, self.custody, asset_in, amount_in),
            Transfer::new(self.custody, trader, &asset_out, amount_out),
        ])?;
        self.settle(ledger)?;

        tracing::debug!(
            pool = %self.pool_id,
            trader = %trader,
            asset_in = %asset_in,
            amount_in = %amount_in,
            amount_out = %amount_out,
            "Swap executed"
        );
        Ok(Swap {
            amount_in,
            amount_out,
        })
    }

    /// Read-only exact-in quote against the current reserves.
    pub fn amount_out(&self, asset_in: &AssetId, amount_in: Amount) -> Result<Amount> {
        let (reserve_in, reserve_out) = self.directed_reserves(asset_in)?;
        math::get_amount_out(amount_in, reserve_in, reserve_out)
    }

    fn directed_reserves(&self, asset_in: &AssetId) -> Result<(Amount, Amount)> {
        if asset_in == self.pair.asset_a() {
            Ok((self.reserve_a, self.reserve_b))
        } else if asset_in == self.pair.asset_b() {
            Ok((self.reserve_b, self.reserve_a))
        } else {
            Err(EscrowSwapError::InvalidAsset(asset_in.clone()))
        }
    }

    /// Re-read reserves from the custody balances and emit `PoolSynced`.
    ///
    /// # Errors
    /// Whatever [`Ledger::try_balance_of`] returns; reserves are left
    /// untouched in that case.
    pub fn sync<L: Ledger + ?Sized>(&mut self, ledger: &L) -> Result<()> {
        let reserve_a = ledger.try_balance_of(self.custody, self.pair.asset_a())?;
        let reserve_b = ledger.try_balance_of(self.custody, self.pair.asset_b())?;
        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        tracing::debug!(
            pool = %self.pool_id,
            reserve_a = %self.reserve_a,
            reserve_b = %self.reserve_b,
            "Pool reserves synced"
        );
        self.sink.emit(&Observation::PoolSynced {
            pool: self.pool_id,
            pair: self.pair.clone(),
            reserve_a: self.reserve_a,
            reserve_b: self.reserve_b,
        });
        Ok(())
    }

    /// Sync, then record the new product as `k_last`.
    fn settle<L: Ledger + ?Sized>(&mut self, ledger: &L) -> Result<()> {
        self.sync(ledger)?;
        // Saturates only when the product leaves u128 range.
        self.k_last = self.reserve_a.saturating_mul(self.reserve_b);
        Ok(())
    }

    /// Price of one unit of `asset_a` in `asset_b`; `None` while empty.
    #[must_use]
    pub fn spot_price(&self) -> Option<Decimal> {
        if self.reserve_a == 0 {
            return None;
        }
        let a = Decimal::try_from_i128_with_scale(i128::try_from(self.reserve_a).ok()?, 0).ok()?;
        let b = Decimal::try_from_i128_with_scale(i128::try_from(self.reserve_b).ok()?, 0).ok()?;
        b.checked_div(a)
    }

    #[must_use]
    pub fn pair(&self) -> &PairKey {
        &self.pair
    }

    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        self.pool_id
    }

    /// Ledger account holding the reserves.
    #[must_use]
    pub fn custody_account(&self) -> AccountId {
        self.custody
    }

    /// `(reserve_a, reserve_b)` in canonical order.
    #[must_use]
    pub fn reserves(&self) -> (Amount, Amount) {
        (self.reserve_a, self.reserve_b)
    }

    /// Reserve of one asset of the pair.
    #[must_use]
    pub fn reserve_of(&self, asset: &AssetId) -> Option<Amount> {
        self.directed_reserves(asset).ok().map(|(r, _)| r)
    }

    #[must_use]
    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    #[must_use]
    pub fn shares_of(&self, account: &AccountId) -> Amount {
        self.shares.get(account).copied().unwrap_or(0)
    }

    /// Reserve product after the last state-changing operation.
    #[must_use]
    pub fn k_last(&self) -> Amount {
        self.k_last
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_shares == 0
    }
}
