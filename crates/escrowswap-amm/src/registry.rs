//! Pair registry: at most one pool per canonical pair.
//!
//! Lookups are lock-free reads on a `DashMap`; creation additionally takes
//! the write side of the creation-order list, so [`PoolRegistry::all_pairs`]
//! always reflects the order in which pools were created.

use std::sync::{Arc, Mutex, RwLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use escrowswap_ledger::{EventSink, Ledger, TracingSink};
use escrowswap_types::{AccountId, Amount, AssetId, EscrowSwapError, PairKey, Result};

use crate::pool::{self, Deposit, LiquidityPool, PoolHandle, Swap, Withdrawal};
use crate::quote::AmountsOut;

/// Registry of constant-product pools over one ledger.
pub struct PoolRegistry<L: Ledger + ?Sized> {
    ledger: Arc<L>,
    sink: Arc<dyn EventSink>,
    pools: DashMap<PairKey, PoolHandle>,
    order: RwLock<Vec<PairKey>>,
}

impl<L: Ledger + ?Sized> PoolRegistry<L> {
    #[must_use]
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            ledger,
            sink: Arc::new(TracingSink),
            pools: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Sink handed to every pool created after this call.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    #[must_use]
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Create the pool for `{x, y}`.
    ///
    /// # Errors
    /// `IdenticalAddresses`, `ZeroAddress`, or `PairExists`.
    pub fn create_pair(&self, x: &AssetId, y: &AssetId) -> Result<PoolHandle> {
        let pair = PairKey::new(x, y)?;
        self.create_with(&pair, |_| Ok(()))?
            .map(|(handle, ())| handle)
            .ok_or(EscrowSwapError::PairExists(pair))
    }

    /// Stage a new pool for `pair`, run `init` on it, and register it only
    /// if `init` succeeds. `Ok(None)` if the pair already exists.
    fn create_with<T>(
        &self,
        pair: &PairKey,
        init: impl FnOnce(&mut LiquidityPool) -> Result<T>,
    ) -> Result<Option<(PoolHandle, T)>> {
        let mut order = self
            .order
            .write()
            .map_err(|_| EscrowSwapError::Internal("registry lock poisoned".into()))?;
        let Entry::Vacant(slot) = self.pools.entry(pair.clone()) else {
            return Ok(None);
        };
        let mut staged = LiquidityPool::new(pair.clone(), Arc::clone(&self.sink));
        let out = init(&mut staged)?;

        let handle: PoolHandle = Arc::new(Mutex::new(staged));
        slot.insert(Arc::clone(&handle));
        tracing::info!(
            pair = %pair,
            pool = %pair.pool_id(),
            index = order.len(),
            "Pair created"
        );
        order.push(pair.clone());
        Ok(Some((handle, out)))
    }

    /// The pool for `{x, y}`, creating it if needed.
    pub fn get_or_create_pair(&self, x: &AssetId, y: &AssetId) -> Result<PoolHandle> {
        if let Some(handle) = self.get_pair(x, y) {
            return Ok(handle);
        }
        match self.create_pair(x, y) {
            Err(EscrowSwapError::PairExists(pair)) => self
                .pools
                .get(&pair)
                .map(|h| Arc::clone(h.value()))
                .ok_or(EscrowSwapError::PoolNotFound(pair)),
            other => other,
        }
    }

    /// The pool for `{x, y}` in either order, if it exists.
    #[must_use]
    pub fn get_pair(&self, x: &AssetId, y: &AssetId) -> Option<PoolHandle> {
        let pair = PairKey::new(x, y).ok()?;
        self.pools.get(&pair).map(|h| Arc::clone(h.value()))
    }

    fn existing(&self, x: &AssetId, y: &AssetId) -> Result<PoolHandle> {
        let pair = PairKey::new(x, y)?;
        self.pools
            .get(&pair)
            .map(|h| Arc::clone(h.value()))
            .ok_or(EscrowSwapError::PoolNotFound(pair))
    }

    /// Every pair, in creation order.
    pub fn all_pairs(&self) -> Result<Vec<PairKey>> {
        self.order
            .read()
            .map(|order| order.clone())
            .map_err(|_| EscrowSwapError::Internal("registry lock poisoned".into()))
    }

    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pools.len()
    }

    /// Deposit into the `{x, y}` pool, creating it if needed.
    ///
    /// Amounts are given and returned in the caller's `(x, y)` order:
    /// `amount_a` of the result is the `x` amount. A pool created by this
    /// call is registered only if its first deposit succeeds.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &self,
        provider: AccountId,
        x: &AssetId,
        y: &AssetId,
        x_desired: Amount,
        y_desired: Amount,
        x_min: Amount,
        y_min: Amount,
    ) -> Result<Deposit> {
        let pair = PairKey::new(x, y)?;
        let flipped = pair.asset_a() != x;
        let (a_desired, b_desired, a_min, b_min) = if flipped {
            (y_desired, x_desired, y_min, x_min)
        } else {
            (x_desired, y_desired, x_min, y_min)
        };
        let deposit = |pool: &mut LiquidityPool| {
            pool.deposit(&*self.ledger, provider, a_desired, b_desired, a_min, b_min)
        };

        let handle = match self.get_pair(x, y) {
            Some(handle) => handle,
            None => match self.create_with(&pair, &deposit)? {
                Some((_, dep)) => return Ok(Self::caller_order(dep, flipped)),
                // Lost a creation race; the pool exists now.
                None => self.existing(x, y)?,
            },
        };
        let mut pool = pool::lock(&handle)?;
        let dep = deposit(&mut *pool)?;
        Ok(Self::caller_order(dep, flipped))
    }

    fn caller_order(dep: Deposit, flipped: bool) -> Deposit {
        if flipped {
            Deposit {
                amount_a: dep.amount_b,
                amount_b: dep.amount_a,
                shares: dep.shares,
            }
        } else {
            dep
        }
    }

    /// Burn shares of the `{x, y}` pool; amounts come back in `(x, y)`
    /// order.
    ///
    /// # Errors
    /// `PoolNotFound` plus everything [`LiquidityPool::withdraw`] returns.
    pub fn remove_liquidity(
        &self,
        provider: AccountId,
        x: &AssetId,
        y: &AssetId,
        shares: Amount,
    ) -> Result<Withdrawal> {
        let handle = self.existing(x, y)?;
        let mut pool = pool::lock(&handle)?;
        let out = pool.withdraw(&*self.ledger, provider, shares)?;
        if pool.pair().asset_a() == x {
            Ok(out)
        } else {
            Ok(Withdrawal {
                amount_a: out.amount_b,
                amount_b: out.amount_a,
            })
        }
    }

    /// Single-hop exact-in swap of `asset_in` for `asset_out`.
    ///
    /// # Errors
    /// `PoolNotFound` plus everything [`LiquidityPool::swap`] returns.
    pub fn swap_exact_in(
        &self,
        trader: AccountId,
        asset_in: &AssetId,
        asset_out: &AssetId,
        amount_in: Amount,
        amount_out_min: Amount,
    ) -> Result<Swap> {
        let handle = self.existing(asset_in, asset_out)?;
        let mut pool = pool::lock(&handle)?;
        pool.swap(&*self.ledger, trader, asset_in, amount_in, amount_out_min)
    }

    /// Lazy quote of `amount_in` along `path`; see [`AmountsOut`].
    ///
    /// # Errors
    /// `InvalidPath` if `path` has fewer than two assets.
    pub fn get_amounts_out(&self, amount_in: Amount, path: &[AssetId]) -> Result<AmountsOut<'_>> {
        AmountsOut::new(&self.pools, amount_in, path)
    }
}
