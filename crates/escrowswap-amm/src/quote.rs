//! Multi-hop exact-in quoting.

use std::iter::FusedIterator;
use std::sync::Arc;

use dashmap::DashMap;
use escrowswap_types::{Amount, AssetId, EscrowSwapError, PairKey, Result};

use crate::pool::{self, PoolHandle};

/// Lazy quote along a path of assets.
///
/// Yields `amount_in` first, then the output of each consecutive pool,
/// computed only when pulled. Each hop reads the pool's reserves at the
/// moment it is evaluated. After the first `Err` the iterator is exhausted.
pub struct AmountsOut<'r> {
    pools: &'r DashMap<PairKey, PoolHandle>,
    path: Vec<AssetId>,
    hop: usize,
    amount: Amount,
    started: bool,
    done: bool,
}

impl<'r> AmountsOut<'r> {
    /// # Errors
    /// `InvalidPath` if `path` has fewer than two assets.
    pub(crate) fn new(
        pools: &'r DashMap<PairKey, PoolHandle>,
        amount_in: Amount,
        path: &[AssetId],
    ) -> Result<Self> {
        if path.len() < 2 {
            return Err(EscrowSwapError::InvalidPath {
                reason: format!("need at least 2 assets, got {}", path.len()),
            });
        }
        Ok(Self {
            pools,
            path: path.to_vec(),
            hop: 0,
            amount: amount_in,
            started: false,
            done: false,
        })
    }

    fn step(&self) -> Result<Amount> {
        let (asset_in, asset_out) = (&self.path[self.hop], &self.path[self.hop + 1]);
        let pair = PairKey::new(asset_in, asset_out)?;
        let handle = self
            .pools
            .get(&pair)
            .map(|h| Arc::clone(h.value()))
            .ok_or_else(|| EscrowSwapError::PoolNotFound(pair.clone()))?;
        let amount_out = pool::lock(&handle)?.amount_out(asset_in, self.amount)?;
        tracing::debug!(
            pair = %pair,
            amount_in = %self.amount,
            amount_out = %amount_out,
            "Hop quoted"
        );
        Ok(amount_out)
    }
}

impl Iterator for AmountsOut<'_> {
    type Item = Result<Amount>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(Ok(self.amount));
        }
        if self.hop + 1 >= self.path.len() {
            self.done = true;
            return None;
        }
        match self.step() {
            Ok(out) => {
                self.amount = out;
                self.hop += 1;
                Some(Ok(out))
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let hops_left = self.path.len() - 1 - self.hop;
        let pending_input = usize::from(!self.started);
        (pending_input, Some(hops_left + pending_input))
    }
}

impl FusedIterator for AmountsOut<'_> {}
