//! Observation sinks.
//!
//! Engines emit an [`Observation`] after every successful state change.
//! Emission is fire-and-forget and never fails the operation.

use std::sync::Mutex;

use escrowswap_types::Observation;
use tracing::info;

/// Receives observations in emission order.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &Observation);
}

/// Logs every observation at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &Observation) {
        match event {
            Observation::OfferCreated {
                id,
                seller,
                asset,
                amount,
                price_quote,
                ..
            } => info!(
                offer_id = %id,
                seller = %seller,
                asset = %asset,
                amount = %amount,
                price_quote = %price_quote,
                "OFFER_CREATED"
            ),
            Observation::OfferAccepted {
                id, buyer, amount, ..
            } => info!(offer_id = %id, buyer = %buyer, amount = %amount, "OFFER_ACCEPTED"),
            Observation::OfferCancelled { id, seller } => {
                info!(offer_id = %id, seller = %seller, "OFFER_CANCELLED");
            }
            Observation::OfferExpired { id, seller } => {
                info!(offer_id = %id, seller = %seller, "OFFER_EXPIRED");
            }
            Observation::PoolSynced {
                pool,
                pair,
                reserve_a,
                reserve_b,
            } => info!(
                pool = %pool,
                pair = %pair,
                reserve_a = %reserve_a,
                reserve_b = %reserve_b,
                "POOL_SYNCED"
            ),
        }
    }
}

/// Buffers observations in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Observation>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    #[must_use]
    pub fn events(&self) -> Vec<Observation> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names of everything emitted so far, e.g. `OFFER_CREATED`.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .map(|e| e.iter().map(Observation::name).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &Observation) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &Observation) {}
}
