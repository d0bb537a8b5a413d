//! Observations emitted for external indexers and UIs.
//!
//! Every escrow lifecycle transition and every pool reserve sync produces an
//! [`Observation`]. Observations form an append-only feed; internal
//! correctness never depends on them being delivered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, AssetId, OfferId, PairKey, PoolId};

/// An observable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observation {
    /// A seller locked funds and opened an offer.
    OfferCreated {
        id: OfferId,
        seller: AccountId,
        buyer: AccountId,
        asset: AssetId,
        amount: Amount,
        price_quote: Amount,
        expires_at: Option<DateTime<Utc>>,
    },
    /// The buyer paid and the escrowed asset was released to them.
    OfferAccepted {
        id: OfferId,
        seller: AccountId,
        buyer: AccountId,
        amount: Amount,
        price_quote: Amount,
    },
    /// The seller withdrew the offer.
    OfferCancelled { id: OfferId, seller: AccountId },
    /// The deadline passed and the funds went back to the seller.
    OfferExpired { id: OfferId, seller: AccountId },
    /// A pool's reserves were re-read from its custody balances.
    PoolSynced {
        pool: PoolId,
        pair: PairKey,
        reserve_a: Amount,
        reserve_b: Amount,
    },
}

impl Observation {
    /// Short stable name, used as the log message.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::OfferCreated { .. } => "OFFER_CREATED",
            Self::OfferAccepted { .. } => "OFFER_ACCEPTED",
            Self::OfferCancelled { .. } => "OFFER_CANCELLED",
            Self::OfferExpired { .. } => "OFFER_EXPIRED",
            Self::PoolSynced { .. } => "POOL_SYNCED",
        }
    }

    /// The offer this observation is about, if any.
    #[must_use]
    pub fn offer_id(&self) -> Option<OfferId> {
        match self {
            Self::OfferCreated { id, .. }
            | Self::OfferAccepted { id, .. }
            | Self::OfferCancelled { id, .. }
            | Self::OfferExpired { id, .. } => Some(*id),
            Self::PoolSynced { .. } => None,
        }
    }
}

impl std::fmt::Display for Observation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
