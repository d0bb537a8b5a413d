//! # Offer: an escrowed two-party trade
//!
//! A seller locks `amount` of `asset` in escrow custody and names the one
//! buyer allowed to take it for `price_quote` units of the quote asset.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  accept (buyer)      ┌─────────┐
//!   │ ACTIVE ├─────────────────────▶│ SETTLED │
//!   └─┬────┬─┘                      └─────────┘
//!     │    │ cancel (seller)        ┌───────────┐
//!     │    └───────────────────────▶│ CANCELLED │
//!     │                             └───────────┘
//!     │ reclaim (anyone, past deadline)
//!     ▼
//!   ┌─────────┐
//!   │ EXPIRED │
//!   └─────────┘
//! ```
//!
//! Terminal states are mutually exclusive and irreversible. An offer is
//! never deleted; it stays behind as a historical record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Amount, AssetId, EscrowSwapError, OfferId, Result};

/// The lifecycle state of an [`Offer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OfferStatus {
    /// Funds are in custody. The buyer may accept.
    Active,
    /// The buyer paid and received the asset.
    Settled,
    /// The seller withdrew the offer.
    Cancelled,
    /// The deadline passed and the funds were returned to the seller.
    Expired,
}

impl OfferStatus {
    /// Can an offer in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Settled | Self::Cancelled | Self::Expired)
        )
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// An escrowed offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    /// Account whose funds are in custody.
    pub seller: AccountId,
    /// The only account allowed to accept. Fixed at creation.
    pub buyer: AccountId,
    /// Asset being sold.
    pub asset: AssetId,
    /// Amount of `asset` held in custody while active.
    pub amount: Amount,
    /// Price in quote-asset base units.
    pub price_quote: Amount,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
    /// `None` means the offer never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Offer {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == OfferStatus::Active
    }

    /// `true` once `now` is strictly past the deadline.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| now > deadline)
    }

    /// Fails with `OfferNotActive` unless the offer is still open.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(EscrowSwapError::OfferNotActive {
                offer_id: self.id,
                status: self.status,
            })
        }
    }

    /// Move to a terminal state.
    ///
    /// # Errors
    /// Returns `OfferNotActive` if the offer is already terminal.
    pub fn transition(&mut self, target: OfferStatus) -> Result<()> {
        if !self.status.can_transition_to(target) {
            return Err(EscrowSwapError::OfferNotActive {
                offer_id: self.id,
                status: self.status,
            });
        }
        self.status = target;
        Ok(())
    }
}

/// Dummy offer for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Offer {
    pub fn dummy(id: u64, asset: &str, amount: Amount, price_quote: Amount) -> Self {
        Self {
            id: OfferId(id),
            seller: AccountId::new(),
            buyer: AccountId::new(),
            asset: AssetId::new(asset),
            amount,
            price_quote,
            status: OfferStatus::Active,
            created_at: Utc::now(),
            expires_at: None,
        }
    }
}
