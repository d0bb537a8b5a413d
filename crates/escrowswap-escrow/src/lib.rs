//! # escrowswap-escrow
//!
//! Escrowed two-party offers. A seller locks an asset in custody and names
//! the single buyer allowed to take it at a fixed quote price.
//!
//! - [`EscrowEngine`]: create / accept / cancel / reclaim, plus queries
//! - [`RateLimiter`]: per-seller cooldown and window cap
//!
//! ## Offer Flow
//!
//! ```text
//! seller ─create_offer─▶ custody (ACTIVE)
//!                           ├─ accept_offer (buyer)      ─▶ SETTLED
//!                           ├─ cancel_offer (seller)     ─▶ CANCELLED
//!                           └─ reclaim_expired (anyone)  ─▶ EXPIRED
//! ```
//!
//! Every transition moves funds through the [`escrowswap_ledger::Ledger`]
//! and emits an [`escrowswap_types::Observation`].

pub mod engine;
pub mod rate_limiter;

pub use engine::{EscrowEngine, NewOffer};
pub use rate_limiter::RateLimiter;
