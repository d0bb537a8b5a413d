//! # escrowswap-types
//!
//! Shared types, errors, and configuration for **EscrowSwap**.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`AssetId`], [`OfferId`], [`PairKey`], [`PoolId`], [`Amount`]
//! - **Offer model**: [`Offer`], [`OfferStatus`]
//! - **Rate limiting**: [`RateLimitState`]
//! - **Observations**: [`Observation`]
//! - **Configuration**: [`EscrowConfig`]
//! - **Errors**: [`EscrowSwapError`] with `ES_ERR_` prefix codes, [`ErrorKind`]
//! - **Constants**: defaults and AMM parameters

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod offer;
pub mod rate_limit;

// Re-export all primary types at crate root for ergonomic imports:
//   use escrowswap_types::{Offer, OfferStatus, AccountId, ...};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use offer::*;
pub use rate_limit::*;

// Constants are accessed via `escrowswap_types::constants::FOO`
// (not re-exported to avoid name collisions).
