//! # escrowswap-ledger
//!
//! The environment EscrowSwap runs against: a balance ledger, a clock, and
//! a sink for observations.
//!
//! - [`Ledger`]: transfer and balance interface, with an all-or-nothing
//!   [`Ledger::transfer_all`] for multi-leg settlement
//! - [`InMemoryLedger`]: process-local ledger with [`SupplyConservation`]
//! - [`Clock`]: [`SystemClock`] for production, [`ManualClock`] for tests
//! - [`EventSink`]: [`TracingSink`], [`MemorySink`], [`NullSink`]
//!
//! ## Custody model
//!
//! ```text
//! seller ──create──▶ escrow custody ──accept──▶ buyer
//!                          │
//!                          └──cancel / reclaim──▶ seller
//!
//! provider ──deposit──▶ pool custody ──withdraw / swap──▶ provider / trader
//! ```
//!
//! Custody accounts are plain ledger accounts derived from a domain tag, so
//! supply is conserved by construction.

pub mod clock;
pub mod ledger;
pub mod memory;
pub mod sink;
pub mod supply;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{Ledger, Transfer};
pub use memory::InMemoryLedger;
pub use sink::{EventSink, MemorySink, NullSink, TracingSink};
pub use supply::SupplyConservation;
