//! # escrowswap-amm
//!
//! Constant-product (`x · y = k`) liquidity pools with a 0.3% swap fee.
//!
//! - [`LiquidityPool`]: deposit / withdraw / swap against one pair
//! - [`PoolRegistry`]: at most one pool per canonical [`PairKey`], plus
//!   caller-ordered conveniences and multi-hop quoting
//! - [`AmountsOut`]: lazy per-hop quote iterator
//! - [`math`]: integer AMM formulas (`get_amount_out`, `get_amount_in`,
//!   `quote`, `isqrt`)
//!
//! [`PairKey`]: escrowswap_types::PairKey

pub mod math;
pub mod pool;
pub mod quote;
pub mod registry;

pub use pool::{Deposit, LiquidityPool, PoolHandle, Swap, Withdrawal};
pub use quote::AmountsOut;
pub use registry::PoolRegistry;
