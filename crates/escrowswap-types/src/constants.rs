//! System-wide constants for EscrowSwap.

/// Default minimum seconds between two offers from one account.
pub const DEFAULT_OFFER_COOLDOWN_SECS: u64 = 10;

/// Default maximum offers per account per rate-limit window.
pub const DEFAULT_MAX_OFFERS_PER_WINDOW: u32 = 10;

/// Default rate-limit window length in seconds (one day).
pub const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 86_400;

/// Default platform fee on accepted offers, in basis points.
pub const DEFAULT_PLATFORM_FEE_BPS: u32 = 0;

/// Upper bound for the platform fee (10%).
pub const MAX_PLATFORM_FEE_BPS: u32 = 1_000;

/// Basis-point denominator (10 000 = 100%).
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Longest duration accepted anywhere in configuration (about 100 years).
pub const MAX_CONFIG_DURATION_SECS: u64 = 100 * 365 * 86_400;

/// Shares permanently locked to the burn sink on a pool's first deposit.
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

/// Swap fee numerator: 997 / 1000 of the input is priced (0.3% fee).
pub const SWAP_FEE_NUMERATOR: u128 = 997;

/// Swap fee denominator.
pub const SWAP_FEE_DENOMINATOR: u128 = 1_000;

/// Domain tag for escrow custody accounts; each engine appends its own
/// instance id.
pub const ESCROW_CUSTODY_DOMAIN: &[u8] = b"escrow:custody";
