//! Configuration for the escrow engine.
//!
//! Loaded from JSON. Every field has a default, so `{"quote_asset": "USDC"}`
//! is a complete configuration.

use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{constants, AccountId, Amount, AssetId, EscrowSwapError, Result};

/// Escrow engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Asset buyers pay offers in.
    pub quote_asset: AssetId,
    /// Minimum seconds between two offers from one seller.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Maximum offers per seller per window.
    #[serde(default = "default_max_offers_per_window")]
    pub max_offers_per_window: u32,
    /// Rate-limit window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Platform fee taken from the quote payment, in basis points.
    #[serde(default)]
    pub platform_fee_bps: u32,
    /// Receives the platform fee. Required when the fee is non-zero.
    #[serde(default)]
    pub fee_collector: Option<AccountId>,
}

fn default_cooldown_secs() -> u64 {
    constants::DEFAULT_OFFER_COOLDOWN_SECS
}

fn default_max_offers_per_window() -> u32 {
    constants::DEFAULT_MAX_OFFERS_PER_WINDOW
}

fn default_window_secs() -> u64 {
    constants::DEFAULT_RATE_LIMIT_WINDOW_SECS
}

impl EscrowConfig {
    /// Default configuration quoting offers in `quote_asset`.
    #[must_use]
    pub fn new(quote_asset: impl Into<AssetId>) -> Self {
        Self {
            quote_asset: quote_asset.into(),
            cooldown_secs: constants::DEFAULT_OFFER_COOLDOWN_SECS,
            max_offers_per_window: constants::DEFAULT_MAX_OFFERS_PER_WINDOW,
            window_secs: constants::DEFAULT_RATE_LIMIT_WINDOW_SECS,
            platform_fee_bps: constants::DEFAULT_PLATFORM_FEE_BPS,
            fee_collector: None,
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `Configuration` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.quote_asset.is_null() {
            return Err(EscrowSwapError::Configuration(
                "quote_asset must not be empty".into(),
            ));
        }
        if self.window_secs == 0 {
            return Err(EscrowSwapError::Configuration(
                "window_secs must be positive".into(),
            ));
        }
        if self.window_secs > constants::MAX_CONFIG_DURATION_SECS
            || self.cooldown_secs > constants::MAX_CONFIG_DURATION_SECS
        {
            return Err(EscrowSwapError::Configuration(format!(
                "durations are capped at {}s",
                constants::MAX_CONFIG_DURATION_SECS
            )));
        }
        if self.platform_fee_bps > constants::MAX_PLATFORM_FEE_BPS {
            return Err(EscrowSwapError::Configuration(format!(
                "platform_fee_bps {} exceeds maximum {}",
                self.platform_fee_bps,
                constants::MAX_PLATFORM_FEE_BPS
            )));
        }
        if self.platform_fee_bps > 0 && self.fee_collector.is_none_or(|c| c.is_zero()) {
            return Err(EscrowSwapError::Configuration(
                "a non-zero platform fee needs a fee_collector".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        duration_from_secs(self.cooldown_secs)
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        duration_from_secs(self.window_secs)
    }

    /// Platform fee owed on a quote payment (floor).
    pub fn platform_fee(&self, price_quote: Amount) -> Result<Amount> {
        price_quote
            .checked_mul(Amount::from(self.platform_fee_bps))
            .map(|scaled| scaled / constants::BPS_DENOMINATOR)
            .ok_or(EscrowSwapError::ArithmeticOverflow("platform fee"))
    }
}

fn duration_from_secs(secs: u64) -> Duration {
    let capped = secs.min(constants::MAX_CONFIG_DURATION_SECS);
    Duration::seconds(i64::try_from(capped).unwrap_or(i64::MAX / 1_000))
}
