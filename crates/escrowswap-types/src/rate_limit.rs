//! Per-account offer rate-limit state.
//!
//! Two limits apply to offer creation:
//! - a **cooldown** between consecutive offers from one account
//! - a **window cap** on offers per rolling window (one day by default)
//!
//! The window rolls over lazily on the first check after it lapses.
//! Nothing runs on a timer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{EscrowSwapError, Result};

/// Rate-limit bookkeeping for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    /// When the account last created an offer.
    pub last_offer_at: Option<DateTime<Utc>>,
    /// Offers created in the current window.
    pub window_count: u32,
    /// Start of the current window.
    pub window_start: DateTime<Utc>,
}

impl RateLimitState {
    /// Fresh state with a window opening at `now`.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_offer_at: None,
            window_count: 0,
            window_start: now,
        }
    }

    /// Open a new window if the current one has lapsed.
    pub fn roll_window(&mut self, now: DateTime<Utc>, window: Duration) {
        let lapsed = self
            .window_start
            .checked_add_signed(window)
            .is_none_or(|end| now >= end);
        if lapsed {
            self.window_start = now;
            self.window_count = 0;
        }
    }

    /// Check whether one more offer may be created at `now`.
    ///
    /// Rolls the window first. Does not record anything.
    ///
    /// # Errors
    /// - `CooldownActive` if `now < last_offer_at + cooldown`
    /// - `DailyLimitReached` if the window is full
    pub fn check(
        &mut self,
        now: DateTime<Utc>,
        cooldown: Duration,
        window: Duration,
        max_per_window: u32,
    ) -> Result<()> {
        self.roll_window(now, window);

        if let Some(last) = self.last_offer_at {
            match last.checked_add_signed(cooldown) {
                Some(ready_at) if now >= ready_at => {}
                Some(ready_at) => {
                    return Err(EscrowSwapError::CooldownActive {
                        remaining_secs: (ready_at - now).num_seconds().max(1),
                    });
                }
                None => {
                    return Err(EscrowSwapError::CooldownActive {
                        remaining_secs: i64::MAX,
                    });
                }
            }
        }

        if self.window_count >= max_per_window {
            return Err(EscrowSwapError::DailyLimitReached {
                limit: max_per_window,
            });
        }
        Ok(())
    }

    /// Record an offer created at `now`.
    pub fn record(&mut self, now: DateTime<Utc>) {
        self.last_offer_at = Some(now);
        self.window_count = self.window_count.saturating_add(1);
    }
}
