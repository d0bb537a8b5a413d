//! Per-account offer rate limiter.
//!
//! Each account's [`RateLimitState`] lives in its own `DashMap` entry. The
//! check, the guarded action, and the record all run under that entry's
//! guard, so two concurrent creations by one seller cannot both slip
//! through the cooldown.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use escrowswap_types::{AccountId, RateLimitState, Result};

/// Cooldown plus per-window cap, keyed by account.
#[derive(Debug)]
pub struct RateLimiter {
    states: DashMap<AccountId, RateLimitState>,
    cooldown: Duration,
    window: Duration,
    max_per_window: u32,
}

impl RateLimiter {
    #[must_use]
    pub fn new(cooldown: Duration, window: Duration, max_per_window: u32) -> Self {
        Self {
            states: DashMap::new(),
            cooldown,
            window,
            max_per_window,
        }
    }

    /// Run `action` if `account` is within its limits at `now`.
    ///
    /// The attempt is recorded only if `action` succeeds; a failed action
    /// consumes neither cooldown nor window quota.
    ///
    /// # Errors
    /// `CooldownActive` or `DailyLimitReached` from the limit check, or
    /// whatever `action` returns.
    pub fn admit<T>(
        &self,
        account: AccountId,
        now: DateTime<Utc>,
        action: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let mut state = self
            .states
            .entry(account)
            .or_insert_with(|| RateLimitState::new(now));
        state.check(now, self.cooldown, self.window, self.max_per_window)?;
        let out = action()?;
        state.record(now);
        Ok(out)
    }

    /// Snapshot of an account's state, if it ever created an offer.
    #[must_use]
    pub fn state(&self, account: &AccountId) -> Option<RateLimitState> {
        self.states.get(account).map(|s| s.value().clone())
    }

    /// Number of accounts with recorded state.
    #[must_use]
    pub fn tracked_accounts(&self) -> usize {
        self.states.len()
    }
}

#[cfg(test)]
mod tests {
    use escrowswap_types::EscrowSwapError;

    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn limiter() -> RateLimiter {
        RateLimiter::new(Duration::seconds(10), Duration::days(1), 3)
    }

    #[test]
    fn admits_and_records() {
        let rl = limiter();
        let alice = AccountId::new();
        assert_eq!(rl.admit(alice, t0(), || Ok(7)).unwrap(), 7);
        let state = rl.state(&alice).unwrap();
        assert_eq!(state.window_count, 1);
        assert_eq!(state.last_offer_at, Some(t0()));
    }

    #[test]
    fn cooldown_blocks_second_attempt() {
        let rl = limiter();
        let alice = AccountId::new();
        rl.admit(alice, t0(), || Ok(())).unwrap();
        let err = rl
            .admit(alice, t0() + Duration::seconds(5), || Ok(()))
            .unwrap_err();
        assert!(matches!(
            err,
            EscrowSwapError::CooldownActive { remaining_secs: 5 }
        ));
        rl.admit(alice, t0() + Duration::seconds(10), || Ok(()))
            .unwrap();
    }

    #[test]
    fn failed_action_is_not_recorded() {
        let rl = limiter();
        let alice = AccountId::new();
        let err = rl
            .admit::<()>(alice, t0(), || Err(EscrowSwapError::ZeroAddress))
            .unwrap_err();
        assert!(matches!(err, EscrowSwapError::ZeroAddress));
        let state = rl.state(&alice).unwrap();
        assert_eq!(state.window_count, 0);
        assert!(state.last_offer_at.is_none());
        // No cooldown was started.
        rl.admit(alice, t0(), || Ok(())).unwrap();
    }

    #[test]
    fn window_cap_then_rollover() {
        let rl = limiter();
        let alice = AccountId::new();
        for i in 0..3 {
            rl.admit(alice, t0() + Duration::seconds(10 * i), || Ok(()))
                .unwrap();
        }
        let err = rl
            .admit(alice, t0() + Duration::seconds(60), || Ok(()))
            .unwrap_err();
        assert!(matches!(err, EscrowSwapError::DailyLimitReached { limit: 3 }));

        rl.admit(alice, t0() + Duration::days(1), || Ok(())).unwrap();
        assert_eq!(rl.state(&alice).unwrap().window_count, 1);
    }

    #[test]
    fn accounts_are_independent() {
        let rl = limiter();
        let (alice, bob) = (AccountId::new(), AccountId::new());
        rl.admit(alice, t0(), || Ok(())).unwrap();
        rl.admit(bob, t0(), || Ok(())).unwrap();
        assert_eq!(rl.tracked_accounts(), 2);
    }
}
