//! Escrow engine: offer creation, acceptance, cancellation and expiry.
//!
//! While an offer is ACTIVE its `amount` sits in the engine's custody
//! account on the ledger. Every mutating call on one offer holds that
//! offer's map entry for the whole check, transfer, commit sequence:
//!
//! ```text
//! lock entry → checks → stage terminal status → ledger batch → commit
//!                                                    │
//!                                    error ──────────┴──▶ entry untouched
//! ```
//!
//! Two racing calls on the same offer are therefore linearized: exactly one
//! wins and the other sees `OfferNotActive`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use escrowswap_ledger::{Clock, EventSink, Ledger, TracingSink, Transfer};
use escrowswap_types::{
    constants, AccountId, Amount, AssetId, EscrowConfig, EscrowSwapError, Observation, Offer,
    OfferId, OfferStatus, RateLimitState, Result,
};

use crate::rate_limiter::RateLimiter;

/// Parameters of a new offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOffer {
    pub seller: AccountId,
    /// The only account allowed to accept.
    pub buyer: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
    /// Price in quote-asset base units.
    pub price_quote: Amount,
    /// Time to live from creation. `None` never expires.
    pub ttl: Option<Duration>,
}

impl NewOffer {
    #[must_use]
    pub fn new(
        seller: AccountId,
        buyer: AccountId,
        asset: impl Into<AssetId>,
        amount: Amount,
        price_quote: Amount,
    ) -> Self {
        Self {
            seller,
            buyer,
            asset: asset.into(),
            amount,
            price_quote,
            ttl: None,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Escrowed two-party offers over a [`Ledger`].
pub struct EscrowEngine<L: Ledger + ?Sized, C: Clock + ?Sized> {
    ledger: Arc<L>,
    clock: Arc<C>,
    sink: Arc<dyn EventSink>,
    config: EscrowConfig,
    custody: AccountId,
    offers: DashMap<OfferId, Offer>,
    /// Last allocated offer id; ids start at 1.
    last_id: AtomicU64,
    rate_limiter: RateLimiter,
}

impl<L: Ledger + ?Sized, C: Clock + ?Sized> EscrowEngine<L, C> {
    /// Create an engine with a validated configuration.
    ///
    /// Observations go to a [`TracingSink`] until [`Self::with_sink`] is
    /// called.
    pub fn new(config: EscrowConfig, ledger: Arc<L>, clock: Arc<C>) -> Result<Self> {
        config.validate()?;
        let rate_limiter = RateLimiter::new(
            config.cooldown(),
            config.window(),
            config.max_offers_per_window,
        );
        Ok(Self {
            ledger,
            clock,
            sink: Arc::new(TracingSink),
            config,
            custody: Self::fresh_custody(),
            offers: DashMap::new(),
            last_id: AtomicU64::new(0),
            rate_limiter,
        })
    }

    /// Custody account unique to one engine instance.
    fn fresh_custody() -> AccountId {
        let instance = AccountId::new();
        let mut domain = constants::ESCROW_CUSTODY_DOMAIN.to_vec();
        domain.extend_from_slice(instance.0.as_bytes());
        AccountId::derived(&domain)
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Lock `amount` of `asset` from the seller and open an offer.
    ///
    /// # Errors
    /// - `ZeroAddress` / `InvalidAsset` for a null or unlisted asset
    /// - `ZeroAmount` for a zero amount or price
    /// - `ZeroAddress` / `BuyerIsSeller` for bad parties
    /// - `InvalidExpiry` for a non-positive ttl
    /// - `CooldownActive` / `DailyLimitReached` from the rate limiter
    /// - `InsufficientBalance` if the seller cannot fund the offer
    ///
    /// On any error no offer is stored, no id is consumed and the seller's
    /// rate-limit state is unchanged.
    pub fn create_offer(&self, req: NewOffer) -> Result<OfferId> {
        let now = self.clock.now();
        let expires_at = self
            .validate_new_offer(&req, now)
            .inspect_err(|err| Self::log_rejection("create", None, req.seller, err))?;

        let offer = self
            .rate_limiter
            .admit(req.seller, now, || {
                self.ledger
                    .transfer(req.seller, self.custody, &req.asset, req.amount)?;
                let id = OfferId(self.last_id.fetch_add(1, Ordering::Relaxed)).next();
                let offer = Offer {
                    id,
                    seller: req.seller,
                    buyer: req.buyer,
                    asset: req.asset.clone(),
                    amount: req.amount,
                    price_quote: req.price_quote,
                    status: OfferStatus::Active,
                    created_at: now,
                    expires_at,
                };
                self.offers.insert(id, offer.clone());
                Ok(offer)
            })
            .inspect_err(|err| Self::log_rejection("create", None, req.seller, err))?;

        tracing::debug!(
            offer_id = %offer.id,
            seller = %offer.seller,
            custody = %self.custody,
            "Offer funds moved to custody"
        );
        self.sink.emit(&Observation::OfferCreated {
            id: offer.id,
            seller: offer.seller,
            buyer: offer.buyer,
            asset: offer.asset,
            amount: offer.amount,
            price_quote: offer.price_quote,
            expires_at: offer.expires_at,
        });
        Ok(offer.id)
    }

    /// Settle an offer: the buyer pays the seller and receives the asset.
    ///
    /// # Errors
    /// Checked in order: `OfferNotFound`, `OfferNotActive`,
    /// `NotDesignatedBuyer`, `OfferExpired`. A failing transfer leaves the
    /// offer ACTIVE and every balance unchanged.
    pub fn accept_offer(&self, offer_id: OfferId, caller: AccountId) -> Result<()> {
        let now = self.clock.now();
        let settled = self
            .settle(offer_id, caller, now)
            .inspect_err(|err| Self::log_rejection("accept", Some(offer_id), caller, err))?;

        self.sink.emit(&Observation::OfferAccepted {
            id: settled.id,
            seller: settled.seller,
            buyer: settled.buyer,
            amount: settled.amount,
            price_quote: settled.price_quote,
        });
        Ok(())
    }

    fn settle(&self, offer_id: OfferId, caller: AccountId, now: DateTime<Utc>) -> Result<Offer> {
        let mut entry = self
            .offers
            .get_mut(&offer_id)
            .ok_or(EscrowSwapError::OfferNotFound(offer_id))?;
        entry.ensure_active()?;
        if entry.buyer != caller {
            return Err(EscrowSwapError::NotDesignatedBuyer { offer_id, caller });
        }
        if entry.is_expired_at(now) {
            return Err(EscrowSwapError::OfferExpired(offer_id));
        }

        let mut staged = entry.value().clone();
        staged.transition(OfferStatus::Settled)?;
        self.ledger.transfer_all(&self.settlement_legs(&staged)?)?;
        *entry = staged.clone();
        Ok(staged)
    }

    /// Quote payment (less any platform fee) to the seller, fee to the
    /// collector, escrowed asset to the buyer.
    fn settlement_legs(&self, offer: &Offer) -> Result<Vec<Transfer>> {
        let quote = &self.config.quote_asset;
        let mut legs = Vec::with_capacity(3);
        let fee = self.config.platform_fee(offer.price_quote)?;
        match self.config.fee_collector {
            Some(collector) if fee > 0 => {
                legs.push(Transfer::new(
                    offer.buyer,
                    offer.seller,
                    quote,
                    offer.price_quote - fee,
                ));
                legs.push(Transfer::new(offer.buyer, collector, quote, fee));
            }
            _ => legs.push(Transfer::new(
                offer.buyer,
                offer.seller,
                quote,
                offer.price_quote,
            )),
        }
        legs.push(Transfer::new(
            self.custody,
            offer.buyer,
            &offer.asset,
            offer.amount,
        ));
        Ok(legs)
    }

    /// Withdraw an active offer and return the funds to the seller.
    ///
    /// # Errors
    /// `OfferNotFound`, `OfferNotActive`, `NotSeller`.
    pub fn cancel_offer(&self, offer_id: OfferId, caller: AccountId) -> Result<()> {
        let cancelled = self
            .release(offer_id, OfferStatus::Cancelled, |offer| {
                if offer.seller == caller {
                    Ok(())
                } else {
                    Err(EscrowSwapError::NotSeller { offer_id, caller })
                }
            })
            .inspect_err(|err| Self::log_rejection("cancel", Some(offer_id), caller, err))?;

        self.sink.emit(&Observation::OfferCancelled {
            id: cancelled.id,
            seller: cancelled.seller,
        });
        Ok(())
    }

    /// Return the funds of an offer whose deadline has passed.
    ///
    /// Anyone may call this; the funds always go to the seller.
    ///
    /// # Errors
    /// `OfferNotFound`, `OfferNotActive`, `NotYetExpired` if the offer has
    /// no deadline or `now` is not past it.
    pub fn reclaim_expired(&self, offer_id: OfferId, caller: AccountId) -> Result<()> {
        let now = self.clock.now();
        let expired = self
            .release(offer_id, OfferStatus::Expired, |offer| {
                if offer.is_expired_at(now) {
                    Ok(())
                } else {
                    Err(EscrowSwapError::NotYetExpired(offer_id))
                }
            })
            .inspect_err(|err| Self::log_rejection("reclaim", Some(offer_id), caller, err))?;

        tracing::debug!(offer_id = %offer_id, caller = %caller, "Expired offer reclaimed");
        self.sink.emit(&Observation::OfferExpired {
            id: expired.id,
            seller: expired.seller,
        });
        Ok(())
    }

    /// Custody → seller under the entry guard, then commit `target`.
    fn release(
        &self,
        offer_id: OfferId,
        target: OfferStatus,
        authorize: impl FnOnce(&Offer) -> Result<()>,
    ) -> Result<Offer> {
        let mut entry = self
            .offers
            .get_mut(&offer_id)
            .ok_or(EscrowSwapError::OfferNotFound(offer_id))?;
        entry.ensure_active()?;
        authorize(&entry)?;

        let mut staged = entry.value().clone();
        staged.transition(target)?;
        self.ledger
            .transfer(self.custody, staged.seller, &staged.asset, staged.amount)?;
        *entry = staged.clone();
        Ok(staged)
    }

    fn validate_new_offer(
        &self,
        req: &NewOffer,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        if req.asset.is_null() {
            return Err(EscrowSwapError::ZeroAddress);
        }
        if !self.ledger.is_listed(&req.asset) {
            return Err(EscrowSwapError::InvalidAsset(req.asset.clone()));
        }
        if req.amount == 0 {
            return Err(EscrowSwapError::ZeroAmount { field: "amount" });
        }
        if req.price_quote == 0 {
            return Err(EscrowSwapError::ZeroAmount {
                field: "price_quote",
            });
        }
        if req.seller.is_zero() || req.buyer.is_zero() {
            return Err(EscrowSwapError::ZeroAddress);
        }
        if req.buyer == req.seller {
            return Err(EscrowSwapError::BuyerIsSeller(req.seller));
        }
        let Some(ttl) = req.ttl else {
            return Ok(None);
        };
        if ttl <= Duration::zero() {
            return Err(EscrowSwapError::InvalidExpiry {
                reason: format!("ttl must be positive, got {}s", ttl.num_seconds()),
            });
        }
        now.checked_add_signed(ttl)
            .map(Some)
            .ok_or_else(|| EscrowSwapError::InvalidExpiry {
                reason: "deadline out of range".into(),
            })
    }

    fn log_rejection(
        op: &'static str,
        offer_id: Option<OfferId>,
        caller: AccountId,
        err: &EscrowSwapError,
    ) {
        if err.is_fatal() {
            tracing::error!(
                op,
                offer_id = ?offer_id,
                caller = %caller,
                error = %err,
                "Escrow invariant failure"
            );
        } else {
            tracing::warn!(
                op,
                offer_id = ?offer_id,
                caller = %caller,
                error = %err,
                "Escrow call rejected"
            );
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Snapshot of one offer, in any status.
    #[must_use]
    pub fn offer(&self, offer_id: OfferId) -> Option<Offer> {
        self.offers.get(&offer_id).map(|o| o.value().clone())
    }

    /// Every offer the seller ever created, oldest first.
    #[must_use]
    pub fn offers_by_seller(&self, seller: &AccountId) -> Vec<Offer> {
        self.collect_sorted(|o| o.seller == *seller)
    }

    /// Every ACTIVE offer, oldest first.
    #[must_use]
    pub fn active_offers(&self) -> Vec<Offer> {
        self.collect_sorted(Offer::is_active)
    }

    fn collect_sorted(&self, keep: impl Fn(&Offer) -> bool) -> Vec<Offer> {
        let mut out: Vec<Offer> = self
            .offers
            .iter()
            .filter(|o| keep(o.value()))
            .map(|o| o.value().clone())
            .collect();
        out.sort_by_key(|o| o.id);
        out
    }

    /// Number of offers ever created.
    #[must_use]
    pub fn offer_count(&self) -> usize {
        self.offers.len()
    }

    #[must_use]
    pub fn rate_limit_state(&self, account: &AccountId) -> Option<RateLimitState> {
        self.rate_limiter.state(account)
    }

    /// Ledger account holding the funds of active offers.
    #[must_use]
    pub fn custody_account(&self) -> AccountId {
        self.custody
    }

    #[must_use]
    pub fn config(&self) -> &EscrowConfig {
        &self.config
    }

    /// Check that custody holds exactly the funds of active offers in
    /// `asset`.
    ///
    /// # Errors
    /// `InvariantViolation` on any mismatch.
    pub fn verify_custody(&self, asset: &AssetId) -> Result<()> {
        let locked = self
            .offers
            .iter()
            .filter(|o| o.is_active() && o.asset == *asset)
            .try_fold(0, |acc: Amount, o| acc.checked_add(o.amount))
            .ok_or(EscrowSwapError::ArithmeticOverflow("custody total"))?;
        let held = self.ledger.try_balance_of(self.custody, asset)?;
        if held != locked {
            tracing::error!(
                asset = %asset,
                held = %held,
                locked = %locked,
                "Escrow custody mismatch"
            );
            return Err(EscrowSwapError::InvariantViolation {
                reason: format!("custody holds {held} {asset}, active offers lock {locked}"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use escrowswap_ledger::{InMemoryLedger, ManualClock, MemorySink};

    use super::*;

    struct Fixture {
        engine: EscrowEngine<InMemoryLedger, ManualClock>,
        ledger: Arc<InMemoryLedger>,
        clock: Arc<ManualClock>,
        sink: Arc<MemorySink>,
        seller: AccountId,
        buyer: AccountId,
    }

    fn weth() -> AssetId {
        AssetId::new("WETH")
    }

    fn usdc() -> AssetId {
        AssetId::new("USDC")
    }

    fn fixture_with(config: EscrowConfig) -> Fixture {
        let ledger = Arc::new(InMemoryLedger::new());
        let clock = Arc::new(ManualClock::at_epoch());
        clock.advance_secs(1_700_000_000);
        let sink = Arc::new(MemorySink::new());
        let engine = EscrowEngine::new(config, Arc::clone(&ledger), Arc::clone(&clock))
            .unwrap()
            .with_sink(sink.clone());
        let (seller, buyer) = (AccountId::new(), AccountId::new());
        ledger.mint(seller, &weth(), 10_000).unwrap();
        ledger.mint(buyer, &usdc(), 1_000_000).unwrap();
        Fixture {
            engine,
            ledger,
            clock,
            sink,
            seller,
            buyer,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(EscrowConfig::new("USDC"))
    }

    fn new_offer(f: &Fixture, amount: Amount, price: Amount) -> NewOffer {
        NewOffer::new(f.seller, f.buyer, "WETH", amount, price)
    }

    #[test]
    fn create_locks_funds_and_assigns_first_id() {
        let f = fixture();
        let id = f.engine.create_offer(new_offer(&f, 100, 5_000)).unwrap();
        assert_eq!(id, OfferId(1));
        assert_eq!(f.ledger.balance_of(f.seller, &weth()), 9_900);
        assert_eq!(
            f.ledger.balance_of(f.engine.custody_account(), &weth()),
            100
        );
        let offer = f.engine.offer(id).unwrap();
        assert_eq!(offer.status, OfferStatus::Active);
        assert_eq!(offer.expires_at, None);
        assert_eq!(f.sink.names(), vec!["OFFER_CREATED"]);
        f.engine.verify_custody(&weth()).unwrap();
    }

    #[test]
    fn create_validation_errors() {
        let f = fixture();
        let cases = [
            (
                NewOffer::new(f.seller, f.buyer, "", 1, 1),
                "ZeroAddress",
            ),
            (
                NewOffer::new(f.seller, f.buyer, "DOGE", 1, 1),
                "InvalidAsset",
            ),
            (new_offer(&f, 0, 1), "ZeroAmount"),
            (new_offer(&f, 1, 0), "ZeroAmount"),
            (
                NewOffer::new(AccountId::ZERO, f.buyer, "WETH", 1, 1),
                "ZeroAddress",
            ),
            (
                NewOffer::new(f.seller, AccountId::ZERO, "WETH", 1, 1),
                "ZeroAddress",
            ),
            (
                NewOffer::new(f.seller, f.seller, "WETH", 1, 1),
                "BuyerIsSeller",
            ),
            (
                new_offer(&f, 1, 1).with_ttl(Duration::zero()),
                "InvalidExpiry",
            ),
        ];
        for (req, expected) in cases {
            let err = f.engine.create_offer(req).unwrap_err();
            let matched = match expected {
                "ZeroAddress" => matches!(err, EscrowSwapError::ZeroAddress),
                "InvalidAsset" => matches!(err, EscrowSwapError::InvalidAsset(_)),
                "ZeroAmount" => matches!(err, EscrowSwapError::ZeroAmount { .. }),
                "BuyerIsSeller" => matches!(err, EscrowSwapError::BuyerIsSeller(_)),
                "InvalidExpiry" => matches!(err, EscrowSwapError::InvalidExpiry { .. }),
                _ => false,
            };
            assert!(matched, "expected {expected}, got {err}");
        }
        assert_eq!(f.engine.offer_count(), 0);
        assert!(f.sink.is_empty());
        assert!(f.engine.rate_limit_state(&f.seller).is_none());
    }

    #[test]
    fn insufficient_balance_consumes_nothing() {
        let f = fixture();
        let err = f
            .engine
            .create_offer(new_offer(&f, 10_001, 1))
            .unwrap_err();
        assert!(matches!(err, EscrowSwapError::InsufficientBalance { .. }));
        assert_eq!(f.engine.offer_count(), 0);
        assert_eq!(
            f.engine.rate_limit_state(&f.seller).unwrap().window_count,
            0
        );

        // No cooldown started and id 1 still unused.
        let id = f.engine.create_offer(new_offer(&f, 10, 1)).unwrap();
        assert_eq!(id, OfferId(1));
    }

    #[test]
    fn accept_settles_both_legs() {
        let f = fixture();
        let id = f.engine.create_offer(new_offer(&f, 100, 5_000)).unwrap();
        f.engine.accept_offer(id, f.buyer).unwrap();

        assert_eq!(f.engine.offer(id).unwrap().status, OfferStatus::Settled);
        assert_eq!(f.ledger.balance_of(f.buyer, &weth()), 100);
        assert_eq!(f.ledger.balance_of(f.seller, &usdc()), 5_000);
        assert_eq!(f.ledger.balance_of(f.buyer, &usdc()), 995_000);
        assert_eq!(
            f.ledger.balance_of(f.engine.custody_account(), &weth()),
            0
        );
        assert_eq!(f.sink.names(), vec!["OFFER_CREATED", "OFFER_ACCEPTED"]);
        f.engine.verify_custody(&weth()).unwrap();
    }

    #[test]
    fn accept_check_order() {
        let f = fixture();
        let stranger = AccountId::new();
        assert!(matches!(
            f.engine.accept_offer(OfferId(42), f.buyer).unwrap_err(),
            EscrowSwapError::OfferNotFound(OfferId(42))
        ));

        let id = f
            .engine
            .create_offer(new_offer(&f, 100, 5_000).with_ttl(Duration::seconds(60)))
            .unwrap();
        assert!(matches!(
            f.engine.accept_offer(id, stranger).unwrap_err(),
            EscrowSwapError::NotDesignatedBuyer { .. }
        ));

        // Exactly at the deadline the offer is still acceptable; one second
        // later it is not, and the status is not auto-transitioned.
        f.clock.advance_secs(61);
        assert!(matches!(
            f.engine.accept_offer(id, f.buyer).unwrap_err(),
            EscrowSwapError::OfferExpired(_)
        ));
        assert_eq!(f.engine.offer(id).unwrap().status, OfferStatus::Active);

        f.engine.reclaim_expired(id, stranger).unwrap();
        assert!(matches!(
            f.engine.accept_offer(id, f.buyer).unwrap_err(),
            EscrowSwapError::OfferNotActive {
                status: OfferStatus::Expired,
                ..
            }
        ));
    }

    #[test]
    fn accept_at_deadline_succeeds() {
        let f = fixture();
        let id = f
            .engine
            .create_offer(new_offer(&f, 100, 5_000).with_ttl(Duration::seconds(60)))
            .unwrap();
        f.clock.advance_secs(60);
        f.engine.accept_offer(id, f.buyer).unwrap();
    }

    #[test]
    fn accept_without_quote_funds_rolls_back() {
        let f = fixture();
        let poor = AccountId::new();
        let id = f
            .engine
            .create_offer(NewOffer::new(f.seller, poor, "WETH", 100, 5_000))
            .unwrap();
        let err = f.engine.accept_offer(id, poor).unwrap_err();
        assert!(matches!(err, EscrowSwapError::InsufficientBalance { .. }));

        assert_eq!(f.engine.offer(id).unwrap().status, OfferStatus::Active);
        assert_eq!(f.ledger.balance_of(poor, &weth()), 0);
        assert_eq!(
            f.ledger.balance_of(f.engine.custody_account(), &weth()),
            100
        );
        assert_eq!(f.sink.names(), vec!["OFFER_CREATED"]);
    }

    #[test]
    fn cancel_returns_funds_to_seller() {
        let f = fixture();
        let id = f.engine.create_offer(new_offer(&f, 250, 1)).unwrap();
        assert!(matches!(
            f.engine.cancel_offer(id, f.buyer).unwrap_err(),
            EscrowSwapError::NotSeller { .. }
        ));
        f.engine.cancel_offer(id, f.seller).unwrap();
        assert_eq!(f.ledger.balance_of(f.seller, &weth()), 10_000);
        assert_eq!(f.engine.offer(id).unwrap().status, OfferStatus::Cancelled);

        assert!(matches!(
            f.engine.cancel_offer(id, f.seller).unwrap_err(),
            EscrowSwapError::OfferNotActive { .. }
        ));
        assert!(matches!(
            f.engine.accept_offer(id, f.buyer).unwrap_err(),
            EscrowSwapError::OfferNotActive { .. }
        ));
        assert_eq!(f.sink.names(), vec!["OFFER_CREATED", "OFFER_CANCELLED"]);
    }

    #[test]
    fn reclaim_requires_deadline() {
        let f = fixture();
        let anyone = AccountId::new();
        let forever = f.engine.create_offer(new_offer(&f, 10, 1)).unwrap();
        assert!(matches!(
            f.engine.reclaim_expired(forever, anyone).unwrap_err(),
            EscrowSwapError::NotYetExpired(_)
        ));

        f.clock.advance_secs(10);
        let timed = f
            .engine
            .create_offer(new_offer(&f, 20, 1).with_ttl(Duration::seconds(30)))
            .unwrap();
        f.clock.advance_secs(30);
        assert!(matches!(
            f.engine.reclaim_expired(timed, anyone).unwrap_err(),
            EscrowSwapError::NotYetExpired(_)
        ));
        f.clock.advance_secs(1);
        f.engine.reclaim_expired(timed, anyone).unwrap();
        assert_eq!(f.engine.offer(timed).unwrap().status, OfferStatus::Expired);
        assert_eq!(f.ledger.balance_of(f.seller, &weth()), 9_990);
        assert_eq!(f.ledger.balance_of(anyone, &weth()), 0);
        f.engine.verify_custody(&weth()).unwrap();
    }

    #[test]
    fn cooldown_then_success() {
        let f = fixture();
        f.engine.create_offer(new_offer(&f, 1, 1)).unwrap();
        f.clock.advance_secs(5);
        let err = f.engine.create_offer(new_offer(&f, 1, 1)).unwrap_err();
        assert!(matches!(err, EscrowSwapError::CooldownActive { .. }));
        f.clock.advance_secs(5);
        assert_eq!(
            f.engine.create_offer(new_offer(&f, 1, 1)).unwrap(),
            OfferId(2)
        );
    }

    #[test]
    fn window_cap_enforced() {
        let mut config = EscrowConfig::new("USDC");
        config.cooldown_secs = 0;
        config.max_offers_per_window = 2;
        let f = fixture_with(config);
        f.engine.create_offer(new_offer(&f, 1, 1)).unwrap();
        f.engine.create_offer(new_offer(&f, 1, 1)).unwrap();
        assert!(matches!(
            f.engine.create_offer(new_offer(&f, 1, 1)).unwrap_err(),
            EscrowSwapError::DailyLimitReached { limit: 2 }
        ));
        f.clock.advance(Duration::days(1));
        f.engine.create_offer(new_offer(&f, 1, 1)).unwrap();
    }

    #[test]
    fn platform_fee_goes_to_collector() {
        let collector = AccountId::new();
        let mut config = EscrowConfig::new("USDC");
        config.platform_fee_bps = 100;
        config.fee_collector = Some(collector);
        let f = fixture_with(config);
        let id = f.engine.create_offer(new_offer(&f, 100, 5_000)).unwrap();
        f.engine.accept_offer(id, f.buyer).unwrap();
        assert_eq!(f.ledger.balance_of(collector, &usdc()), 50);
        assert_eq!(f.ledger.balance_of(f.seller, &usdc()), 4_950);
        assert_eq!(f.ledger.balance_of(f.buyer, &usdc()), 995_000);
    }

    #[test]
    fn invalid_config_rejected() {
        let mut config = EscrowConfig::new("USDC");
        config.platform_fee_bps = 10;
        let result = EscrowEngine::new(
            config,
            Arc::new(InMemoryLedger::new()),
            Arc::new(ManualClock::at_epoch()),
        );
        assert!(matches!(result, Err(EscrowSwapError::Configuration(_))));
    }

    #[test]
    fn queries_sorted_by_id() {
        let f = fixture();
        for _ in 0..3 {
            f.engine.create_offer(new_offer(&f, 1, 1)).unwrap();
            f.clock.advance_secs(10);
        }
        f.engine.cancel_offer(OfferId(2), f.seller).unwrap();

        let ids: Vec<OfferId> = f
            .engine
            .offers_by_seller(&f.seller)
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![OfferId(1), OfferId(2), OfferId(3)]);
        let active: Vec<OfferId> = f.engine.active_offers().iter().map(|o| o.id).collect();
        assert_eq!(active, vec![OfferId(1), OfferId(3)]);
        assert_eq!(f.engine.offer_count(), 3);
        assert!(f.engine.offers_by_seller(&f.buyer).is_empty());
    }

    #[test]
    fn custody_mismatch_detected() {
        let f = fixture();
        f.engine.create_offer(new_offer(&f, 100, 1)).unwrap();
        f.ledger
            .mint(f.engine.custody_account(), &weth(), 1)
            .unwrap();
        assert!(matches!(
            f.engine.verify_custody(&weth()).unwrap_err(),
            EscrowSwapError::InvariantViolation { .. }
        ));
    }
}
