//! Offer lifecycle integration tests against the in-memory ledger.
//!
//! Covers the conservation of escrowed funds across every terminal path,
//! observation ordering, and linearization of racing accept / cancel calls.

use std::sync::Arc;

use chrono::Duration;
use escrowswap_escrow::{EscrowEngine, NewOffer};
use escrowswap_ledger::{InMemoryLedger, Ledger, ManualClock, MemorySink};
use escrowswap_types::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Market {
    engine: Arc<EscrowEngine<InMemoryLedger, ManualClock>>,
    ledger: Arc<InMemoryLedger>,
    clock: Arc<ManualClock>,
    sink: Arc<MemorySink>,
}

impl Market {
    fn new(config: EscrowConfig) -> Self {
        init_tracing();
        let ledger = Arc::new(InMemoryLedger::new());
        let clock = Arc::new(ManualClock::at_epoch());
        let sink = Arc::new(MemorySink::new());
        let engine = EscrowEngine::new(config, Arc::clone(&ledger), Arc::clone(&clock))
            .expect("valid config")
            .with_sink(sink.clone());
        Self {
            engine: Arc::new(engine),
            ledger,
            clock,
            sink,
        }
    }

    fn funded(&self, asset: &str, amount: Amount) -> AccountId {
        let account = AccountId::new();
        self.ledger
            .mint(account, &AssetId::new(asset), amount)
            .expect("mint");
        account
    }
}

fn x() -> AssetId {
    AssetId::new("X")
}

fn y() -> AssetId {
    AssetId::new("Y")
}

#[test]
fn engines_on_one_ledger_keep_separate_custody() {
    let m = Market::new(EscrowConfig::new("Y"));
    let other = EscrowEngine::new(
        EscrowConfig::new("Y"),
        Arc::clone(&m.ledger),
        Arc::clone(&m.clock),
    )
    .unwrap();
    assert_ne!(m.engine.custody_account(), other.custody_account());

    let (seller, buyer) = (m.funded("X", 700), AccountId::new());
    m.engine
        .create_offer(NewOffer::new(seller, buyer, "X", 300, 10))
        .unwrap();
    other
        .create_offer(NewOffer::new(seller, buyer, "X", 400, 10))
        .unwrap();

    m.engine.verify_custody(&x()).unwrap();
    other.verify_custody(&x()).unwrap();
    assert_eq!(m.ledger.balance_of(other.custody_account(), &x()), 400);
}

#[test]
fn thousand_x_for_thousand_y() {
    let m = Market::new(EscrowConfig::new("Y"));
    let seller = m.funded("X", 1_000);
    let buyer = m.funded("Y", 1_000);

    let id = m
        .engine
        .create_offer(NewOffer::new(seller, buyer, "X", 1_000, 1_000))
        .unwrap();
    assert_eq!(m.ledger.balance_of(seller, &x()), 0);

    m.engine.accept_offer(id, buyer).unwrap();

    assert_eq!(m.ledger.balance_of(seller, &y()), 1_000);
    assert_eq!(m.ledger.balance_of(buyer, &x()), 1_000);
    assert_eq!(m.ledger.balance_of(seller, &x()), 0);
    assert_eq!(m.ledger.balance_of(buyer, &y()), 0);
    assert_eq!(m.engine.offer(id).unwrap().status, OfferStatus::Settled);

    let events = m.sink.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[1],
        Observation::OfferAccepted {
            amount: 1_000,
            price_quote: 1_000,
            ..
        }
    ));
    m.ledger.verify_supply(&x()).unwrap();
    m.ledger.verify_supply(&y()).unwrap();
}

#[test]
fn every_terminal_path_conserves_funds() {
    let mut config = EscrowConfig::new("Y");
    config.cooldown_secs = 0;
    let m = Market::new(config);
    let seller = m.funded("X", 300);
    let buyer = m.funded("Y", 10_000);
    let anyone = AccountId::new();

    let settled = m
        .engine
        .create_offer(NewOffer::new(seller, buyer, "X", 100, 500))
        .unwrap();
    let cancelled = m
        .engine
        .create_offer(NewOffer::new(seller, buyer, "X", 100, 500))
        .unwrap();
    let expired = m
        .engine
        .create_offer(NewOffer::new(seller, buyer, "X", 100, 500).with_ttl(Duration::hours(1)))
        .unwrap();
    m.engine.verify_custody(&x()).unwrap();
    assert_eq!(m.ledger.balance_of(m.engine.custody_account(), &x()), 300);

    m.engine.accept_offer(settled, buyer).unwrap();
    m.engine.cancel_offer(cancelled, seller).unwrap();
    m.clock.advance(Duration::hours(1) + Duration::seconds(1));
    m.engine.reclaim_expired(expired, anyone).unwrap();

    assert_eq!(m.ledger.balance_of(buyer, &x()), 100);
    assert_eq!(m.ledger.balance_of(seller, &x()), 200);
    assert_eq!(m.ledger.balance_of(m.engine.custody_account(), &x()), 0);
    assert!(m.engine.active_offers().is_empty());
    m.engine.verify_custody(&x()).unwrap();

    // Second terminal transition on any of them is a state error.
    for id in [settled, cancelled, expired] {
        for err in [
            m.engine.accept_offer(id, buyer).unwrap_err(),
            m.engine.cancel_offer(id, seller).unwrap_err(),
            m.engine.reclaim_expired(id, anyone).unwrap_err(),
        ] {
            assert_eq!(err.kind(), ErrorKind::State, "{err}");
        }
    }

    assert_eq!(
        m.sink.names(),
        vec![
            "OFFER_CREATED",
            "OFFER_CREATED",
            "OFFER_CREATED",
            "OFFER_ACCEPTED",
            "OFFER_CANCELLED",
            "OFFER_EXPIRED",
        ]
    );
}

#[test]
fn second_offer_within_cooldown_is_rate_limited() {
    let m = Market::new(EscrowConfig::new("Y"));
    let seller = m.funded("X", 10);
    let buyer = AccountId::new();

    m.engine
        .create_offer(NewOffer::new(seller, buyer, "X", 1, 1))
        .unwrap();
    m.clock.advance_secs(9);
    let err = m
        .engine
        .create_offer(NewOffer::new(seller, buyer, "X", 1, 1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimit);
    assert!(err.to_string().starts_with("ES_ERR_400"));

    m.clock.advance_secs(1);
    m.engine
        .create_offer(NewOffer::new(seller, buyer, "X", 1, 1))
        .unwrap();
    assert_eq!(m.engine.offer_count(), 2);
}

#[test]
fn observations_serialize_for_indexers() {
    let m = Market::new(EscrowConfig::new("Y"));
    let seller = m.funded("X", 5);
    let buyer = AccountId::new();
    let id = m
        .engine
        .create_offer(NewOffer::new(seller, buyer, "X", 5, 7))
        .unwrap();
    m.engine.cancel_offer(id, seller).unwrap();

    let json = serde_json::to_string(&m.sink.events()).unwrap();
    assert!(json.contains("offer_created"));
    assert!(json.contains("offer_cancelled"));
    let back: Vec<Observation> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, m.sink.events());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_accept_and_cancel_settle_exactly_once() {
    let mut config = EscrowConfig::new("Y");
    config.cooldown_secs = 0;
    config.max_offers_per_window = 1_000;
    let m = Market::new(config);
    let rounds: u64 = 64;
    let seller = m.funded("X", u128::from(rounds));
    let buyer = m.funded("Y", u128::from(rounds) * 10);

    for _ in 0..rounds {
        let id = m
            .engine
            .create_offer(NewOffer::new(seller, buyer, "X", 1, 10))
            .unwrap();

        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let accept = {
            let engine = Arc::clone(&m.engine);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                engine.accept_offer(id, buyer)
            })
        };
        let cancel = {
            let engine = Arc::clone(&m.engine);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                engine.cancel_offer(id, seller)
            })
        };
        let (accepted, cancelled) = (accept.await.unwrap(), cancel.await.unwrap());

        assert!(
            accepted.is_ok() ^ cancelled.is_ok(),
            "exactly one must win: {accepted:?} / {cancelled:?}"
        );
        let loser = accepted.err().or(cancelled.err()).unwrap();
        assert!(matches!(loser, EscrowSwapError::OfferNotActive { .. }));

        let status = m.engine.offer(id).unwrap().status;
        assert!(matches!(
            status,
            OfferStatus::Settled | OfferStatus::Cancelled
        ));
    }

    let settled = m
        .engine
        .offers_by_seller(&seller)
        .iter()
        .filter(|o| o.status == OfferStatus::Settled)
        .count() as u128;
    assert_eq!(m.ledger.balance_of(buyer, &x()), settled);
    assert_eq!(m.ledger.balance_of(seller, &y()), settled * 10);
    assert_eq!(
        m.ledger.balance_of(seller, &x()),
        u128::from(rounds) - settled
    );
    m.engine.verify_custody(&x()).unwrap();
    m.ledger.verify_supply(&x()).unwrap();
    m.ledger.verify_supply(&y()).unwrap();
}
