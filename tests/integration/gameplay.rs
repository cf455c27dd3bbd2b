//! Full gameplay scenarios: session + ledger + remote store together.
//!
//! Drives the settlement machine synchronously (no presentational
//! delays) against the deterministic in-memory store.

use goldflip::game::flip::{FlipSource, SeededFlip};
use goldflip::game::session::{Session, SubmitOutcome};
use goldflip::ledger;
use goldflip::promo::PromoBook;
use goldflip::types::{CoinSide, Outcome, WagerStatus};

use crate::mock_store::MemoryStore;

const HISTORY_LIMIT: usize = 50;
const STARTING_BALANCE: u64 = 100;

async fn open_session(store: &MemoryStore, user_id: &str) -> Session {
    let wallet = ledger::load_or_init(store, user_id, STARTING_BALANCE)
        .await
        .unwrap();
    Session::new(user_id, wallet, HISTORY_LIMIT)
}

/// Submit, settle against the given flip, persist, reset. Returns the
/// settlement outcome.
async fn play_round(
    store: &MemoryStore,
    session: &mut Session,
    stake: u64,
    chosen: CoinSide,
    flipped: CoinSide,
) -> Outcome {
    session.select_amount(stake);
    session.select_side(chosen);
    assert!(matches!(
        session.submit().unwrap(),
        SubmitOutcome::Accepted { .. }
    ));
    let settlement = session.settle(flipped).unwrap();
    ledger::sync(store, session.user_id(), session.balance()).await;
    session.reset();
    settlement.outcome
}

#[tokio::test]
async fn test_fresh_user_initialised_and_persisted() {
    let store = MemoryStore::new();
    let session = open_session(&store, "player-1").await;

    assert_eq!(session.balance(), 100);
    // The default was written back immediately.
    assert_eq!(store.stored("player-1"), Some(100));
}

#[tokio::test]
async fn test_returning_user_loads_stored_balance() {
    let store = MemoryStore::with_balance("player-1", 250);
    let session = open_session(&store, "player-1").await;

    assert_eq!(session.balance(), 250);
    assert!(store.writes().is_empty()); // no re-initialisation
}

#[tokio::test]
async fn test_win_lifecycle_end_to_end() {
    let store = MemoryStore::new();
    let mut session = open_session(&store, "player-1").await;

    session.select_amount(10);
    session.select_side(CoinSide::Heads);
    session.submit().unwrap();

    // Pessimistic reservation persisted before the outcome is known.
    ledger::sync(&store, "player-1", session.balance()).await;
    assert_eq!(store.stored("player-1"), Some(90));

    let settlement = session.settle(CoinSide::Heads).unwrap();
    assert_eq!(settlement.outcome, Outcome::Win);
    assert_eq!(session.balance(), 120);

    ledger::sync(&store, "player-1", session.balance()).await;
    assert_eq!(store.stored("player-1"), Some(120));

    session.reset();
    assert_eq!(session.status(), WagerStatus::Unselected);
}

#[tokio::test]
async fn test_loss_lifecycle_end_to_end() {
    let store = MemoryStore::new();
    let mut session = open_session(&store, "player-1").await;

    let outcome = play_round(&store, &mut session, 10, CoinSide::Heads, CoinSide::Tails).await;
    assert_eq!(outcome, Outcome::Loss);
    assert_eq!(session.balance(), 90);
    assert_eq!(store.stored("player-1"), Some(90));
}

#[tokio::test]
async fn test_insufficient_balance_changes_nothing() {
    let store = MemoryStore::with_balance("player-1", 5);
    let mut session = open_session(&store, "player-1").await;

    session.select_amount(10);
    session.select_side(CoinSide::Heads);
    assert_eq!(session.submit().unwrap(), SubmitOutcome::Rejected);

    assert_eq!(session.balance(), 5);
    assert_eq!(session.status(), WagerStatus::Selected);
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn test_rapid_double_submit_debits_once() {
    let store = MemoryStore::new();
    let mut session = open_session(&store, "player-1").await;

    session.select_amount(50);
    session.select_side(CoinSide::Tails);
    assert!(matches!(
        session.submit().unwrap(),
        SubmitOutcome::Accepted { .. }
    ));
    assert_eq!(session.submit().unwrap(), SubmitOutcome::Rejected);

    assert_eq!(session.balance(), 50); // exactly one debit of 50
}

#[tokio::test]
async fn test_balance_never_negative_over_random_play() {
    let store = MemoryStore::new();
    let mut session = open_session(&store, "player-1").await;
    let flips = SeededFlip::new(2026);

    let mut expected = session.balance();
    for round in 0..200u64 {
        if expected == 0 {
            break; // busted — nothing left to wager
        }
        // Vary the stake: sometimes all-in, mostly partial.
        let stake = if round % 7 == 0 {
            expected
        } else {
            (round % expected) + 1
        };
        let chosen = if round % 2 == 0 {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        };

        let outcome = play_round(&store, &mut session, stake, chosen, flips.flip()).await;
        expected = match outcome {
            Outcome::Win => expected + stake,
            Outcome::Loss => expected - stake,
        };
        assert_eq!(session.balance(), expected);
    }
    // Stored value tracks the last settled balance.
    assert_eq!(store.stored("player-1"), Some(session.balance()));
}

#[tokio::test]
async fn test_history_keeps_last_50_most_recent_first() {
    let store = MemoryStore::new();
    let mut session = open_session(&store, "player-1").await;

    for i in 0..60u64 {
        let chosen = if i % 2 == 0 { CoinSide::Heads } else { CoinSide::Tails };
        // Always settle on heads: even rounds win, odd rounds lose.
        play_round(&store, &mut session, 1, chosen, CoinSide::Heads).await;
    }

    let history = session.history().snapshot();
    assert_eq!(history.len(), 50);
    // Round 59 (odd, chose tails, landed heads) is the most recent.
    assert_eq!(history[0].outcome, Outcome::Loss);
    assert_eq!(history[0].chosen, CoinSide::Tails);
    assert_eq!(history[1].outcome, Outcome::Win);
}

#[tokio::test]
async fn test_store_failure_diverges_without_blocking_play() {
    let store = MemoryStore::new();
    let mut session = open_session(&store, "player-1").await;

    session.select_amount(10);
    session.select_side(CoinSide::Heads);
    session.submit().unwrap();
    session.settle(CoinSide::Heads).unwrap();
    assert_eq!(session.balance(), 120);

    // The remote write fails: not retried, gameplay continues.
    store.set_error("remote store timeout");
    assert!(!ledger::sync(&store, "player-1", session.balance()).await);
    assert_eq!(store.stored("player-1"), Some(100)); // diverged
    assert_eq!(session.balance(), 120);

    session.reset();
    session.select_amount(20);
    session.select_side(CoinSide::Tails);
    assert!(matches!(
        session.submit().unwrap(),
        SubmitOutcome::Accepted { .. }
    ));

    // The next successful write reconverges.
    store.clear_error();
    assert!(ledger::sync(&store, "player-1", session.balance()).await);
    assert_eq!(store.stored("player-1"), Some(100)); // 120 - 20 in flight
    assert_eq!(store.writes().len(), 2); // init + reconverging write only
}

#[tokio::test]
async fn test_promo_redemption_once_and_persisted() {
    let store = MemoryStore::with_balance("player-1", 3);
    let mut session = open_session(&store, "player-1").await;
    let promos = PromoBook::new(500, vec!["LUCKY-777".into()]);

    let grant = promos.redeem("player-1", "LUCKY-777").unwrap();
    session.apply_grant(grant);
    ledger::sync(&store, "player-1", session.balance()).await;

    assert_eq!(session.balance(), 500);
    assert_eq!(store.stored("player-1"), Some(500));
    assert_eq!(promos.redemptions().len(), 1);

    // The token is spent — even for another user.
    assert!(promos.redeem("player-2", "LUCKY-777").is_err());
}

#[tokio::test]
async fn test_net_delta_property() {
    // Starting balance B, wager A ≤ B: B + A on a win, B - A on a loss.
    for (flipped, expected) in [(CoinSide::Heads, 130u64), (CoinSide::Tails, 70u64)] {
        let store = MemoryStore::new();
        let mut session = open_session(&store, "player-1").await;
        play_round(&store, &mut session, 30, CoinSide::Heads, flipped).await;
        assert_eq!(session.balance(), expected);
    }
}
