use rand::rngs::StdRng;
use rand::SeedableRng;
use types::{build_deck, deal_two_hands};

use crate::models::{MatchRecord, MatchStatus};
use crate::schema::{init_schema, seed_card_definitions};
use crate::store::MatchStore;
use crate::StoreError;

// A single connection keeps every query on the same in-memory database.
async fn setup_store() -> MatchStore {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to create test database pool");

    init_schema(&pool).await.expect("failed to init schema");
    seed_card_definitions(&pool).await.expect("failed to seed");

    MatchStore::new(pool)
}

async fn create_match(store: &MatchStore, p1: &str, p2: &str) -> MatchRecord {
    let definitions: Vec<_> = store
        .active_definitions()
        .await
        .expect("failed to load definitions")
        .iter()
        .map(|d| d.definition())
        .collect();

    let deck = build_deck(&definitions, &mut StdRng::seed_from_u64(11));
    let (hand_p1, hand_p2) = deal_two_hands(deck, 5).expect("deck too small");

    let record = MatchRecord::new(p1, p2);
    let mut txn = store.begin().await.expect("begin failed");
    txn.insert_match(&record).await.expect("insert match failed");
    for card in &hand_p1 {
        txn.insert_card(&record.id, p1, card).await.expect("insert card");
    }
    for card in &hand_p2 {
        txn.insert_card(&record.id, p2, card).await.expect("insert card");
    }
    txn.commit().await.expect("commit failed");
    record
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let store = setup_store().await;

    // setup_store already seeded once
    let inserted = seed_card_definitions(store.pool()).await.unwrap();
    assert_eq!(inserted, 0);

    let definitions = store.active_definitions().await.unwrap();
    assert_eq!(definitions.len(), 18);
}

#[tokio::test]
async fn created_match_round_trips() {
    let store = setup_store().await;
    let record = create_match(&store, "alice", "bob").await;

    let fetched = store
        .fetch_match(&record.id)
        .await
        .unwrap()
        .expect("match should exist");

    assert_eq!(fetched.status, MatchStatus::InProgress);
    assert_eq!(fetched.current_round, 1);
    assert_eq!(fetched.points_p1, 0);
    assert_eq!(fetched.points_p2, 0);
    assert_eq!(fetched.winner, None);
    assert!(fetched.is_participant("alice"));
    assert_eq!(fetched.opponent_of("bob"), Some("alice"));
}

#[tokio::test]
async fn unused_hand_is_stable_and_disjoint_between_players() {
    let store = setup_store().await;
    let record = create_match(&store, "alice", "bob").await;

    let hand_alice = store.unused_hand(&record.id, "alice").await.unwrap();
    let hand_bob = store.unused_hand(&record.id, "bob").await.unwrap();

    assert_eq!(hand_alice.len(), 5);
    assert_eq!(hand_bob.len(), 5);
    assert!(hand_alice
        .windows(2)
        .all(|pair| pair[0].instance_id < pair[1].instance_id));
    assert!(hand_alice
        .iter()
        .all(|c| hand_bob.iter().all(|o| o.instance_id != c.instance_id)));
}

#[tokio::test]
async fn lock_match_reports_unknown_ids() {
    let store = setup_store().await;

    let mut txn = store.begin().await.unwrap();
    let result = txn.lock_match("no-such-match").await;

    assert!(matches!(result, Err(StoreError::MatchNotFound(_))));
}

#[tokio::test]
async fn marking_a_card_records_the_round() {
    let store = setup_store().await;
    let record = create_match(&store, "alice", "bob").await;
    let hand = store.unused_hand(&record.id, "alice").await.unwrap();

    let mut txn = store.begin().await.unwrap();
    txn.lock_match(&record.id).await.unwrap();
    txn.mark_card_used(hand[0].instance_id, 1).await.unwrap();

    let played = txn
        .card_played_in_round(&record.id, "alice", 1)
        .await
        .unwrap()
        .expect("card should be recorded for round 1");
    assert_eq!(played.id, hand[0].instance_id);
    assert!(played.used);
    assert_eq!(played.round_used, Some(1));

    // opponent has not moved yet
    let opponent = txn
        .opponent_card_in_round(&record.id, "alice", 1)
        .await
        .unwrap();
    assert!(opponent.is_none());
    txn.commit().await.unwrap();

    assert_eq!(store.unused_hand(&record.id, "alice").await.unwrap().len(), 4);
}

#[tokio::test]
async fn rolled_back_transaction_leaves_state_unchanged() {
    let store = setup_store().await;
    let record = create_match(&store, "alice", "bob").await;
    let hand = store.unused_hand(&record.id, "alice").await.unwrap();

    {
        let mut txn = store.begin().await.unwrap();
        txn.lock_match(&record.id).await.unwrap();
        txn.mark_card_used(hand[0].instance_id, 1).await.unwrap();
        txn.rollback().await.unwrap();
    }

    assert_eq!(store.unused_hand(&record.id, "alice").await.unwrap().len(), 5);
}

#[tokio::test]
async fn apply_round_persists_match_mutation() {
    let store = setup_store().await;
    let mut record = create_match(&store, "alice", "bob").await;

    record.points_p1 = 1;
    record.current_round = 2;

    let mut txn = store.begin().await.unwrap();
    txn.lock_match(&record.id).await.unwrap();
    txn.apply_round(&record).await.unwrap();
    txn.commit().await.unwrap();

    let fetched = store.fetch_match(&record.id).await.unwrap().unwrap();
    assert_eq!(fetched.points_p1, 1);
    assert_eq!(fetched.current_round, 2);
    assert_eq!(fetched.status, MatchStatus::InProgress);
}

#[tokio::test]
async fn finish_match_sets_terminal_fields() {
    let store = setup_store().await;
    let record = create_match(&store, "alice", "bob").await;

    let mut txn = store.begin().await.unwrap();
    txn.lock_match(&record.id).await.unwrap();
    txn.finish_match(&record.id, Some("bob"), chrono::Utc::now())
        .await
        .unwrap();
    txn.commit().await.unwrap();

    let fetched = store.fetch_match(&record.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, MatchStatus::Finished);
    assert_eq!(fetched.winner.as_deref(), Some("bob"));
    assert!(fetched.finished_at.is_some());
}

#[tokio::test]
async fn active_matches_lists_only_in_progress() {
    let store = setup_store().await;
    let first = create_match(&store, "alice", "bob").await;
    let second = create_match(&store, "alice", "carol").await;

    let mut txn = store.begin().await.unwrap();
    txn.lock_match(&second.id).await.unwrap();
    txn.finish_match(&second.id, Some("carol"), chrono::Utc::now())
        .await
        .unwrap();
    txn.commit().await.unwrap();

    let active = store.active_matches_for("alice").await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, first.id);

    assert!(store.active_matches_for("dave").await.unwrap().is_empty());
}

#[tokio::test]
async fn round_pairs_skips_half_played_rounds() {
    let store = setup_store().await;
    let record = create_match(&store, "alice", "bob").await;
    let hand_alice = store.unused_hand(&record.id, "alice").await.unwrap();
    let hand_bob = store.unused_hand(&record.id, "bob").await.unwrap();

    let mut txn = store.begin().await.unwrap();
    txn.lock_match(&record.id).await.unwrap();
    // round 1 complete, round 2 only alice
    txn.mark_card_used(hand_alice[0].instance_id, 1).await.unwrap();
    txn.mark_card_used(hand_bob[0].instance_id, 1).await.unwrap();
    txn.mark_card_used(hand_alice[1].instance_id, 2).await.unwrap();
    txn.commit().await.unwrap();

    let pairs = store.round_pairs(&record.id, "alice").await.unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].round_number, 1);
    assert_eq!(pairs[0].card_p1, hand_alice[0].card);
    assert_eq!(pairs[0].card_p2, hand_bob[0].card);
}
