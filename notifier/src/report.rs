use serde::{Deserialize, Serialize};

/// Finished-match summary sent to the statistics ledger. The ledger
/// treats `external_match_id` as idempotent, so resubmitting the same
/// report is safe across retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    pub external_match_id: String,
    pub player1_external_id: String,
    pub player2_external_id: String,
    pub winner_external_id: Option<String>,
    pub player1_score: i32,
    pub player2_score: i32,
    pub status: String,
    pub turns: Vec<TurnReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    pub turn_number: i32,
    pub player1_card_name: String,
    pub player2_card_name: String,
    pub winner_external_id: Option<String>,
}
