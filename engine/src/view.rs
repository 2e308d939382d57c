use database::MatchStatus;
use serde::Serialize;
use types::{Card, RoundWinner};

/// How a move names its card: by instance id, or by position within
/// the player's currently unused hand. Positions are resolved fresh
/// on every call, so they shift as cards are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSelector {
    Instance(i64),
    HandIndex(usize),
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HandCard {
    pub match_card_id: i64,
    pub hand_index: usize,
    pub card: Card,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PlayedCard {
    pub match_card_id: i64,
    pub card: Card,
    pub round_used: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedMatch {
    pub match_id: String,
    pub player_id: String,
    pub status: MatchStatus,
    pub hand: Vec<HandCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub round: i32,
    pub winner: RoundWinner,
    pub reason: String,
    pub points_p1: i32,
    pub points_p2: i32,
    pub match_finished: bool,
    pub match_winner: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MoveOutcome {
    WaitingForOpponent,
    RoundResolved(RoundReport),
}

impl MoveOutcome {
    pub fn report(&self) -> Option<&RoundReport> {
        match self {
            MoveOutcome::RoundResolved(report) => Some(report),
            MoveOutcome::WaitingForOpponent => None,
        }
    }
}

/// A player's view of a match. The opponent appears only through
/// their already-played cards; their remaining hand stays hidden.
#[derive(Debug, Clone, Serialize)]
pub struct MatchState {
    pub match_id: String,
    pub status: MatchStatus,
    pub current_round: i32,
    pub points_p1: i32,
    pub points_p2: i32,
    pub player_hand: Vec<HandCard>,
    pub used_cards: Vec<PlayedCard>,
    pub opponent_used_cards: Vec<PlayedCard>,
    pub match_winner: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SurrenderReport {
    pub match_id: String,
    pub status: MatchStatus,
    pub winner: String,
}
