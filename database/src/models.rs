use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use types::{Card, CardDefinition, Category};
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    InProgress,
    Finished,
}

impl MatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Finished => "finished",
        }
    }
}

impl Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(MatchStatus::InProgress),
            "finished" => Ok(MatchStatus::Finished),
            other => Err(format!("unknown match status: {other}")),
        }
    }
}

/// The aggregate root. `status` moves from in_progress to finished
/// exactly once; `winner` is set at that transition and never after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: String,
    pub player1_id: String,
    pub player2_id: String,
    pub status: MatchStatus,
    pub current_round: i32,
    pub points_p1: i32,
    pub points_p2: i32,
    pub winner: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl MatchRecord {
    pub fn new(player1_id: &str, player2_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            player1_id: player1_id.to_string(),
            player2_id: player2_id.to_string(),
            status: MatchStatus::InProgress,
            current_round: 1,
            points_p1: 0,
            points_p2: 0,
            winner: None,
            created_at: chrono::Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_participant(&self, player_id: &str) -> bool {
        self.player1_id == player_id || self.player2_id == player_id
    }

    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        if self.player1_id == player_id {
            Some(&self.player2_id)
        } else if self.player2_id == player_id {
            Some(&self.player1_id)
        } else {
            None
        }
    }
}

/// One physical card dealt into a match. `used` flips to true at most
/// once, recording the round it was played in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCardRecord {
    pub id: i64,
    pub match_id: String,
    pub player_id: String,
    pub card_def_id: i64,
    pub used: bool,
    pub round_used: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CardDefinitionRecord {
    pub id: i64,
    pub category: Category,
    pub power: i32,
    pub active: bool,
}

impl CardDefinitionRecord {
    pub fn definition(&self) -> CardDefinition {
        CardDefinition {
            id: self.id,
            category: self.category,
            power: self.power,
            active: self.active,
        }
    }

    pub fn card(&self) -> Card {
        self.definition().card()
    }
}

/// An unused card in a player's hand, joined with its definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HandCardRecord {
    pub instance_id: i64,
    pub card: Card,
}

/// A card that has been played, with the round it was used in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayedCardRecord {
    pub instance_id: i64,
    pub card: Card,
    pub round_used: i32,
}

/// Both cards of one fully resolved round, ordered by match seat.
#[derive(Debug, Clone, Copy)]
pub struct RoundPairRecord {
    pub round_number: i32,
    pub card_p1: Card,
    pub card_p2: Card,
}
