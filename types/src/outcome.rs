use std::cmp::Ordering;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::card::Card;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundWinner {
    #[serde(rename = "p1")]
    PlayerOne,
    #[serde(rename = "p2")]
    PlayerTwo,
    #[serde(rename = "draw")]
    Draw,
}

impl Display for RoundWinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoundWinner::PlayerOne => "p1",
            RoundWinner::PlayerTwo => "p2",
            RoundWinner::Draw => "draw",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundOutcome {
    pub winner: RoundWinner,
    pub reason: String,
    pub card_p1: Card,
    pub card_p2: Card,
}

/// Decides a single exchange of cards. Same category compares power,
/// equal power is a draw; differing categories follow the beats
/// relation, which admits no draws.
pub fn resolve_round(card_p1: Card, card_p2: Card) -> RoundOutcome {
    if card_p1.category == card_p2.category {
        let (winner, reason) = match card_p1.power.cmp(&card_p2.power) {
            Ordering::Greater => (RoundWinner::PlayerOne, "higher power"),
            Ordering::Less => (RoundWinner::PlayerTwo, "higher power"),
            Ordering::Equal => (RoundWinner::Draw, "equal power"),
        };
        return RoundOutcome {
            winner,
            reason: reason.to_string(),
            card_p1,
            card_p2,
        };
    }

    if card_p1.category.beats() == card_p2.category {
        RoundOutcome {
            winner: RoundWinner::PlayerOne,
            reason: format!("{} beats {}", card_p1.category, card_p2.category),
            card_p1,
            card_p2,
        }
    } else {
        RoundOutcome {
            winner: RoundWinner::PlayerTwo,
            reason: format!("{} beats {}", card_p2.category, card_p1.category),
            card_p1,
            card_p2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Category;

    fn card(def_id: i64, category: Category, power: i32) -> Card {
        Card {
            def_id,
            category,
            power,
        }
    }

    #[test]
    fn rock_beats_scissors_regardless_of_power() {
        let result = resolve_round(
            card(1, Category::Rock, 1),
            card(2, Category::Scissors, 9),
        );
        assert_eq!(result.winner, RoundWinner::PlayerOne);
        assert!(result.reason.contains("rock"));
    }

    #[test]
    fn scissors_beats_paper() {
        let result = resolve_round(
            card(1, Category::Scissors, 3),
            card(2, Category::Paper, 5),
        );
        assert_eq!(result.winner, RoundWinner::PlayerOne);
        assert_eq!(result.reason, "scissors beats paper");
    }

    #[test]
    fn paper_beats_rock() {
        let result = resolve_round(card(1, Category::Paper, 2), card(3, Category::Rock, 7));
        assert_eq!(result.winner, RoundWinner::PlayerOne);
    }

    #[test]
    fn same_category_higher_power_wins() {
        let result = resolve_round(card(1, Category::Rock, 4), card(4, Category::Rock, 2));
        assert_eq!(result.winner, RoundWinner::PlayerOne);
        assert_eq!(result.reason, "higher power");
    }

    #[test]
    fn same_category_equal_power_is_a_draw() {
        let result = resolve_round(card(8, Category::Paper, 3), card(3, Category::Paper, 3));
        assert_eq!(result.winner, RoundWinner::Draw);
        assert_eq!(result.reason, "equal power");
    }

    #[test]
    fn differing_categories_never_draw() {
        let categories = [Category::Rock, Category::Paper, Category::Scissors];
        for a in categories {
            for b in categories {
                if a == b {
                    continue;
                }
                let result = resolve_round(card(1, a, 5), card(2, b, 5));
                assert_ne!(result.winner, RoundWinner::Draw);
            }
        }
    }

    #[test]
    fn resolution_is_a_mirror_image_when_arguments_swap() {
        let a = card(1, Category::Rock, 3);
        let b = card(2, Category::Scissors, 9);

        let forward = resolve_round(a, b);
        let backward = resolve_round(b, a);

        assert_eq!(forward.winner, RoundWinner::PlayerOne);
        assert_eq!(backward.winner, RoundWinner::PlayerTwo);
        assert_eq!(forward.reason, backward.reason);
    }
}
