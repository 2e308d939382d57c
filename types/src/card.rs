use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Rock,
    Paper,
    Scissors,
}

impl Category {
    /// The category this one defeats: rock > scissors > paper > rock.
    pub fn beats(self) -> Category {
        match self {
            Category::Rock => Category::Scissors,
            Category::Scissors => Category::Paper,
            Category::Paper => Category::Rock,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Rock => "rock",
            Category::Paper => "paper",
            Category::Scissors => "scissors",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown card category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rock" => Ok(Category::Rock),
            "paper" => Ok(Category::Paper),
            "scissors" => Ok(Category::Scissors),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

/// Immutable catalog entry. Seeded once, never mutated afterwards;
/// card instances reference it by id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: i64,
    pub category: Category,
    pub power: i32,
    pub active: bool,
}

impl CardDefinition {
    pub fn card(&self) -> Card {
        Card {
            def_id: self.id,
            category: self.category,
            power: self.power,
        }
    }
}

/// A logical card as the resolver and deck builder see it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub def_id: i64,
    pub category: Category,
    pub power: i32,
}

impl Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.category, self.power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beats_relation_is_cyclic() {
        assert_eq!(Category::Rock.beats(), Category::Scissors);
        assert_eq!(Category::Scissors.beats(), Category::Paper);
        assert_eq!(Category::Paper.beats(), Category::Rock);
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in [Category::Rock, Category::Paper, Category::Scissors] {
            assert_eq!(category.to_string().parse::<Category>(), Ok(category));
        }
        assert!("lizard".parse::<Category>().is_err());
    }

    #[test]
    fn card_displays_category_and_power() {
        let card = Card {
            def_id: 7,
            category: Category::Scissors,
            power: 4,
        };
        assert_eq!(card.to_string(), "scissors 4");
    }
}
