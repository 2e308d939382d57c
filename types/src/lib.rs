pub mod card;
pub mod deck;
pub mod outcome;

pub use card::{Card, CardDefinition, Category, ParseCategoryError};
pub use deck::{build_deck, deal_two_hands, DeckError};
pub use outcome::{resolve_round, RoundOutcome, RoundWinner};
