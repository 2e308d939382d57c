pub mod config;
pub mod engine;
pub mod error;
pub mod view;

pub use config::GameConfig;
pub use engine::MatchEngine;
pub use error::EngineError;
pub use view::{
    CardSelector, CreatedMatch, HandCard, MatchState, MoveOutcome, PlayedCard, RoundReport,
    SurrenderReport,
};
