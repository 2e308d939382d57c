pub mod config;
pub mod error;
pub mod models;
pub mod schema;
pub mod store;

#[cfg(test)]
mod tests;

pub use config::DatabaseConfig;
pub use error::StoreError;
pub use models::{
    CardDefinitionRecord, HandCardRecord, MatchCardRecord, MatchRecord, MatchStatus,
    PlayedCardRecord, RoundPairRecord,
};
pub use schema::{init_schema, seed_card_definitions};
pub use store::{MatchStore, MatchTxn};
