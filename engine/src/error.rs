use database::StoreError;
use thiserror::Error;
use types::DeckError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("player id must not be empty")]
    EmptyPlayerId,

    #[error("a match needs two distinct players")]
    SamePlayer,

    #[error("match not found: {0}")]
    MatchNotFound(String),

    #[error("player {player_id} is not part of match {match_id}")]
    NotInMatch {
        match_id: String,
        player_id: String,
    },

    #[error("match already finished")]
    MatchFinished,

    #[error("card does not belong to this player and match")]
    CardNotInMatch,

    #[error("card already used")]
    CardAlreadyUsed,

    #[error("player already moved this round")]
    AlreadyMovedThisRound,

    #[error("index out of range: you have {available} cards available")]
    IndexOutOfRange { index: usize, available: usize },

    /// Catalog misconfiguration, not a caller mistake.
    #[error(transparent)]
    Deck(#[from] DeckError),

    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MatchNotFound(id) => EngineError::MatchNotFound(id),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    /// Whether the API boundary should map this to a 4xx response.
    /// Deck and storage failures are the server's problem.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, EngineError::Deck(_) | EngineError::Store(_))
    }
}
