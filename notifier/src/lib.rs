pub mod client;
pub mod config;
pub mod report;

pub use client::{
    HttpTransport, LedgerClient, LedgerTransport, NoopNotifier, ResultNotifier, TransportError,
};
pub use config::NotifierConfig;
pub use report::{MatchReport, TurnReport};
