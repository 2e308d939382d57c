use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use database::{init_schema, seed_card_definitions, DatabaseConfig, MatchStore};
use engine::{CardSelector, GameConfig, MatchEngine, MoveOutcome};
use notifier::NoopNotifier;

/// Plays a full match between two scripted players against a local
/// store. Useful for exercising the engine end to end without any
/// HTTP surface.
#[derive(Parser, Debug)]
struct Params {
    #[arg(long, default_value = "alice")]
    player1: String,

    #[arg(long, default_value = "bob")]
    player2: String,

    /// Defaults to DATABASE_URL, then an in-memory database.
    #[arg(long)]
    database_url: Option<String>,

    /// Fixed shuffle seed for a reproducible deal.
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = Params::parse();
    tracing::info!(?params, "starting demo match");

    let db_config = DatabaseConfig::from_cli_or_env(params.database_url.clone());
    let pool = db_config.create_pool().await?;
    init_schema(&pool).await?;
    seed_card_definitions(&pool).await?;

    let mut game_config = GameConfig::from_env();
    game_config.rng_seed = params.seed;
    let max_rounds = game_config.max_rounds;

    let match_engine = MatchEngine::new(
        MatchStore::new(pool),
        Arc::new(NoopNotifier),
        game_config,
    );

    let created = match_engine
        .create_match(&params.player1, &params.player2)
        .await?;
    tracing::info!(match_id = %created.match_id, hand_size = created.hand.len(), "match dealt");

    for _ in 0..max_rounds {
        match_engine
            .submit_move(&created.match_id, &params.player1, CardSelector::HandIndex(0))
            .await?;
        let outcome = match_engine
            .submit_move(&created.match_id, &params.player2, CardSelector::HandIndex(0))
            .await?;

        if let MoveOutcome::RoundResolved(report) = outcome {
            tracing::info!(
                round = report.round,
                winner = %report.winner,
                reason = %report.reason,
                points_p1 = report.points_p1,
                points_p2 = report.points_p2,
                "round played"
            );
        }
    }

    let state = match_engine
        .get_state(&created.match_id, &params.player1)
        .await?;
    tracing::info!(
        status = %state.status,
        points_p1 = state.points_p1,
        points_p2 = state.points_p2,
        winner = state.match_winner.as_deref().unwrap_or("draw"),
        "match complete"
    );

    Ok(())
}
