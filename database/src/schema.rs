use sqlx::SqlitePool;
use types::Category;

use crate::error::StoreError;

/// Powers seeded per category. 18 definitions total, enough for two
/// hands of five with a remainder to discard.
const SEED_POWERS: [i32; 6] = [1, 2, 3, 4, 5, 6];
const SEED_CATEGORIES: [Category; 3] = [Category::Rock, Category::Paper, Category::Scissors];

pub async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS card_definitions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            category TEXT NOT NULL,
            power INTEGER NOT NULL,
            active BOOLEAN NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            player1_id TEXT NOT NULL,
            player2_id TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'in_progress',
            current_round INTEGER NOT NULL DEFAULT 1,
            points_p1 INTEGER NOT NULL DEFAULT 0,
            points_p2 INTEGER NOT NULL DEFAULT 0,
            winner TEXT,
            created_at TIMESTAMP NOT NULL,
            finished_at TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS match_cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
            player_id TEXT NOT NULL,
            card_def_id INTEGER NOT NULL REFERENCES card_definitions(id),
            used BOOLEAN NOT NULL DEFAULT 0,
            round_used INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_match_cards_match_player
            ON match_cards(match_id, player_id);
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| StoreError::Query(e.to_string()))?;

    Ok(())
}

/// Seeds the card catalog when it is empty. Re-running is a no-op so
/// startup can call this unconditionally.
pub async fn seed_card_definitions(pool: &SqlitePool) -> Result<u32, StoreError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM card_definitions")
        .fetch_one(pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

    if existing > 0 {
        tracing::info!(existing, "card catalog already seeded, skipping");
        return Ok(0);
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StoreError::Transaction(e.to_string()))?;

    let mut inserted = 0;
    for category in SEED_CATEGORIES {
        for power in SEED_POWERS {
            sqlx::query("INSERT INTO card_definitions (category, power, active) VALUES (?, ?, 1)")
                .bind(category.to_string())
                .bind(power)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;
            inserted += 1;
        }
    }

    tx.commit()
        .await
        .map_err(|e| StoreError::Transaction(e.to_string()))?;

    tracing::info!(inserted, "seeded card catalog");
    Ok(inserted)
}
