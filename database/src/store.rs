use std::collections::BTreeMap;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use types::{Card, Category};

use crate::error::StoreError;
use crate::models::{
    CardDefinitionRecord, HandCardRecord, MatchCardRecord, MatchRecord, MatchStatus,
    PlayedCardRecord, RoundPairRecord,
};

/// Read side of the match state store plus the entry point for write
/// transactions. All mutation of match state happens through
/// [`MatchTxn`] so that the card-mark, opponent-probe and resolution
/// writes of one move commit atomically.
#[derive(Clone)]
pub struct MatchStore {
    pool: SqlitePool,
}

impl MatchStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<MatchTxn, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))?;
        Ok(MatchTxn { tx })
    }

    pub async fn fetch_match(&self, match_id: &str) -> Result<Option<MatchRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM matches WHERE id = ?")
            .bind(match_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        row.as_ref().map(match_from_row).transpose()
    }

    pub async fn active_definitions(&self) -> Result<Vec<CardDefinitionRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, category, power, active FROM card_definitions WHERE active = 1 ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter().map(definition_from_row).collect()
    }

    /// The player's currently unused cards, in instance creation order.
    /// This ordering is the contract behind positional move selectors.
    pub async fn unused_hand(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<Vec<HandCardRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT mc.id AS instance_id, cd.id AS def_id, cd.category, cd.power
             FROM match_cards mc
             JOIN card_definitions cd ON cd.id = mc.card_def_id
             WHERE mc.match_id = ? AND mc.player_id = ? AND mc.used = 0
             ORDER BY mc.id",
        )
        .bind(match_id)
        .bind(player_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(HandCardRecord {
                    instance_id: row.get("instance_id"),
                    card: card_from_row(row)?,
                })
            })
            .collect()
    }

    pub async fn used_cards(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<Vec<PlayedCardRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT mc.id AS instance_id, mc.round_used, cd.id AS def_id, cd.category, cd.power
             FROM match_cards mc
             JOIN card_definitions cd ON cd.id = mc.card_def_id
             WHERE mc.match_id = ? AND mc.player_id = ? AND mc.used = 1
             ORDER BY mc.round_used",
        )
        .bind(match_id)
        .bind(player_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(PlayedCardRecord {
                    instance_id: row.get("instance_id"),
                    card: card_from_row(row)?,
                    round_used: row.get("round_used"),
                })
            })
            .collect()
    }

    pub async fn active_matches_for(
        &self,
        player_id: &str,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM matches
             WHERE (player1_id = ? OR player2_id = ?) AND status = 'in_progress'
             ORDER BY created_at",
        )
        .bind(player_id)
        .bind(player_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        rows.iter().map(match_from_row).collect()
    }

    /// Reconstructs the resolved rounds of a match by pairing both
    /// players' used cards per round. Rounds where only one side has
    /// played (surrender mid-round) are skipped.
    pub async fn round_pairs(
        &self,
        match_id: &str,
        player1_id: &str,
    ) -> Result<Vec<RoundPairRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT mc.player_id, mc.round_used, cd.id AS def_id, cd.category, cd.power
             FROM match_cards mc
             JOIN card_definitions cd ON cd.id = mc.card_def_id
             WHERE mc.match_id = ? AND mc.round_used IS NOT NULL
             ORDER BY mc.round_used",
        )
        .bind(match_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut by_round: BTreeMap<i32, (Option<Card>, Option<Card>)> = BTreeMap::new();
        for row in &rows {
            let round: i32 = row.get("round_used");
            let player_id: String = row.get("player_id");
            let card = card_from_row(row)?;
            let slot = by_round.entry(round).or_default();
            if player_id == player1_id {
                slot.0 = Some(card);
            } else {
                slot.1 = Some(card);
            }
        }

        Ok(by_round
            .into_iter()
            .filter_map(|(round_number, cards)| match cards {
                (Some(card_p1), Some(card_p2)) => Some(RoundPairRecord {
                    round_number,
                    card_p1,
                    card_p2,
                }),
                _ => None,
            })
            .collect())
    }
}

/// One write transaction scoped to a single match. Dropping without
/// commit rolls back, so a rejected move leaves no partial mutation.
pub struct MatchTxn {
    tx: Transaction<'static, Sqlite>,
}

impl MatchTxn {
    /// Touches the match row before anything else in the transaction.
    /// The no-op update takes SQLite's write lock up front, so two
    /// near-simultaneous moves on the same match serialize instead of
    /// both observing a stale "opponent has not moved" snapshot. Zero
    /// rows affected doubles as the existence check.
    pub async fn lock_match(&mut self, match_id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE matches SET id = id WHERE id = ?")
            .bind(match_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::MatchNotFound(match_id.to_string()));
        }
        Ok(())
    }

    pub async fn fetch_match(&mut self, match_id: &str) -> Result<MatchRecord, StoreError> {
        let row = sqlx::query("SELECT * FROM matches WHERE id = ?")
            .bind(match_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => match_from_row(&row),
            None => Err(StoreError::MatchNotFound(match_id.to_string())),
        }
    }

    pub async fn insert_match(&mut self, record: &MatchRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO matches
             (id, player1_id, player2_id, status, current_round, points_p1, points_p2, winner, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.player1_id)
        .bind(&record.player2_id)
        .bind(record.status.as_str())
        .bind(record.current_round)
        .bind(record.points_p1)
        .bind(record.points_p2)
        .bind(&record.winner)
        .bind(record.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn insert_card(
        &mut self,
        match_id: &str,
        player_id: &str,
        card: &Card,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO match_cards (match_id, player_id, card_def_id, used, round_used)
             VALUES (?, ?, ?, 0, NULL)",
        )
        .bind(match_id)
        .bind(player_id)
        .bind(card.def_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn card_by_instance(
        &mut self,
        instance_id: i64,
        match_id: &str,
        player_id: &str,
    ) -> Result<Option<MatchCardRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM match_cards WHERE id = ? AND match_id = ? AND player_id = ?",
        )
        .bind(instance_id)
        .bind(match_id)
        .bind(player_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.as_ref().map(match_card_from_row))
    }

    pub async fn unused_cards(
        &mut self,
        match_id: &str,
        player_id: &str,
    ) -> Result<Vec<MatchCardRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM match_cards
             WHERE match_id = ? AND player_id = ? AND used = 0
             ORDER BY id",
        )
        .bind(match_id)
        .bind(player_id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.iter().map(match_card_from_row).collect())
    }

    /// The caller's card played in the given round, if any. Used to
    /// reject a second move within the same round.
    pub async fn card_played_in_round(
        &mut self,
        match_id: &str,
        player_id: &str,
        round: i32,
    ) -> Result<Option<MatchCardRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM match_cards WHERE match_id = ? AND player_id = ? AND round_used = ?",
        )
        .bind(match_id)
        .bind(player_id)
        .bind(round)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.as_ref().map(match_card_from_row))
    }

    /// The opposing player's card for the given round, if they have
    /// already moved.
    pub async fn opponent_card_in_round(
        &mut self,
        match_id: &str,
        mover_id: &str,
        round: i32,
    ) -> Result<Option<MatchCardRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT * FROM match_cards WHERE match_id = ? AND player_id != ? AND round_used = ?",
        )
        .bind(match_id)
        .bind(mover_id)
        .bind(round)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.as_ref().map(match_card_from_row))
    }

    pub async fn mark_card_used(&mut self, instance_id: i64, round: i32) -> Result<(), StoreError> {
        sqlx::query("UPDATE match_cards SET used = 1, round_used = ? WHERE id = ?")
            .bind(round)
            .bind(instance_id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn fetch_definition(
        &mut self,
        def_id: i64,
    ) -> Result<CardDefinitionRecord, StoreError> {
        let row = sqlx::query("SELECT id, category, power, active FROM card_definitions WHERE id = ?")
            .bind(def_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        match row {
            Some(row) => definition_from_row(&row),
            None => Err(StoreError::DefinitionNotFound(def_id)),
        }
    }

    /// Writes the result of one resolved round: points, the advanced
    /// round counter, and the terminal status fields when the match
    /// just completed.
    pub async fn apply_round(&mut self, record: &MatchRecord) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE matches
             SET points_p1 = ?, points_p2 = ?, current_round = ?, status = ?, winner = ?, finished_at = ?
             WHERE id = ?",
        )
        .bind(record.points_p1)
        .bind(record.points_p2)
        .bind(record.current_round)
        .bind(record.status.as_str())
        .bind(&record.winner)
        .bind(record.finished_at)
        .bind(&record.id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    /// Surrender path: forces the terminal state without touching
    /// points or the round counter.
    pub async fn finish_match(
        &mut self,
        match_id: &str,
        winner: Option<&str>,
        finished_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE matches SET status = 'finished', winner = ?, finished_at = ? WHERE id = ?",
        )
        .bind(winner)
        .bind(finished_at)
        .bind(match_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }

    pub async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| StoreError::Transaction(e.to_string()))
    }
}

fn match_from_row(row: &SqliteRow) -> Result<MatchRecord, StoreError> {
    let status: String = row.get("status");
    let status = MatchStatus::from_str(&status).map_err(StoreError::CorruptRow)?;

    Ok(MatchRecord {
        id: row.get("id"),
        player1_id: row.get("player1_id"),
        player2_id: row.get("player2_id"),
        status,
        current_round: row.get("current_round"),
        points_p1: row.get("points_p1"),
        points_p2: row.get("points_p2"),
        winner: row.get("winner"),
        created_at: row.get("created_at"),
        finished_at: row.get("finished_at"),
    })
}

fn match_card_from_row(row: &SqliteRow) -> MatchCardRecord {
    MatchCardRecord {
        id: row.get("id"),
        match_id: row.get("match_id"),
        player_id: row.get("player_id"),
        card_def_id: row.get("card_def_id"),
        used: row.get("used"),
        round_used: row.get("round_used"),
    }
}

fn definition_from_row(row: &SqliteRow) -> Result<CardDefinitionRecord, StoreError> {
    let category: String = row.get("category");
    let category = Category::from_str(&category)
        .map_err(|e| StoreError::CorruptRow(e.to_string()))?;

    Ok(CardDefinitionRecord {
        id: row.get("id"),
        category,
        power: row.get("power"),
        active: row.get("active"),
    })
}

/// Decodes a joined row exposing `def_id`, `category`, `power`.
fn card_from_row(row: &SqliteRow) -> Result<Card, StoreError> {
    let category: String = row.get("category");
    let category = Category::from_str(&category)
        .map_err(|e| StoreError::CorruptRow(e.to_string()))?;

    Ok(Card {
        def_id: row.get("def_id"),
        category,
        power: row.get("power"),
    })
}
