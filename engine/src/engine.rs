use std::sync::Arc;

use database::{
    MatchCardRecord, MatchRecord, MatchStatus, MatchStore, MatchTxn, StoreError,
};
use notifier::{MatchReport, ResultNotifier, TurnReport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use types::{build_deck, deal_two_hands, CardDefinition, RoundWinner};

use crate::config::GameConfig;
use crate::error::EngineError;
use crate::view::{
    CardSelector, CreatedMatch, HandCard, MatchState, MoveOutcome, PlayedCard, RoundReport,
    SurrenderReport,
};

/// Orchestrates the match lifecycle against the shared store. Every
/// operation is an independent unit of work; moves on the same match
/// serialize through the store's per-match write lock.
pub struct MatchEngine {
    store: MatchStore,
    notifier: Arc<dyn ResultNotifier>,
    config: GameConfig,
}

impl MatchEngine {
    pub fn new(store: MatchStore, notifier: Arc<dyn ResultNotifier>, config: GameConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    fn deck_rng(&self) -> StdRng {
        match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Deals both hands and persists the match atomically. Returns the
    /// creating player's hand for immediate use.
    pub async fn create_match(
        &self,
        player1_id: &str,
        player2_id: &str,
    ) -> Result<CreatedMatch, EngineError> {
        if player1_id.is_empty() || player2_id.is_empty() {
            return Err(EngineError::EmptyPlayerId);
        }
        if player1_id == player2_id {
            return Err(EngineError::SamePlayer);
        }

        let definitions: Vec<CardDefinition> = self
            .store
            .active_definitions()
            .await?
            .iter()
            .map(|d| d.definition())
            .collect();

        let deck = build_deck(&definitions, &mut self.deck_rng());
        let (hand_p1, hand_p2) = deal_two_hands(deck, self.config.hand_size)?;

        let record = MatchRecord::new(player1_id, player2_id);
        let mut txn = self.store.begin().await?;
        txn.insert_match(&record).await?;
        for card in &hand_p1 {
            txn.insert_card(&record.id, player1_id, card).await?;
        }
        for card in &hand_p2 {
            txn.insert_card(&record.id, player2_id, card).await?;
        }
        txn.commit().await?;

        tracing::info!(match_id = %record.id, player1_id, player2_id, "match created");

        let hand = self.player_hand(&record.id, player1_id).await?;
        Ok(CreatedMatch {
            match_id: record.id,
            player_id: player1_id.to_string(),
            status: MatchStatus::InProgress,
            hand,
        })
    }

    /// Plays one card for `player_id`. The card-mark, the opponent
    /// probe and (when both sides have moved) the round resolution all
    /// commit in one transaction, so concurrent submissions cannot
    /// observe a half-applied round.
    pub async fn submit_move(
        &self,
        match_id: &str,
        player_id: &str,
        selector: CardSelector,
    ) -> Result<MoveOutcome, EngineError> {
        let mut txn = self.store.begin().await?;
        txn.lock_match(match_id).await?;
        let match_rec = txn.fetch_match(match_id).await?;

        if !match_rec.is_participant(player_id) {
            return Err(EngineError::NotInMatch {
                match_id: match_id.to_string(),
                player_id: player_id.to_string(),
            });
        }
        if match_rec.status != MatchStatus::InProgress {
            return Err(EngineError::MatchFinished);
        }
        if txn
            .card_played_in_round(match_id, player_id, match_rec.current_round)
            .await?
            .is_some()
        {
            return Err(EngineError::AlreadyMovedThisRound);
        }

        let card = self
            .resolve_selector(&mut txn, match_id, player_id, selector)
            .await?;
        txn.mark_card_used(card.id, match_rec.current_round).await?;

        let opponent_card = txn
            .opponent_card_in_round(match_id, player_id, match_rec.current_round)
            .await?;

        let Some(opponent_card) = opponent_card else {
            txn.commit().await?;
            tracing::debug!(
                match_id,
                player_id,
                round = match_rec.current_round,
                "first move of round, waiting for opponent"
            );
            return Ok(MoveOutcome::WaitingForOpponent);
        };

        let (report, match_rec) = self
            .settle_round(&mut txn, match_rec, &card, &opponent_card)
            .await?;
        txn.commit().await?;

        tracing::info!(
            match_id,
            round = report.round,
            winner = %report.winner,
            reason = %report.reason,
            "round resolved"
        );

        if report.match_finished {
            self.dispatch_finalize(match_rec);
        }
        Ok(MoveOutcome::RoundResolved(report))
    }

    async fn resolve_selector(
        &self,
        txn: &mut MatchTxn,
        match_id: &str,
        player_id: &str,
        selector: CardSelector,
    ) -> Result<MatchCardRecord, EngineError> {
        match selector {
            CardSelector::Instance(instance_id) => {
                let card = txn
                    .card_by_instance(instance_id, match_id, player_id)
                    .await?
                    .ok_or(EngineError::CardNotInMatch)?;
                if card.used {
                    return Err(EngineError::CardAlreadyUsed);
                }
                Ok(card)
            }
            CardSelector::HandIndex(index) => {
                // resolved against the live hand, never a cached mapping
                let unused = txn.unused_cards(match_id, player_id).await?;
                let available = unused.len();
                unused
                    .into_iter()
                    .nth(index)
                    .ok_or(EngineError::IndexOutOfRange { index, available })
            }
        }
    }

    /// Both players have moved this round: score it, advance the round
    /// counter and detect completion. Runs inside the caller's
    /// transaction.
    async fn settle_round(
        &self,
        txn: &mut MatchTxn,
        mut match_rec: MatchRecord,
        mover_card: &MatchCardRecord,
        opponent_card: &MatchCardRecord,
    ) -> Result<(RoundReport, MatchRecord), EngineError> {
        // order by match seat so points always credit the right side,
        // regardless of which player triggered resolution
        let (card_p1, card_p2) = if mover_card.player_id == match_rec.player1_id {
            (mover_card, opponent_card)
        } else {
            (opponent_card, mover_card)
        };

        let def_p1 = txn.fetch_definition(card_p1.card_def_id).await?;
        let def_p2 = txn.fetch_definition(card_p2.card_def_id).await?;
        let outcome = types::resolve_round(def_p1.card(), def_p2.card());

        match outcome.winner {
            RoundWinner::PlayerOne => match_rec.points_p1 += 1,
            RoundWinner::PlayerTwo => match_rec.points_p2 += 1,
            RoundWinner::Draw => {}
        }

        let resolved_round = match_rec.current_round;
        match_rec.current_round += 1;

        if match_rec.current_round > self.config.max_rounds {
            match_rec.status = MatchStatus::Finished;
            match_rec.finished_at = Some(chrono::Utc::now());
            match_rec.winner = if match_rec.points_p1 > match_rec.points_p2 {
                Some(match_rec.player1_id.clone())
            } else if match_rec.points_p2 > match_rec.points_p1 {
                Some(match_rec.player2_id.clone())
            } else {
                None
            };
        }

        txn.apply_round(&match_rec).await?;

        let report = RoundReport {
            round: resolved_round,
            winner: outcome.winner,
            reason: outcome.reason,
            points_p1: match_rec.points_p1,
            points_p2: match_rec.points_p2,
            match_finished: match_rec.status == MatchStatus::Finished,
            match_winner: match_rec.winner.clone(),
        };
        Ok((report, match_rec))
    }

    pub async fn get_state(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<MatchState, EngineError> {
        let match_rec = self
            .store
            .fetch_match(match_id)
            .await?
            .ok_or_else(|| EngineError::MatchNotFound(match_id.to_string()))?;

        let opponent_id = match_rec
            .opponent_of(player_id)
            .ok_or_else(|| EngineError::NotInMatch {
                match_id: match_id.to_string(),
                player_id: player_id.to_string(),
            })?
            .to_string();

        Ok(MatchState {
            match_id: match_rec.id.clone(),
            status: match_rec.status,
            current_round: match_rec.current_round,
            points_p1: match_rec.points_p1,
            points_p2: match_rec.points_p2,
            player_hand: self.player_hand(match_id, player_id).await?,
            used_cards: self.played_cards(match_id, player_id).await?,
            opponent_used_cards: self.played_cards(match_id, &opponent_id).await?,
            match_winner: match_rec.winner,
        })
    }

    /// Ends the match immediately in the opponent's favor. Goes
    /// through the same finalization path as a normally completed
    /// match.
    pub async fn surrender(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<SurrenderReport, EngineError> {
        let mut txn = self.store.begin().await?;
        txn.lock_match(match_id).await?;
        let mut match_rec = txn.fetch_match(match_id).await?;

        let winner = match_rec
            .opponent_of(player_id)
            .ok_or_else(|| EngineError::NotInMatch {
                match_id: match_id.to_string(),
                player_id: player_id.to_string(),
            })?
            .to_string();

        if match_rec.status != MatchStatus::InProgress {
            return Err(EngineError::MatchFinished);
        }

        let finished_at = chrono::Utc::now();
        txn.finish_match(match_id, Some(&winner), finished_at).await?;
        txn.commit().await?;

        tracing::info!(match_id, player_id, winner = %winner, "match surrendered");

        match_rec.status = MatchStatus::Finished;
        match_rec.winner = Some(winner.clone());
        match_rec.finished_at = Some(finished_at);
        self.dispatch_finalize(match_rec);

        Ok(SurrenderReport {
            match_id: match_id.to_string(),
            status: MatchStatus::Finished,
            winner,
        })
    }

    pub async fn list_active_matches(
        &self,
        player_id: &str,
    ) -> Result<Vec<MatchRecord>, EngineError> {
        Ok(self.store.active_matches_for(player_id).await?)
    }

    async fn player_hand(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<Vec<HandCard>, EngineError> {
        Ok(self
            .store
            .unused_hand(match_id, player_id)
            .await?
            .into_iter()
            .enumerate()
            .map(|(hand_index, rec)| HandCard {
                match_card_id: rec.instance_id,
                hand_index,
                card: rec.card,
            })
            .collect())
    }

    async fn played_cards(
        &self,
        match_id: &str,
        player_id: &str,
    ) -> Result<Vec<PlayedCard>, EngineError> {
        Ok(self
            .store
            .used_cards(match_id, player_id)
            .await?
            .into_iter()
            .map(|rec| PlayedCard {
                match_card_id: rec.instance_id,
                card: rec.card,
                round_used: rec.round_used,
            })
            .collect())
    }

    /// Hands the finished match to the notifier without blocking the
    /// caller. Failure to schedule is logged, never surfaced; the
    /// match state stays authoritative whatever the ledger does.
    fn dispatch_finalize(&self, match_rec: MatchRecord) {
        let store = self.store.clone();
        let notifier = Arc::clone(&self.notifier);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    match build_report(&store, &match_rec).await {
                        Ok(report) => {
                            notifier.finalize_match(&report).await;
                        }
                        Err(e) => tracing::error!(
                            match_id = %match_rec.id,
                            error = %e,
                            "failed to assemble ledger report"
                        ),
                    }
                });
            }
            Err(e) => tracing::error!(
                match_id = %match_rec.id,
                error = %e,
                "no async runtime available to dispatch finalization"
            ),
        }
    }
}

/// Rebuilds the turn-by-turn log from the store and recomputes each
/// round's winner for the ledger payload.
async fn build_report(
    store: &MatchStore,
    match_rec: &MatchRecord,
) -> Result<MatchReport, StoreError> {
    let pairs = store
        .round_pairs(&match_rec.id, &match_rec.player1_id)
        .await?;

    let turns = pairs
        .iter()
        .map(|pair| {
            let outcome = types::resolve_round(pair.card_p1, pair.card_p2);
            let winner_external_id = match outcome.winner {
                RoundWinner::PlayerOne => Some(match_rec.player1_id.clone()),
                RoundWinner::PlayerTwo => Some(match_rec.player2_id.clone()),
                RoundWinner::Draw => None,
            };
            TurnReport {
                turn_number: pair.round_number,
                player1_card_name: pair.card_p1.to_string(),
                player2_card_name: pair.card_p2.to_string(),
                winner_external_id,
            }
        })
        .collect();

    Ok(MatchReport {
        external_match_id: match_rec.id.clone(),
        player1_external_id: match_rec.player1_id.clone(),
        player2_external_id: match_rec.player2_id.clone(),
        winner_external_id: match_rec.winner.clone(),
        player1_score: match_rec.points_p1,
        player2_score: match_rec.points_p2,
        status: match_rec.status.to_string(),
        turns,
    })
}
