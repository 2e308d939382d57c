use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::card::{Card, CardDefinition};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeckError {
    #[error("too few cards in deck: {deck_size} cards for two hands of {hand_size}")]
    InsufficientCards { deck_size: usize, hand_size: usize },
}

/// Instantiates one card per active definition and shuffles. The rng
/// is injected so tests can seed it.
pub fn build_deck<R: Rng>(definitions: &[CardDefinition], rng: &mut R) -> Vec<Card> {
    let mut deck: Vec<Card> = definitions
        .iter()
        .filter(|def| def.active)
        .map(CardDefinition::card)
        .collect();
    deck.shuffle(rng);
    deck
}

/// Splits a shuffled deck into two disjoint hands; the remainder is
/// discarded for the match. Requires strictly more cards than the two
/// hands consume.
pub fn deal_two_hands(
    deck: Vec<Card>,
    hand_size: usize,
) -> Result<(Vec<Card>, Vec<Card>), DeckError> {
    if deck.len() <= hand_size * 2 {
        return Err(DeckError::InsufficientCards {
            deck_size: deck.len(),
            hand_size,
        });
    }

    let mut cards = deck.into_iter();
    let hand_p1: Vec<Card> = cards.by_ref().take(hand_size).collect();
    let hand_p2: Vec<Card> = cards.take(hand_size).collect();
    Ok((hand_p1, hand_p2))
}
