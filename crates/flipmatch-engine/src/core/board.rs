use serde::{Deserialize, Serialize};

use super::board_generator::BoardSeed;

/// A single card on the board.
///
/// Cards never change after the board is generated. Whether a card is
/// face-up or matched is session state, not card state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    slot_index: usize,
    face: String,
}

impl Card {
    #[must_use]
    pub fn new(slot_index: usize, face: impl Into<String>) -> Self {
        Self {
            slot_index,
            face: face.into(),
        }
    }

    /// Position of the card in the flattened board.
    #[must_use]
    pub fn slot_index(&self) -> usize {
        self.slot_index
    }

    #[must_use]
    pub fn face(&self) -> &str {
        &self.face
    }

    #[must_use]
    pub fn pairs_with(&self, other: &Card) -> bool {
        self.slot_index != other.slot_index && self.face == other.face
    }
}

/// An ordered, paired card layout together with the seed that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    seed: BoardSeed,
    cards: Vec<Card>,
}

impl Board {
    pub(crate) fn new(seed: BoardSeed, cards: Vec<Card>) -> Self {
        debug_assert!(cards.iter().enumerate().all(|(i, c)| c.slot_index == i));
        Self { seed, cards }
    }

    #[must_use]
    pub fn seed(&self) -> BoardSeed {
        self.seed
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn card(&self, slot: usize) -> Option<&Card> {
        self.cards.get(slot)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn total_pairs(&self) -> usize {
        self.cards.len() / 2
    }

    /// Returns the slot holding the other card of `slot`'s pair.
    #[must_use]
    pub fn partner_of(&self, slot: usize) -> Option<usize> {
        let card = self.cards.get(slot)?;
        self.cards
            .iter()
            .find(|other| card.pairs_with(other))
            .map(Card::slot_index)
    }

    /// Returns every pair as `(first_slot, second_slot)` with `first_slot < second_slot`,
    /// ordered by the first slot.
    #[must_use]
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        self.cards
            .iter()
            .filter_map(|card| {
                let partner = self.partner_of(card.slot_index)?;
                (card.slot_index < partner).then_some((card.slot_index, partner))
            })
            .collect()
    }
}
