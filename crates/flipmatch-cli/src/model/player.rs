use std::collections::BTreeMap;

use flipmatch_engine::{LevelSession, ProgressStore};
use rand::{Rng, seq::IteratorRandom as _};

/// Automated player that remembers the faces it has seen.
///
/// Every face-up card is memorized. When picking, each use of a memory
/// succeeds with probability `recall`; otherwise the player guesses among
/// cards it has not seen yet, falling back to any face-down card.
#[derive(Debug, Clone)]
pub struct SimulatedPlayer<R> {
    recall: f64,
    memory: BTreeMap<usize, String>,
    rng: R,
}

impl<R> SimulatedPlayer<R>
where
    R: Rng,
{
    pub fn new(recall: f64, rng: R) -> Self {
        Self {
            recall: recall.clamp(0.0, 1.0),
            memory: BTreeMap::new(),
            rng,
        }
    }

    /// Memorizes every face-up card and forgets matched ones.
    pub fn observe<S>(&mut self, session: &LevelSession<S>)
    where
        S: ProgressStore,
    {
        for &slot in session.revealed() {
            if let Some(card) = session.board().card(slot) {
                self.memory.insert(slot, card.face().to_owned());
            }
        }
        self.memory.retain(|slot, _| !session.matched().contains(slot));
    }

    fn recalls(&mut self) -> bool {
        self.rng.random_bool(self.recall)
    }

    fn face_down<S>(session: &LevelSession<S>) -> impl Iterator<Item = usize> + '_
    where
        S: ProgressStore,
    {
        (0..session.board().len())
            .filter(|slot| !session.matched().contains(slot) && !session.revealed().contains(slot))
    }

    fn guess<S>(&mut self, session: &LevelSession<S>) -> Option<usize>
    where
        S: ProgressStore,
    {
        let unseen = Self::face_down(session)
            .filter(|slot| !self.memory.contains_key(slot))
            .choose(&mut self.rng);
        unseen.or_else(|| Self::face_down(session).choose(&mut self.rng))
    }

    /// Picks the first card of an attempt.
    pub fn pick_first<S>(&mut self, session: &LevelSession<S>) -> Option<usize>
    where
        S: ProgressStore,
    {
        let known_pair = self.memory.iter().find_map(|(slot, face)| {
            self.memory
                .iter()
                .any(|(other, other_face)| other != slot && other_face == face)
                .then_some(*slot)
        });
        match known_pair {
            Some(slot) if self.recalls() => Some(slot),
            _ => self.guess(session),
        }
    }

    /// Picks the second card of an attempt, given the face-up `first`.
    pub fn pick_second<S>(&mut self, session: &LevelSession<S>, first: usize) -> Option<usize>
    where
        S: ProgressStore,
    {
        let face = session.board().card(first)?.face();
        let partner = self
            .memory
            .iter()
            .find(|(slot, known)| **slot != first && known.as_str() == face)
            .map(|(slot, _)| *slot);
        match partner {
            Some(slot) if self.recalls() => Some(slot),
            _ => self.guess(session),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use flipmatch_engine::{
        BoardSeed, LevelCatalog, MemoryProgressStore, Phase, SessionOptions,
    };
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn play(level_id: u32, recall: f64) -> (usize, usize) {
        let catalog = LevelCatalog::standard();
        let level = catalog.get(level_id).unwrap();
        let mut store = MemoryProgressStore::default();
        let options = SessionOptions {
            seed: Some(BoardSeed::from_bytes([7; 16])),
            ..SessionOptions::default()
        };
        let mut session = LevelSession::with_options(level, &mut store, options).unwrap();
        let mut player = SimulatedPlayer::new(recall, Pcg32::seed_from_u64(42));

        player.observe(&session);
        session.advance(session.preview_remaining());
        while session.phase() == Phase::Playing {
            let first = player.pick_first(&session).unwrap();
            session.tap_card(first).unwrap();
            player.observe(&session);
            let second = player.pick_second(&session, first).unwrap();
            session.tap_card(second).unwrap();
            player.observe(&session);
            session.advance(Duration::from_secs(1));
        }
        (session.attempts(), level.total_pairs())
    }

    #[test]
    fn test_perfect_recall_never_misses() {
        let (attempts, pairs) = play(9, 1.0);
        assert_eq!(attempts, pairs);
    }

    #[test]
    fn test_no_recall_still_finishes() {
        let (attempts, pairs) = play(4, 0.0);
        assert!(attempts >= pairs);
    }
}
