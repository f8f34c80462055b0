use std::{collections::HashSet, fmt::Write as _};

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
    seq::{IndexedRandom as _, SliceRandom as _},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::InvalidConfiguration;

use super::{
    board::{Board, Card},
    emoji_pool::EMOJI_POOL,
};

/// Seed for deterministic board generation.
///
/// A 128-bit seed, serialized as a 32-character hex string. The same seed and
/// the same pool always produce the same board, which makes sessions
/// reproducible for debugging and testing.
///
/// # Example
///
/// ```
/// use flipmatch_engine::{BoardGenerator, BoardSeed};
/// use rand::Rng as _;
///
/// let seed: BoardSeed = rand::rng().random();
/// let generator = BoardGenerator::standard();
///
/// let first = generator.generate_with_seed(12, seed).unwrap();
/// let second = generator.generate_with_seed(12, seed).unwrap();
/// assert_eq!(first, second);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardSeed([u8; 16]);

impl BoardSeed {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    pub(crate) fn rng(self) -> Pcg32 {
        Pcg32::from_seed(self.0)
    }
}

impl std::fmt::Display for BoardSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

impl std::str::FromStr for BoardSeed {
    type Err = String;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        if hex_str.len() != 32 {
            return Err(format!(
                "invalid hex: expected 32 characters, got {}",
                hex_str.len()
            ));
        }
        let num = u128::from_str_radix(hex_str, 16)
            .map_err(|e| format!("invalid hex: {hex_str} ({e})"))?;
        Ok(Self(num.to_be_bytes()))
    }
}

impl Serialize for BoardSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut hex_str = String::with_capacity(2 * self.0.len());
        write!(&mut hex_str, "{self}").map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex_str)
    }
}

impl<'de> Deserialize<'de> for BoardSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

impl Distribution<BoardSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BoardSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        BoardSeed(seed)
    }
}

/// Deals shuffled, paired boards from a pool of distinct symbols.
///
/// For a card count `n`, `n / 2` symbols are drawn from the pool without
/// replacement, each is duplicated into a pair and the resulting `n` cards are
/// shuffled uniformly.
///
/// The generator keeps no random state of its own: [`Self::generate`] draws a
/// fresh seed on every call.
///
/// # Example
///
/// ```
/// use flipmatch_engine::BoardGenerator;
///
/// let board = BoardGenerator::standard().generate(8).unwrap();
/// assert_eq!(board.len(), 8);
/// assert_eq!(board.pairs().len(), 4);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BoardGenerator<'p> {
    pool: &'p [&'p str],
}

impl Default for BoardGenerator<'static> {
    fn default() -> Self {
        Self::standard()
    }
}

impl BoardGenerator<'static> {
    /// A generator over [`EMOJI_POOL`].
    #[must_use]
    pub const fn standard() -> Self {
        Self { pool: EMOJI_POOL }
    }
}

impl<'p> BoardGenerator<'p> {
    /// Creates a generator over a custom pool.
    ///
    /// Fails if the pool contains the same symbol twice.
    pub fn new(pool: &'p [&'p str]) -> Result<Self, InvalidConfiguration> {
        let mut seen = HashSet::with_capacity(pool.len());
        if let Some(symbol) = pool.iter().find(|symbol| !seen.insert(**symbol)) {
            return Err(InvalidConfiguration::DuplicateSymbol {
                symbol: (*symbol).to_owned(),
            });
        }
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &'p [&'p str] {
        self.pool
    }

    /// Deals a board with a freshly drawn random seed.
    pub fn generate(&self, card_count: usize) -> Result<Board, InvalidConfiguration> {
        self.generate_with_seed(card_count, rand::rng().random())
    }

    /// Like [`Self::generate`], but deterministic for a given seed.
    pub fn generate_with_seed(
        &self,
        card_count: usize,
        seed: BoardSeed,
    ) -> Result<Board, InvalidConfiguration> {
        self.deal(card_count, seed, &mut seed.rng())
    }

    /// Checks that a board of `card_count` cards can be dealt from this pool.
    pub fn check_card_count(&self, card_count: usize) -> Result<(), InvalidConfiguration> {
        if card_count == 0 {
            return Err(InvalidConfiguration::ZeroCardCount);
        }
        if card_count % 2 != 0 {
            return Err(InvalidConfiguration::OddCardCount { card_count });
        }
        if card_count > self.pool.len() * 2 {
            return Err(InvalidConfiguration::PoolTooSmall {
                card_count,
                pool_size: self.pool.len(),
            });
        }
        Ok(())
    }

    /// Deals a board using `rng`, recording `seed` as its origin.
    ///
    /// The session keeps drawing from the same RNG afterwards, so a seeded
    /// session is reproducible beyond the initial layout.
    pub(crate) fn deal<R>(
        &self,
        card_count: usize,
        seed: BoardSeed,
        rng: &mut R,
    ) -> Result<Board, InvalidConfiguration>
    where
        R: Rng + ?Sized,
    {
        self.check_card_count(card_count)?;

        let mut faces = Vec::with_capacity(card_count);
        for symbol in self.pool.choose_multiple(rng, card_count / 2) {
            faces.push(*symbol);
            faces.push(*symbol);
        }
        faces.shuffle(rng);

        let cards = faces
            .into_iter()
            .enumerate()
            .map(|(slot, face)| Card::new(slot, face))
            .collect();
        Ok(Board::new(seed, cards))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn face_counts(board: &Board) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for card in board.cards() {
            *counts.entry(card.face()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_every_face_appears_exactly_twice() {
        let generator = BoardGenerator::standard();
        for card_count in (2..=78).step_by(2) {
            let board = generator.generate(card_count).unwrap();
            assert_eq!(board.len(), card_count);
            let counts = face_counts(&board);
            assert_eq!(counts.len(), card_count / 2);
            assert!(counts.values().all(|&count| count == 2));
        }
    }

    #[test]
    fn test_slot_indices_follow_positions() {
        let board = BoardGenerator::standard().generate(20).unwrap();
        for (i, card) in board.cards().iter().enumerate() {
            assert_eq!(card.slot_index(), i);
        }
    }

    #[test]
    fn test_pairs_cover_every_slot_once() {
        let board = BoardGenerator::standard().generate(16).unwrap();
        let mut slots = board
            .pairs()
            .into_iter()
            .flat_map(|(a, b)| [a, b])
            .collect::<Vec<_>>();
        slots.sort_unstable();
        assert_eq!(slots, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_rejects_odd_card_count() {
        let err = BoardGenerator::standard().generate(7).unwrap_err();
        assert_eq!(err, InvalidConfiguration::OddCardCount { card_count: 7 });
    }

    #[test]
    fn test_rejects_zero_card_count() {
        let err = BoardGenerator::standard().generate(0).unwrap_err();
        assert_eq!(err, InvalidConfiguration::ZeroCardCount);
    }

    #[test]
    fn test_rejects_card_count_beyond_pool() {
        let generator = BoardGenerator::new(&["a", "b", "c"]).unwrap();
        assert!(generator.generate(6).is_ok());
        let err = generator.generate(8).unwrap_err();
        assert_eq!(
            err,
            InvalidConfiguration::PoolTooSmall {
                card_count: 8,
                pool_size: 3
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_pool_symbols() {
        let err = BoardGenerator::new(&["a", "b", "a"]).unwrap_err();
        assert_eq!(
            err,
            InvalidConfiguration::DuplicateSymbol {
                symbol: "a".to_owned()
            }
        );
    }

    #[test]
    fn test_small_pool_uses_every_symbol() {
        let generator = BoardGenerator::new(&["x", "y"]).unwrap();
        let board = generator.generate(4).unwrap();
        let counts = face_counts(&board);
        assert_eq!(counts.get("x"), Some(&2));
        assert_eq!(counts.get("y"), Some(&2));
    }

    #[test]
    fn test_same_seed_same_board() {
        let seed = BoardSeed::from_bytes([
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66,
            0x77, 0x88,
        ]);
        let generator = BoardGenerator::standard();
        let first = generator.generate_with_seed(40, seed).unwrap();
        let second = generator.generate_with_seed(40, seed).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.seed(), seed);
    }

    #[test]
    fn test_unseeded_calls_are_independent() {
        let generator = BoardGenerator::standard();
        let first = generator.generate(78).unwrap();
        let second = generator.generate(78).unwrap();
        assert_ne!(first.seed(), second.seed());
    }

    mod board_seed_serialization {
        use super::*;

        #[test]
        fn test_roundtrip_random_seed() {
            let seed: BoardSeed = rand::rng().random();
            let serialized = serde_json::to_string(&seed).unwrap();
            let deserialized: BoardSeed = serde_json::from_str(&serialized).unwrap();
            assert_eq!(seed, deserialized);
        }

        #[test]
        fn test_known_value_sequential_bytes() {
            let seed = BoardSeed::from_bytes([
                0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0xFE, 0xDC, 0xBA, 0x98, 0x76, 0x54,
                0x32, 0x10,
            ]);
            let serialized = serde_json::to_string(&seed).unwrap();
            assert_eq!(serialized, "\"0123456789abcdeffedcba9876543210\"");
        }

        #[test]
        fn test_parse_accepts_uppercase() {
            let seed: BoardSeed = "0123456789ABCDEFFEDCBA9876543210".parse().unwrap();
            assert_eq!(seed.to_string(), "0123456789abcdeffedcba9876543210");
        }

        #[test]
        fn test_error_wrong_length() {
            let result: Result<BoardSeed, _> = serde_json::from_str("\"0123\"");
            let err_msg = result.unwrap_err().to_string();
            assert!(err_msg.contains("invalid hex"));
        }

        #[test]
        fn test_error_invalid_hex_characters() {
            let result: Result<BoardSeed, _> =
                serde_json::from_str("\"ghijklmnopqrstuvwxyzghijklmnopqr\"");
            let err_msg = result.unwrap_err().to_string();
            assert!(err_msg.contains("invalid hex"));
        }
    }
}
