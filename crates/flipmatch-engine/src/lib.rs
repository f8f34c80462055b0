//! Level session engine for a single-player card-matching puzzle.
//!
//! The crate is split in two layers:
//!
//! - [`core`] - immutable data: cards, boards, level configurations and the
//!   board generator
//! - [`engine`] - the level session state machine, scoring, combo tracking,
//!   power-ups and the progress store boundary
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use flipmatch_engine::{LevelCatalog, LevelSession, MemoryProgressStore, Phase};
//!
//! let catalog = LevelCatalog::standard();
//! let level = catalog.get(2).unwrap();
//! let mut store = MemoryProgressStore::default();
//! let mut session = LevelSession::new(level, &mut store).unwrap();
//!
//! assert_eq!(session.phase(), Phase::Preview);
//! session.advance(Duration::from_secs(30));
//! assert_eq!(session.phase(), Phase::Playing);
//! ```

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Malformed input detected while building a level, a board or a session.
///
/// This is the only fatal error of the engine. It is raised at construction
/// time and never by an in-progress session.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum InvalidConfiguration {
    #[display("card count must not be zero")]
    ZeroCardCount,
    #[display("card count {card_count} is odd")]
    OddCardCount { card_count: usize },
    #[display("card count {card_count} exceeds twice the symbol pool size {pool_size}")]
    PoolTooSmall { card_count: usize, pool_size: usize },
    #[display("symbol {symbol:?} appears more than once in the pool")]
    DuplicateSymbol { symbol: String },
    #[display("level id must be at least 1")]
    InvalidLevelId,
    #[display("level {id} has a zero dimension ({rows}x{cols})")]
    ZeroDimension { id: u32, rows: u32, cols: u32 },
    #[display("level {id} declares {card_count} cards but its grid is {rows}x{cols}")]
    DimensionMismatch {
        id: u32,
        rows: u32,
        cols: u32,
        card_count: usize,
    },
    #[display("unknown tier {name:?}")]
    UnknownTier { name: String },
    #[display("invalid scoring parameter `{parameter}`: {reason}")]
    InvalidScoring {
        parameter: &'static str,
        reason: &'static str,
    },
    #[display("invalid level catalog: {reason}")]
    InvalidCatalog { reason: String },
}

/// Why a session refused a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum TransitionRejection {
    #[display("session is not playing (phase: {phase})")]
    NotPlaying { phase: Phase },
    #[display("session is paused")]
    Paused,
    #[display("slot {slot} is outside the board")]
    SlotOutOfRange { slot: usize },
    #[display("slot {slot} is already matched")]
    AlreadyMatched { slot: usize },
    #[display("slot {slot} is already revealed")]
    AlreadyRevealed { slot: usize },
    #[display("two cards are awaiting resolution")]
    AwaitingResolution,
    #[display("a glimpse is in progress")]
    GlimpseActive,
}

/// Non-fatal outcome of a mutating call that did not change the session.
///
/// These represent expected races in user input (a double tap during the
/// mismatch delay, a power-up without coins) and are returned as values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum Rejection {
    #[display("rejected transition: {_0}")]
    RejectedTransition(TransitionRejection),
    #[display("cannot afford {kind}: costs {price}, balance is {balance}")]
    InsufficientResources {
        kind: PowerupKind,
        price: u32,
        balance: u32,
    },
    #[display("no eligible target for the power-up")]
    NoEligibleTarget,
}

impl From<TransitionRejection> for Rejection {
    fn from(value: TransitionRejection) -> Self {
        Self::RejectedTransition(value)
    }
}

/// The catalog has no level after the requested one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("no level after level {level_id}")]
pub struct NoNextLevel {
    pub level_id: u32,
}

/// Failure to move a session on to the following level.
#[derive(
    Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From,
)]
pub enum NextLevelError {
    #[display("{_0}")]
    NoNextLevel(NoNextLevel),
    #[display("{_0}")]
    InvalidConfiguration(InvalidConfiguration),
}
