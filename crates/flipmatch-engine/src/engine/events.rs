use serde::Serialize;

use super::{
    powerup::{PowerupKind, PowerupOutcome},
    scoring::ScoreBreakdown,
    session::Phase,
};

/// Notifications emitted by a [`LevelSession`](super::LevelSession).
///
/// Events are queued inside the session and drained by the caller with
/// [`LevelSession::drain_events`](super::LevelSession::drain_events); the
/// session never waits for a listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, derive_more::IsVariant)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    PhaseChanged { from: Phase, to: Phase },
    CardRevealed { slot: usize },
    /// Cards turned face-down again (mismatch settled or glimpse ended).
    CardsConcealed { slots: Vec<usize> },
    MatchResolved { success: bool, combo: u32 },
    PauseChanged { paused: bool },
    PowerupApplied {
        kind: PowerupKind,
        outcome: PowerupOutcome,
    },
    SessionCompleted { score: ScoreBreakdown },
}
