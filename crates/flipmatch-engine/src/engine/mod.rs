//! Level session logic and state management.
//!
//! This module drives a single play-through of a level on top of the
//! immutable data in [`core`](crate::core):
//!
//! - [`LevelSession`] - the Preview / Playing / Completed state machine
//! - [`ScoringConfig`] - accuracy, combo and time score components
//! - [`combo_segments`] - streak bookkeeping over the match history
//! - [`PowerupController`] - paid Bomb, Glimpse and Skip effects
//! - [`ProgressStore`] - the boundary to long-term player progress
//! - [`Scheduler`] - virtual-time deferred actions used by the session
//!
//! # Session Flow
//!
//! 1. Create a [`LevelSession`]; every card is shown face-up during the preview
//! 2. Advance time until the preview elapses and play begins
//! 3. Tap cards two at a time; matches stay up, mismatches flip back after a delay
//! 4. Optionally spend currency or inventory on power-ups
//! 5. When the board is cleared the score is committed to the store
//!
//! # Example
//!
//! ```
//! use flipmatch_engine::{LevelCatalog, LevelSession, MemoryProgressStore, SessionEvent};
//!
//! let catalog = LevelCatalog::standard();
//! let level = catalog.get(1).unwrap();
//! let mut store = MemoryProgressStore::default();
//! let mut session = LevelSession::new(level, &mut store).unwrap();
//!
//! session.advance(session.preview_remaining());
//! for (a, b) in session.board().pairs() {
//!     session.tap_card(a).unwrap();
//!     session.tap_card(b).unwrap();
//! }
//!
//! let completed = session
//!     .drain_events()
//!     .any(|event| matches!(event, SessionEvent::SessionCompleted { .. }));
//! assert!(completed);
//! ```

pub use self::{
    combo::*, events::*, powerup::*, progress::*, scheduler::*, scoring::*, session::*,
};

mod combo;
mod events;
mod powerup;
mod progress;
mod scheduler;
mod scoring;
mod session;
