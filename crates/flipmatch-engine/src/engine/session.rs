use std::{collections::BTreeSet, time::Duration};

use arrayvec::ArrayVec;
use rand::{Rng as _, seq::IndexedRandom as _};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    InvalidConfiguration, NextLevelError, Rejection, TransitionRejection,
    core::{Board, BoardGenerator, BoardSeed, LevelCatalog, LevelConfig},
};

use super::{
    combo::combo_segments,
    events::SessionEvent,
    powerup::{PowerupKind, PowerupOutcome},
    progress::ProgressStore,
    scheduler::{Scheduler, TimerToken},
    scoring::{ScoreBreakdown, ScoreInput, ScoringConfig},
};

/// How long a mismatched pair stays face-up before it is turned back.
pub const MISMATCH_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// How long the Glimpse power-up keeps unmatched cards face-up.
pub const GLIMPSE_DURATION: Duration = Duration::from_secs(5);

/// Lifecycle of a level session. Only ever moves forward.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::IsVariant,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[display("preview")]
    Preview,
    #[display("playing")]
    Playing,
    #[display("completed")]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    PreviewElapsed,
    SettleMismatch,
    EndGlimpse,
}

/// Construction parameters of a [`LevelSession`] beyond the level itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    pub scoring: ScoringConfig,
    /// Fixed board seed. A random seed is drawn when `None`.
    pub seed: Option<BoardSeed>,
    pub generator: BoardGenerator<'static>,
}

/// Result of a tap that was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum TapOutcome {
    /// First card of an attempt turned face-up.
    Revealed,
    Matched { combo: u32, completed: bool },
    /// The pair stays face-up for [`MISMATCH_SETTLE_DELAY`].
    Mismatched,
}

/// Serializable summary of a session's play data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTelemetry {
    pub level_id: u32,
    pub seed: BoardSeed,
    pub phase: Phase,
    pub attempts: usize,
    pub match_history: Vec<bool>,
    pub successful_pairs: usize,
    pub elapsed_secs: u64,
    pub skipped: bool,
}

/// State machine for one play-through of a level.
///
/// A session starts in [`Phase::Preview`] with every card face-up. Once the
/// preview window has elapsed it moves to [`Phase::Playing`], where taps turn
/// cards over two at a time, and it ends in [`Phase::Completed`] when every
/// card is matched or a Skip power-up forces completion.
///
/// Time is virtual: it only moves through [`Self::advance`] (or [`Self::tick`]).
/// The mismatch settle delay, the Glimpse window and the preview countdown
/// are deferred actions in an internal [`Scheduler`], all cancelled when the
/// session completes or is consumed.
///
/// On completion the score is computed once, committed to the
/// [`ProgressStore`], and the currency reward is credited.
///
/// # Example
///
/// ```
/// use flipmatch_engine::{LevelConfig, LevelSession, MemoryProgressStore, Phase, TapOutcome, Tier};
///
/// let level = LevelConfig::new(1, 2, 1, Tier::Easy).unwrap();
/// let mut store = MemoryProgressStore::default();
/// let mut session = LevelSession::new(&level, &mut store).unwrap();
///
/// // Three seconds of preview, then play.
/// for _ in 0..3 {
///     session.tick();
/// }
/// assert_eq!(session.phase(), Phase::Playing);
///
/// session.tap_card(0).unwrap();
/// let outcome = session.tap_card(1).unwrap();
/// assert_eq!(outcome, TapOutcome::Matched { combo: 1, completed: true });
///
/// let score = session.score().unwrap();
/// assert_eq!(score.total_percent, 100);
/// ```
#[derive(Debug)]
pub struct LevelSession<S> {
    level: LevelConfig,
    options: SessionOptions,
    board: Board,
    rng: Pcg32,
    phase: Phase,
    paused: bool,
    revealed: BTreeSet<usize>,
    matched: BTreeSet<usize>,
    selection: ArrayVec<usize, 2>,
    attempts: usize,
    match_history: Vec<bool>,
    successful_pairs: usize,
    current_combo: u32,
    skipped: bool,
    elapsed: Duration,
    scheduler: Scheduler<Deferred>,
    preview_timer: Option<TimerToken>,
    settle_timer: Option<TimerToken>,
    glimpse_timer: Option<TimerToken>,
    score: Option<ScoreBreakdown>,
    events: Vec<SessionEvent>,
    store: S,
}

impl<S> LevelSession<S>
where
    S: ProgressStore,
{
    /// Starts a session for `level` with default options.
    pub fn new(level: &LevelConfig, store: S) -> Result<Self, InvalidConfiguration> {
        Self::with_options(level, store, SessionOptions::default())
    }

    pub fn with_options(
        level: &LevelConfig,
        store: S,
        options: SessionOptions,
    ) -> Result<Self, InvalidConfiguration> {
        options.scoring.validate()?;

        let seed = options.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = seed.rng();
        let board = options.generator.deal(level.card_count(), seed, &mut rng)?;

        let preview =
            Duration::try_from_secs_f64(options.scoring.preview_duration_secs(level.card_count()))
                .map_err(|_| InvalidConfiguration::InvalidScoring {
                    parameter: "preview",
                    reason: "duration is out of range",
                })?;
        let mut scheduler = Scheduler::new();
        let preview_timer = scheduler.schedule_after(preview, Deferred::PreviewElapsed);

        log::debug!(
            "level {} session created: {} cards, seed {seed}, preview {preview:?}",
            level.id(),
            board.len()
        );

        Ok(Self {
            level: *level,
            options,
            revealed: (0..board.len()).collect(),
            board,
            rng,
            phase: Phase::Preview,
            paused: false,
            matched: BTreeSet::new(),
            selection: ArrayVec::new(),
            attempts: 0,
            match_history: vec![],
            successful_pairs: 0,
            current_combo: 0,
            skipped: false,
            elapsed: Duration::ZERO,
            scheduler,
            preview_timer: Some(preview_timer),
            settle_timer: None,
            glimpse_timer: None,
            score: None,
            events: vec![],
            store,
        })
    }

    /// Discards this session and starts the same level again on a fresh board.
    pub fn retry(self) -> Result<Self, InvalidConfiguration> {
        let level = self.level;
        self.play_level(&level)
    }

    /// Discards this session and starts `level`, keeping the store and options.
    ///
    /// A fixed seed is not carried over, so the new session gets a fresh board.
    pub fn play_level(self, level: &LevelConfig) -> Result<Self, InvalidConfiguration> {
        let options = SessionOptions {
            seed: None,
            ..self.options
        };
        Self::with_options(level, self.into_store(), options)
    }

    /// Discards this session and starts the level after it in `catalog`.
    ///
    /// The session is consumed even when there is no next level, so callers
    /// owning their store should check [`LevelCatalog::next_after`] first.
    pub fn next_level(self, catalog: &LevelCatalog) -> Result<Self, NextLevelError> {
        let next = *catalog.next_after(self.level.id())?;
        Ok(self.play_level(&next)?)
    }

    /// Ends the session, cancelling pending deferred actions, and returns the store.
    pub fn into_store(mut self) -> S {
        self.scheduler.cancel_all();
        self.store
    }

    #[must_use]
    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Slots currently face-up but not matched.
    #[must_use]
    pub fn revealed(&self) -> &BTreeSet<usize> {
        &self.revealed
    }

    #[must_use]
    pub fn matched(&self) -> &BTreeSet<usize> {
        &self.matched
    }

    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    #[must_use]
    pub fn match_history(&self) -> &[bool] {
        &self.match_history
    }

    #[must_use]
    pub fn combo_segments(&self) -> Vec<u32> {
        combo_segments(&self.match_history)
    }

    #[must_use]
    pub fn current_combo(&self) -> u32 {
        self.current_combo
    }

    /// Pairs matched by the player, excluding pairs completed by Skip.
    #[must_use]
    pub fn successful_pairs(&self) -> usize {
        self.successful_pairs
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    /// Playing time, excluding preview and pauses.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Playing time in whole seconds, as used for scoring.
    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.as_secs()
    }

    #[must_use]
    pub fn preview_remaining(&self) -> Duration {
        self.preview_timer
            .and_then(|token| self.scheduler.due_time(token))
            .map_or(Duration::ZERO, |due| due.saturating_sub(self.scheduler.now()))
    }

    /// Virtual time since the session was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.scheduler.now()
    }

    #[must_use]
    pub fn is_glimpse_active(&self) -> bool {
        self.glimpse_timer.is_some()
    }

    /// Whether a mismatched pair is waiting to be turned back.
    #[must_use]
    pub fn is_awaiting_resolution(&self) -> bool {
        self.settle_timer.is_some()
    }

    #[must_use]
    pub fn has_pending_timers(&self) -> bool {
        self.scheduler.pending_len() > 0
    }

    /// Final score, available once the session is completed.
    #[must_use]
    pub fn score(&self) -> Option<&ScoreBreakdown> {
        self.score.as_ref()
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn telemetry(&self) -> SessionTelemetry {
        SessionTelemetry {
            level_id: self.level.id(),
            seed: self.board.seed(),
            phase: self.phase,
            attempts: self.attempts,
            match_history: self.match_history.clone(),
            successful_pairs: self.successful_pairs,
            elapsed_secs: self.elapsed_secs(),
            skipped: self.skipped,
        }
    }

    /// Takes every event emitted since the last call.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, SessionEvent> {
        self.events.drain(..)
    }

    /// Advances virtual time by one second.
    pub fn tick(&mut self) {
        self.advance(Duration::from_secs(1));
    }

    /// Advances virtual time, firing deferred actions as they fall due.
    ///
    /// Elapsed playing time is accumulated piecewise between deferred actions,
    /// so a phase change half-way through `dt` only counts the part after it.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.scheduler.now().saturating_add(dt);
        loop {
            let step_to = self
                .scheduler
                .next_due()
                .filter(|due| *due <= target)
                .unwrap_or(target);
            let now = self.scheduler.now();
            if step_to > now && self.phase.is_playing() && !self.paused {
                self.elapsed += step_to - now;
            }
            self.scheduler.advance_to(step_to);
            while let Some(action) = self.scheduler.pop_due() {
                self.fire(action);
            }
            if step_to >= target {
                break;
            }
        }
    }

    fn fire(&mut self, action: Deferred) {
        log::debug!("level {}: firing {action:?} at {:?}", self.level.id(), self.now());
        match action {
            Deferred::PreviewElapsed => {
                self.preview_timer = None;
                self.revealed.clear();
                self.set_phase(Phase::Playing);
            }
            Deferred::SettleMismatch => {
                self.settle_timer = None;
                let slots = self
                    .selection
                    .drain(..)
                    .filter(|slot| self.revealed.remove(slot))
                    .collect::<Vec<_>>();
                if !slots.is_empty() {
                    self.events.push(SessionEvent::CardsConcealed { slots });
                }
            }
            Deferred::EndGlimpse => {
                self.glimpse_timer = None;
                // Matched slots never sit in `revealed`, so this is exactly the
                // set of still-unmatched slots the glimpse exposed.
                let slots = std::mem::take(&mut self.revealed)
                    .into_iter()
                    .collect::<Vec<_>>();
                if !slots.is_empty() {
                    self.events.push(SessionEvent::CardsConcealed { slots });
                }
            }
        }
    }

    fn set_phase(&mut self, to: Phase) {
        let from = self.phase;
        self.phase = to;
        log::debug!("level {}: {from} -> {to}", self.level.id());
        self.events.push(SessionEvent::PhaseChanged { from, to });
    }

    fn check_playing(&self) -> Result<(), TransitionRejection> {
        if !self.phase.is_playing() {
            return Err(TransitionRejection::NotPlaying { phase: self.phase });
        }
        if self.paused {
            return Err(TransitionRejection::Paused);
        }
        Ok(())
    }

    /// Turns the card at `slot` face-up and resolves the attempt if it is the second one.
    pub fn tap_card(&mut self, slot: usize) -> Result<TapOutcome, Rejection> {
        self.check_playing()?;
        if slot >= self.board.len() {
            return Err(TransitionRejection::SlotOutOfRange { slot }.into());
        }
        if self.glimpse_timer.is_some() {
            return Err(TransitionRejection::GlimpseActive.into());
        }
        if self.matched.contains(&slot) {
            return Err(TransitionRejection::AlreadyMatched { slot }.into());
        }
        if self.revealed.contains(&slot) {
            return Err(TransitionRejection::AlreadyRevealed { slot }.into());
        }
        if self.selection.is_full() {
            return Err(TransitionRejection::AwaitingResolution.into());
        }

        self.selection.push(slot);
        self.revealed.insert(slot);
        self.events.push(SessionEvent::CardRevealed { slot });

        if self.selection.is_full() {
            Ok(self.resolve_selection())
        } else {
            Ok(TapOutcome::Revealed)
        }
    }

    fn resolve_selection(&mut self) -> TapOutcome {
        let (first, second) = (self.selection[0], self.selection[1]);
        let success = self.board.cards()[first].pairs_with(&self.board.cards()[second]);

        self.attempts += 1;
        self.match_history.push(success);

        if success {
            self.selection.clear();
            self.record_match(first, second);
            self.events.push(SessionEvent::MatchResolved {
                success: true,
                combo: self.current_combo,
            });
            let completed = self.complete_if_cleared();
            TapOutcome::Matched {
                combo: self.current_combo,
                completed,
            }
        } else {
            self.current_combo = 0;
            log::debug!(
                "level {}: mismatch {first}/{second} on attempt {}",
                self.level.id(),
                self.attempts
            );
            self.events.push(SessionEvent::MatchResolved {
                success: false,
                combo: 0,
            });
            self.settle_timer = Some(
                self.scheduler
                    .schedule_after(MISMATCH_SETTLE_DELAY, Deferred::SettleMismatch),
            );
            TapOutcome::Mismatched
        }
    }

    fn record_match(&mut self, first: usize, second: usize) {
        self.revealed.remove(&first);
        self.revealed.remove(&second);
        self.matched.insert(first);
        self.matched.insert(second);
        self.current_combo += 1;
        self.successful_pairs += 1;
        log::debug!(
            "level {}: matched {first}/{second}, combo {}",
            self.level.id(),
            self.current_combo
        );
    }

    fn complete_if_cleared(&mut self) -> bool {
        if self.matched.len() < self.board.len() {
            return false;
        }
        self.complete();
        true
    }

    fn complete(&mut self) {
        self.scheduler.cancel_all();
        self.preview_timer = None;
        self.settle_timer = None;
        self.glimpse_timer = None;
        self.selection.clear();
        self.revealed.clear();
        self.paused = false;
        self.set_phase(Phase::Completed);

        let elapsed_secs = self.elapsed_secs();
        #[expect(clippy::cast_precision_loss)]
        let score = self.options.scoring.score(&ScoreInput {
            total_pairs: self.board.total_pairs(),
            successful_pairs: self.successful_pairs,
            attempts: self.attempts,
            match_history: &self.match_history,
            elapsed_secs: elapsed_secs as f64,
        });
        self.score = Some(score);

        self.store
            .commit_session_result(self.level.id(), &score, elapsed_secs);
        let reward = score.total.saturating_mul(self.options.scoring.coins_per_point);
        if reward > 0 {
            self.store.credit_currency(reward);
        }

        log::info!(
            "level {} completed in {elapsed_secs}s: {}/{} ({}%), {} attempts{}",
            self.level.id(),
            score.total,
            score.max_total,
            score.total_percent,
            self.attempts,
            if self.skipped { ", skipped" } else { "" }
        );
        self.events.push(SessionEvent::SessionCompleted { score });
    }

    /// Freezes the elapsed-time clock. Pausing twice is the same as pausing once.
    pub fn pause(&mut self) -> Result<(), Rejection> {
        self.set_paused(true)
    }

    /// Unfreezes the elapsed-time clock. A no-op when not paused.
    pub fn resume(&mut self) -> Result<(), Rejection> {
        self.set_paused(false)
    }

    fn set_paused(&mut self, paused: bool) -> Result<(), Rejection> {
        if !self.phase.is_playing() {
            return Err(TransitionRejection::NotPlaying { phase: self.phase }.into());
        }
        if self.paused != paused {
            self.paused = paused;
            self.events.push(SessionEvent::PauseChanged { paused });
        }
        Ok(())
    }

    fn eligible_bomb_pairs(&self) -> Vec<(usize, usize)> {
        self.board
            .pairs()
            .into_iter()
            .filter(|(a, b)| !self.matched.contains(a) && !self.matched.contains(b))
            .collect()
    }

    /// Checks whether `kind` could be applied right now, without changing anything.
    pub fn check_powerup(&self, kind: PowerupKind) -> Result<(), Rejection> {
        self.check_playing()?;
        if kind.is_bomb() && self.eligible_bomb_pairs().is_empty() {
            return Err(Rejection::NoEligibleTarget);
        }
        Ok(())
    }

    /// Applies a power-up effect. Payment is the caller's business; see
    /// [`PowerupController`](super::PowerupController).
    pub(crate) fn apply_powerup(&mut self, kind: PowerupKind) -> Result<PowerupOutcome, Rejection> {
        self.check_powerup(kind)?;
        let outcome = match kind {
            PowerupKind::Bomb => self.apply_bomb()?,
            PowerupKind::Glimpse => self.apply_glimpse(),
            PowerupKind::Skip => self.apply_skip(),
        };
        log::info!("level {}: applied {kind}: {outcome:?}", self.level.id());
        self.events
            .push(SessionEvent::PowerupApplied { kind, outcome });
        self.complete_if_cleared();
        Ok(outcome)
    }

    fn apply_bomb(&mut self) -> Result<PowerupOutcome, Rejection> {
        let candidates = self.eligible_bomb_pairs();
        let &(first, second) = candidates
            .choose(&mut self.rng)
            .ok_or(Rejection::NoEligibleTarget)?;

        // A pending mismatch keeps its selection until it settles; a lone
        // first pick that was just bombed is dropped.
        if self.settle_timer.is_none() {
            self.selection.retain(|slot| *slot != first && *slot != second);
        }

        self.attempts += 1;
        self.match_history.push(true);
        self.record_match(first, second);
        self.events.push(SessionEvent::MatchResolved {
            success: true,
            combo: self.current_combo,
        });

        Ok(PowerupOutcome::Bomb {
            slots: [first, second],
            completed: self.matched.len() == self.board.len(),
        })
    }

    fn apply_glimpse(&mut self) -> PowerupOutcome {
        for token in [self.settle_timer.take(), self.glimpse_timer.take()]
            .into_iter()
            .flatten()
        {
            self.scheduler.cancel(token);
        }
        self.selection.clear();

        let unmatched = (0..self.board.len())
            .filter(|slot| !self.matched.contains(slot))
            .collect::<Vec<_>>();
        for &slot in &unmatched {
            if self.revealed.insert(slot) {
                self.events.push(SessionEvent::CardRevealed { slot });
            }
        }
        self.glimpse_timer = Some(
            self.scheduler
                .schedule_after(GLIMPSE_DURATION, Deferred::EndGlimpse),
        );

        PowerupOutcome::Glimpse {
            revealed: unmatched.len(),
        }
    }

    fn apply_skip(&mut self) -> PowerupOutcome {
        let forced = (0..self.board.len())
            .filter(|slot| !self.matched.contains(slot))
            .collect::<Vec<_>>();
        self.matched.extend(forced.iter().copied());
        self.revealed.clear();
        self.skipped = true;
        PowerupOutcome::Skip {
            forced_pairs: forced.len() / 2,
        }
    }
}
