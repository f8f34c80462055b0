use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::LevelCatalog;

use super::{powerup::PowerupKind, scoring::ScoreBreakdown};

/// Number of recent runs kept in [`Progress::recent_runs`].
pub const RECENT_RUNS_LEN: usize = 10;

/// Power-ups owned by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerupInventory {
    pub bomb: u32,
    pub glimpse: u32,
    pub skip: u32,
}

impl PowerupInventory {
    #[must_use]
    pub fn count(&self, kind: PowerupKind) -> u32 {
        match kind {
            PowerupKind::Bomb => self.bomb,
            PowerupKind::Glimpse => self.glimpse,
            PowerupKind::Skip => self.skip,
        }
    }

    fn count_mut(&mut self, kind: PowerupKind) -> &mut u32 {
        match kind {
            PowerupKind::Bomb => &mut self.bomb,
            PowerupKind::Glimpse => &mut self.glimpse,
            PowerupKind::Skip => &mut self.skip,
        }
    }
}

/// One completed level, newest first in [`Progress::recent_runs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub level_id: u32,
    pub total: u32,
    pub elapsed_secs: u64,
}

/// Long-term player progress, owned by the store rather than the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    pub max_unlocked_level: u32,
    pub best_score_per_level: BTreeMap<u32, u32>,
    pub best_time_per_level: BTreeMap<u32, u64>,
    pub currency: u32,
    pub powerup_inventory: PowerupInventory,
    pub recent_runs: Vec<RunRecord>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            max_unlocked_level: 1,
            best_score_per_level: BTreeMap::new(),
            best_time_per_level: BTreeMap::new(),
            currency: 0,
            powerup_inventory: PowerupInventory::default(),
            recent_runs: vec![],
        }
    }
}

/// Capability through which the engine reads and updates player progress.
///
/// The engine never owns persistence: a session calls
/// [`Self::commit_session_result`] once on completion and the power-up
/// controller spends currency or inventory through the remaining methods.
pub trait ProgressStore {
    fn progress(&self) -> Progress;

    fn commit_session_result(&mut self, level_id: u32, score: &ScoreBreakdown, elapsed_secs: u64);

    /// Removes `amount` from the balance. Returns `false`, leaving the balance
    /// untouched, when it is too low.
    fn debit_currency(&mut self, amount: u32) -> bool;

    fn credit_currency(&mut self, amount: u32);

    /// Consumes one owned power-up. Returns `false` when none is owned.
    fn take_powerup(&mut self, kind: PowerupKind) -> bool;

    fn grant_powerup(&mut self, kind: PowerupKind, count: u32);

    /// Forgets the best score and best time recorded for `level_id`.
    /// Returns `false` when the level had no record.
    fn reset_level_best(&mut self, level_id: u32) -> bool;
}

impl<T> ProgressStore for &mut T
where
    T: ProgressStore + ?Sized,
{
    fn progress(&self) -> Progress {
        (**self).progress()
    }

    fn commit_session_result(&mut self, level_id: u32, score: &ScoreBreakdown, elapsed_secs: u64) {
        (**self).commit_session_result(level_id, score, elapsed_secs);
    }

    fn debit_currency(&mut self, amount: u32) -> bool {
        (**self).debit_currency(amount)
    }

    fn credit_currency(&mut self, amount: u32) {
        (**self).credit_currency(amount);
    }

    fn take_powerup(&mut self, kind: PowerupKind) -> bool {
        (**self).take_powerup(kind)
    }

    fn grant_powerup(&mut self, kind: PowerupKind, count: u32) {
        (**self).grant_powerup(kind, count);
    }

    fn reset_level_best(&mut self, level_id: u32) -> bool {
        (**self).reset_level_best(level_id)
    }
}

impl<T> ProgressStore for Box<T>
where
    T: ProgressStore + ?Sized,
{
    fn progress(&self) -> Progress {
        (**self).progress()
    }

    fn commit_session_result(&mut self, level_id: u32, score: &ScoreBreakdown, elapsed_secs: u64) {
        (**self).commit_session_result(level_id, score, elapsed_secs);
    }

    fn debit_currency(&mut self, amount: u32) -> bool {
        (**self).debit_currency(amount)
    }

    fn credit_currency(&mut self, amount: u32) {
        (**self).credit_currency(amount);
    }

    fn take_powerup(&mut self, kind: PowerupKind) -> bool {
        (**self).take_powerup(kind)
    }

    fn grant_powerup(&mut self, kind: PowerupKind, count: u32) {
        (**self).grant_powerup(kind, count);
    }

    fn reset_level_best(&mut self, level_id: u32) -> bool {
        (**self).reset_level_best(level_id)
    }
}

/// In-memory [`ProgressStore`].
///
/// Completing a level records the best score (higher wins) and best time
/// (lower wins), unlocks the following level and prepends a [`RunRecord`].
///
/// # Example
///
/// ```
/// use flipmatch_engine::{MemoryProgressStore, ProgressStore, ScoreBreakdown};
///
/// let mut store = MemoryProgressStore::default();
/// let score = ScoreBreakdown { total: 40, ..ScoreBreakdown::default() };
/// store.commit_session_result(1, &score, 12);
///
/// let progress = store.progress();
/// assert_eq!(progress.max_unlocked_level, 2);
/// assert_eq!(progress.best_score_per_level[&1], 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryProgressStore {
    progress: Progress,
    last_level: u32,
}

impl Default for MemoryProgressStore {
    fn default() -> Self {
        Self::new(LevelCatalog::STANDARD_LEN)
    }
}

impl MemoryProgressStore {
    /// Creates an empty store for a catalog whose last level is `last_level`.
    #[must_use]
    pub fn new(last_level: u32) -> Self {
        Self::from_progress(Progress::default(), last_level)
    }

    #[must_use]
    pub fn from_progress(progress: Progress, last_level: u32) -> Self {
        Self {
            progress,
            last_level,
        }
    }

    #[must_use]
    pub fn with_currency(mut self, currency: u32) -> Self {
        self.progress.currency = currency;
        self
    }

    #[must_use]
    pub fn with_powerups(mut self, kind: PowerupKind, count: u32) -> Self {
        self.grant_powerup(kind, count);
        self
    }

    #[must_use]
    pub fn get(&self) -> &Progress {
        &self.progress
    }

    #[must_use]
    pub fn into_progress(self) -> Progress {
        self.progress
    }
}

impl ProgressStore for MemoryProgressStore {
    fn progress(&self) -> Progress {
        self.progress.clone()
    }

    fn commit_session_result(&mut self, level_id: u32, score: &ScoreBreakdown, elapsed_secs: u64) {
        let progress = &mut self.progress;

        let best = progress.best_score_per_level.entry(level_id).or_insert(0);
        *best = (*best).max(score.total);

        progress
            .best_time_per_level
            .entry(level_id)
            .and_modify(|best| *best = (*best).min(elapsed_secs))
            .or_insert(elapsed_secs);

        if level_id >= progress.max_unlocked_level && level_id < self.last_level {
            progress.max_unlocked_level = level_id + 1;
        }

        progress.recent_runs.insert(
            0,
            RunRecord {
                level_id,
                total: score.total,
                elapsed_secs,
            },
        );
        progress.recent_runs.truncate(RECENT_RUNS_LEN);
    }

    fn debit_currency(&mut self, amount: u32) -> bool {
        let Some(balance) = self.progress.currency.checked_sub(amount) else {
            return false;
        };
        self.progress.currency = balance;
        true
    }

    fn credit_currency(&mut self, amount: u32) {
        self.progress.currency = self.progress.currency.saturating_add(amount);
    }

    fn take_powerup(&mut self, kind: PowerupKind) -> bool {
        let count = self.progress.powerup_inventory.count_mut(kind);
        let Some(remaining) = count.checked_sub(1) else {
            return false;
        };
        *count = remaining;
        true
    }

    fn grant_powerup(&mut self, kind: PowerupKind, count: u32) {
        let owned = self.progress.powerup_inventory.count_mut(kind);
        *owned = owned.saturating_add(count);
    }

    fn reset_level_best(&mut self, level_id: u32) -> bool {
        let progress = &mut self.progress;
        let score = progress.best_score_per_level.remove(&level_id);
        let time = progress.best_time_per_level.remove(&level_id);
        score.is_some() || time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(total: u32) -> ScoreBreakdown {
        ScoreBreakdown {
            total,
            ..ScoreBreakdown::default()
        }
    }

    #[test]
    fn test_best_score_keeps_highest() {
        let mut store = MemoryProgressStore::default();
        store.commit_session_result(3, &score(30), 20);
        store.commit_session_result(3, &score(10), 20);
        assert_eq!(store.get().best_score_per_level[&3], 30);
        store.commit_session_result(3, &score(45), 20);
        assert_eq!(store.get().best_score_per_level[&3], 45);
    }

    #[test]
    fn test_best_time_keeps_lowest() {
        let mut store = MemoryProgressStore::default();
        store.commit_session_result(2, &score(0), 20);
        store.commit_session_result(2, &score(0), 12);
        store.commit_session_result(2, &score(0), 15);
        assert_eq!(store.get().best_time_per_level[&2], 12);
    }

    #[test]
    fn test_unlocks_next_level_only_from_frontier() {
        let mut store = MemoryProgressStore::new(3);
        assert_eq!(store.get().max_unlocked_level, 1);
        store.commit_session_result(1, &score(1), 1);
        assert_eq!(store.get().max_unlocked_level, 2);
        // Replaying an earlier level does not move the frontier.
        store.commit_session_result(1, &score(1), 1);
        assert_eq!(store.get().max_unlocked_level, 2);
        store.commit_session_result(2, &score(1), 1);
        assert_eq!(store.get().max_unlocked_level, 3);
        // The last level unlocks nothing further.
        store.commit_session_result(3, &score(1), 1);
        assert_eq!(store.get().max_unlocked_level, 3);
    }

    #[test]
    fn test_recent_runs_are_bounded_and_newest_first() {
        let mut store = MemoryProgressStore::default();
        for level_id in 1..=12 {
            store.commit_session_result(level_id, &score(level_id), 5);
        }
        let runs = &store.get().recent_runs;
        assert_eq!(runs.len(), RECENT_RUNS_LEN);
        assert_eq!(runs[0].level_id, 12);
        assert_eq!(runs[9].level_id, 3);
    }

    #[test]
    fn test_reset_level_best_only_touches_that_level() {
        let mut store = MemoryProgressStore::default();
        store.commit_session_result(1, &score(20), 8);
        store.commit_session_result(2, &score(35), 11);

        assert!(store.reset_level_best(1));
        let progress = store.get();
        assert!(!progress.best_score_per_level.contains_key(&1));
        assert!(!progress.best_time_per_level.contains_key(&1));
        assert_eq!(progress.best_score_per_level[&2], 35);
        assert_eq!(progress.best_time_per_level[&2], 11);
        assert_eq!(progress.max_unlocked_level, 3);
        assert_eq!(progress.recent_runs.len(), 2);

        assert!(!store.reset_level_best(1));
        store.commit_session_result(1, &score(5), 30);
        assert_eq!(store.get().best_score_per_level[&1], 5);
    }

    #[test]
    fn test_currency() {
        let mut store = MemoryProgressStore::default().with_currency(100);
        assert!(store.debit_currency(60));
        assert!(!store.debit_currency(60));
        assert_eq!(store.get().currency, 40);
        store.credit_currency(5);
        assert_eq!(store.get().currency, 45);
    }

    #[test]
    fn test_inventory() {
        let mut store = MemoryProgressStore::default().with_powerups(PowerupKind::Bomb, 1);
        assert!(!store.take_powerup(PowerupKind::Skip));
        assert!(store.take_powerup(PowerupKind::Bomb));
        assert!(!store.take_powerup(PowerupKind::Bomb));
        store.grant_powerup(PowerupKind::Glimpse, 2);
        assert_eq!(store.get().powerup_inventory.count(PowerupKind::Glimpse), 2);
    }

    #[test]
    fn test_store_through_mutable_reference() {
        fn credit<S: ProgressStore>(mut store: S) {
            store.credit_currency(7);
        }

        let mut store = MemoryProgressStore::default();
        credit(&mut store);
        credit(Box::new(&mut store));
        assert_eq!(store.get().currency, 14);
    }

    #[test]
    fn test_progress_json_defaults() {
        let progress: Progress = serde_json::from_str(r#"{"currency": 12}"#).unwrap();
        assert_eq!(progress.currency, 12);
        assert_eq!(progress.max_unlocked_level, 1);
        assert!(progress.recent_runs.is_empty());
    }
}
