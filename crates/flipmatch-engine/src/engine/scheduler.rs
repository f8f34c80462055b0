use std::time::Duration;

/// Handle to a scheduled action, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    due: Duration,
    token: TimerToken,
    action: T,
}

/// Virtual-time queue of deferred actions.
///
/// The scheduler never looks at a wall clock: time only moves when the owner
/// calls [`Self::advance_to`]. Due actions are then handed back one by one
/// through [`Self::pop_due`], earliest first, ties in scheduling order.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use flipmatch_engine::Scheduler;
///
/// let mut scheduler = Scheduler::new();
/// let hide = scheduler.schedule_after(Duration::from_secs(1), "hide");
/// scheduler.schedule_after(Duration::from_secs(5), "end glimpse");
///
/// scheduler.advance_to(Duration::from_secs(2));
/// assert_eq!(scheduler.pop_due(), Some("hide"));
/// assert_eq!(scheduler.pop_due(), None);
/// assert!(!scheduler.cancel(hide));
/// ```
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: Duration,
    next_token: u64,
    pending: Vec<Scheduled<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_token: 0,
            pending: Vec::new(),
        }
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Schedules `action` to become due `delay` after the current time.
    pub fn schedule_after(&mut self, delay: Duration, action: T) -> TimerToken {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        let due = self.now.saturating_add(delay);
        // Keep `pending` sorted by (due, token); new tokens are always the largest.
        let index = self.pending.partition_point(|s| s.due <= due);
        self.pending.insert(index, Scheduled { due, token, action });
        token
    }

    /// Cancels a pending action. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        let Some(index) = self.pending.iter().position(|s| s.token == token) else {
            return false;
        };
        self.pending.remove(index);
        true
    }

    /// Cancels every pending action.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    #[must_use]
    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|s| s.token == token)
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Time at which `token` becomes due, if it is still pending.
    #[must_use]
    pub fn due_time(&self, token: TimerToken) -> Option<Duration> {
        self.pending
            .iter()
            .find(|s| s.token == token)
            .map(|s| s.due)
    }

    /// Due time of the earliest pending action.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.first().map(|s| s.due)
    }

    /// Moves the clock forward. Moving backwards is ignored.
    pub fn advance_to(&mut self, time: Duration) {
        self.now = self.now.max(time);
    }

    /// Removes and returns the earliest action that is due at the current time.
    pub fn pop_due(&mut self) -> Option<T> {
        if self.pending.first()?.due > self.now {
            return None;
        }
        Some(self.pending.remove(0).action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(secs(5), 'c');
        scheduler.schedule_after(secs(1), 'a');
        scheduler.schedule_after(secs(3), 'b');

        scheduler.advance_to(secs(10));
        let fired = std::iter::from_fn(|| scheduler.pop_due()).collect::<String>();
        assert_eq!(fired, "abc");
    }

    #[test]
    fn test_ties_fire_in_scheduling_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(secs(1), 1);
        scheduler.schedule_after(secs(1), 2);
        scheduler.advance_to(secs(1));
        assert_eq!(scheduler.pop_due(), Some(1));
        assert_eq!(scheduler.pop_due(), Some(2));
    }

    #[test]
    fn test_not_due_until_time_reached() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(secs(1), ());
        scheduler.advance_to(Duration::from_millis(999));
        assert_eq!(scheduler.pop_due(), None);
        scheduler.advance_to(secs(1));
        assert_eq!(scheduler.pop_due(), Some(()));
    }

    #[test]
    fn test_delay_is_relative_to_now() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(secs(10));
        let token = scheduler.schedule_after(secs(5), ());
        assert_eq!(scheduler.due_time(token), Some(secs(15)));
        assert_eq!(scheduler.next_due(), Some(secs(15)));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.schedule_after(secs(1), 'a');
        scheduler.schedule_after(secs(2), 'b');
        assert!(scheduler.cancel(first));
        assert!(!scheduler.cancel(first));
        assert!(!scheduler.is_pending(first));

        scheduler.advance_to(secs(3));
        assert_eq!(scheduler.pop_due(), Some('b'));
        assert_eq!(scheduler.pop_due(), None);
    }

    #[test]
    fn test_cancel_all() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_after(secs(1), ());
        scheduler.schedule_after(secs(2), ());
        scheduler.cancel_all();
        assert_eq!(scheduler.pending_len(), 0);
        scheduler.advance_to(secs(5));
        assert_eq!(scheduler.pop_due(), None);
    }

    #[test]
    fn test_clock_never_moves_backwards() {
        let mut scheduler = Scheduler::<()>::new();
        scheduler.advance_to(secs(4));
        scheduler.advance_to(secs(2));
        assert_eq!(scheduler.now(), secs(4));
    }

    #[test]
    fn test_delay_saturates_at_end_of_time() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_to(Duration::MAX);
        scheduler.schedule_after(secs(1), 'a');
        assert_eq!(scheduler.next_due(), Some(Duration::MAX));
        assert_eq!(scheduler.pop_due(), Some('a'));
    }
}
