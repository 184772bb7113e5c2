//! Deferred one-shot tasks on the simulation clock.
//!
//! Anything that should happen "N seconds from now" (clearing the player's
//! thought bubble, for one) is scheduled here and fires from
//! [`crate::kitchen::Kitchen::step`], never from a wall-clock timer.

use crate::fixed::Seconds;

/// Handle for cancelling a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Pending<T> {
    id: TaskId,
    due: Seconds,
    payload: T,
}

/// A queue of payloads that come due after a delay.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Seconds,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Seconds::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time accumulated by [`Self::advance`].
    pub fn now(&self) -> Seconds {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule `payload` to fire once `after` seconds have elapsed.
    pub fn schedule(&mut self, after: Seconds, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: self.now.saturating_add(after.max(Seconds::ZERO)),
            payload,
        });
        id
    }

    /// Cancel a task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|task| task.id != id);
        self.pending.len() != before
    }

    /// Advance the clock and return every payload that came due, earliest
    /// first (ties in scheduling order).
    pub fn advance(&mut self, dt: Seconds) -> Vec<T> {
        self.now = self.now.saturating_add(dt);
        let now = self.now;
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|task| task.due <= now);
        self.pending = waiting;
        due.sort_by_key(|task| (task.due, task.id));
        due.into_iter().map(|task| task.payload).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::secs;

    #[test]
    fn fires_once_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(secs(2.0), "late");
        scheduler.schedule(secs(1.0), "early");
        assert!(scheduler.advance(secs(0.5)).is_empty());
        assert_eq!(scheduler.advance(secs(2.0)), vec!["early", "late"]);
        assert!(scheduler.advance(secs(10.0)).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn cancelled_tasks_never_fire() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(secs(1.0), 7);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));
        assert!(scheduler.advance(secs(5.0)).is_empty());
    }

    #[test]
    fn zero_delay_fires_on_next_advance() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Seconds::ZERO, ());
        assert_eq!(scheduler.advance(Seconds::ZERO).len(), 1);
    }
}
