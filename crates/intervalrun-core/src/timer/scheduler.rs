//! Cancelable one-shot and repeating triggers on a caller-driven clock.
//!
//! The scheduler owns no thread and reads no clock. Deadlines are absolute
//! milliseconds on whatever monotonic timeline the caller uses; the caller
//! pulls due triggers with [`Scheduler::pop_due`].
//!
//! Repeating triggers are re-armed at `deadline + period`, so a late caller
//! receives every missed deadline in order instead of drifting.

use std::collections::BTreeMap;

/// Opaque handle returned when a trigger is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TimerHandle,
    task: T,
    period_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    /// Keyed by (deadline, handle) so equal deadlines fire in scheduling order.
    queue: BTreeMap<(u64, TimerHandle), Entry<T>>,
    next_id: u64,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn schedule_once(&mut self, deadline_ms: u64, task: T) -> TimerHandle {
        self.insert(deadline_ms, task, None)
    }

    /// First fires at `first_deadline_ms`, then every `period_ms`.
    pub fn schedule_repeating(&mut self, first_deadline_ms: u64, period_ms: u64, task: T) -> TimerHandle {
        self.insert(first_deadline_ms, task, Some(period_ms.max(1)))
    }

    /// Cancel a trigger. Returns false if it already fired or was unknown.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let key = self
            .queue
            .iter()
            .find(|(_, e)| e.handle == handle)
            .map(|(k, _)| *k);
        match key {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.queue.values().any(|e| e.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return the earliest trigger due at or before `now_ms`,
    /// together with its deadline. Repeating triggers are re-armed.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, TimerHandle, T)> {
        let (&(deadline, handle), _) = self.queue.iter().next()?;
        if deadline > now_ms {
            return None;
        }
        let entry = self.queue.remove(&(deadline, handle))?;
        if let Some(period) = entry.period_ms {
            self.queue.insert((deadline + period, handle), entry.clone());
        }
        Some((deadline, handle, entry.task))
    }

    fn insert(&mut self, deadline_ms: u64, task: T, period_ms: Option<u64>) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.queue.insert(
            (deadline_ms, handle),
            Entry {
                handle,
                task,
                period_ms,
            },
        );
        handle
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
