//! Pending timers owned by one connection
//!
//! Ids come from a counter owned by the queue instance, so two connections
//! never share id space and tearing one down cannot touch the other's timers.

use std::time::Instant;

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Leave `Reconnecting` and start a fresh connect attempt
    Reconnect,
    /// Ask the host to refresh its snapshot data
    Poll,
}

/// Identifier of a scheduled timer, unique within its queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry {
    id: TimerId,
    kind: TimerKind,
    deadline: Instant,
}

/// At most a handful of timers are ever pending, so a flat vector is enough.
#[derive(Debug, Default)]
pub struct TimerQueue {
    entries: Vec<Entry>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer, replacing any pending timer of the same kind
    pub fn schedule(&mut self, kind: TimerKind, deadline: Instant) -> TimerId {
        self.cancel(kind);
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry { id, kind, deadline });
        id
    }

    /// Cancel the pending timer of this kind; returns whether one existed
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.kind != kind);
        before != self.entries.len()
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn pop_due(&mut self, now: Instant) -> Vec<(TimerId, TimerKind)> {
        let mut due: Vec<Entry> = Vec::new();
        self.entries.retain(|e| {
            if e.deadline <= now {
                due.push(e.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|e| (e.deadline, e.id));
        due.into_iter().map(|e| (e.id, e.kind)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
