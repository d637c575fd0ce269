//! Delayed-transition scheduling.
//!
//! Timers are armed when a state with `after` specs is entered and
//! cancelled when that state is exited. Due timers are handed out one at a
//! time in deadline order, ties broken by arming order.

use crate::machine::NodeId;
use std::collections::BTreeMap;
use std::time::Duration;

/// A delayed transition waiting for its deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArmedTimer {
    pub(crate) owner: NodeId,
    pub(crate) index: usize,
    pub(crate) region: usize,
    pub(crate) deadline: Duration,
    pub(crate) sequence: u64,
}

impl ArmedTimer {
    /// State that armed the timer.
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Index of the delayed transition on the owning state.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn region(&self) -> usize {
        self.region
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Arming order, unique per scheduler.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Armed timers ordered by `(deadline, sequence)`.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    timers: BTreeMap<(Duration, u64), ArmedTimer>,
    next_sequence: u64,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, owner: NodeId, index: usize, region: usize, deadline: Duration) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.timers.insert(
            (deadline, sequence),
            ArmedTimer {
                owner,
                index,
                region,
                deadline,
                sequence,
            },
        );
        sequence
    }

    /// Cancel every timer armed by `owner`. Returns how many were removed.
    pub fn cancel_owner(&mut self, owner: NodeId) -> usize {
        let before = self.timers.len();
        self.timers.retain(|_, timer| timer.owner != owner);
        before - self.timers.len()
    }

    /// Remove and return the earliest timer whose deadline is at or before
    /// `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<ArmedTimer> {
        let (&key, _) = self.timers.first_key_value()?;
        if key.0 > now {
            return None;
        }
        self.timers.remove(&key)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Timers in firing order.
    pub fn iter(&self) -> impl Iterator<Item = &ArmedTimer> {
        self.timers.values()
    }

    /// Drop every timer. Returns how many were released.
    pub fn clear(&mut self) -> usize {
        let released = self.timers.len();
        self.timers.clear();
        released
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
