//! Transition history tracking.
//!
//! Every committed region transition is recorded with the engine time it
//! happened at and a wall-clock timestamp, so hosts can inspect what the
//! animation state did over the last frames.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of records kept by a [`TransitionHistory`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// What caused a transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trigger {
    /// An event sent by the host or raised by an action
    Event(String),
    /// A delayed transition whose deadline elapsed
    Timer { delay: Duration },
}

/// Record of a single region transition.
///
/// # Example
///
/// ```rust
/// use stagecraft::core::{TransitionRecord, Trigger};
/// use chrono::Utc;
/// use std::time::Duration;
///
/// let record = TransitionRecord {
///     region: "upper-body".to_string(),
///     from: vec!["upper-body".to_string(), "attack-idle".to_string()],
///     to: vec!["upper-body".to_string(), "attack-start".to_string()],
///     trigger: Trigger::Event("tick".to_string()),
///     at: Duration::from_millis(16),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(record.to_leaf(), Some("attack-start"));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Region the transition happened in
    pub region: String,
    /// Active path before the transition
    pub from: Vec<String>,
    /// Active path after the transition
    pub to: Vec<String>,
    /// What caused the transition
    pub trigger: Trigger,
    /// Engine time when the transition was committed
    pub at: Duration,
    /// Wall-clock time when the transition was committed
    pub timestamp: DateTime<Utc>,
}

impl TransitionRecord {
    pub fn from_leaf(&self) -> Option<&str> {
        self.from.last().map(String::as_str)
    }

    pub fn to_leaf(&self) -> Option<&str> {
        self.to.last().map(String::as_str)
    }
}

/// Bounded, ordered history of region transitions.
///
/// Once full, recording a transition evicts the oldest one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: VecDeque<TransitionRecord>,
    capacity: usize,
}

impl Default for TransitionHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionHistory {
    /// Create an empty history holding [`DEFAULT_HISTORY_CAPACITY`] records.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty history holding at most `capacity` records.
    /// A capacity of zero disables recording.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    pub fn record(&mut self, record: TransitionRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Records in the order they happened, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    /// Records for a single region, oldest first.
    pub fn for_region<'a>(
        &'a self,
        region: &'a str,
    ) -> impl Iterator<Item = &'a TransitionRecord> + 'a {
        self.records.iter().filter(move |r| r.region == region)
    }

    /// Leaves a region went through: the leaf before the first recorded
    /// transition, then the target leaf of each transition.
    pub fn leaf_path(&self, region: &str) -> Vec<&str> {
        let mut path = Vec::new();
        let mut records = self
            .records
            .iter()
            .filter(|r| r.region == region)
            .peekable();
        if let Some(leaf) = records.peek().copied().and_then(TransitionRecord::from_leaf) {
            path.push(leaf);
        }
        for record in records {
            if let Some(leaf) = record.to_leaf() {
                path.push(leaf);
            }
        }
        path
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
