//! Host-advanced time source with a watch arena.

use std::time::Duration;

/// Returned by a watch callback to keep or drop its subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchControl {
    Continue,
    Release,
}

/// Handle to a registered watch.
///
/// Tokens are generational: once a watch is released its token goes stale,
/// even if the slot is reused by a later watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchToken {
    index: usize,
    generation: u64,
}

type WatchFn = Box<dyn FnMut(Duration) -> WatchControl>;

struct Slot {
    generation: u64,
    watch: Option<WatchFn>,
}

/// Time source that notifies watches whenever the host advances it.
///
/// # Example
///
/// ```rust
/// use stagecraft::watch::{Clock, WatchControl};
/// use std::time::Duration;
///
/// let mut clock = Clock::new();
/// let token = clock.watch(|now| {
///     if now >= Duration::from_millis(100) {
///         WatchControl::Release
///     } else {
///         WatchControl::Continue
///     }
/// });
///
/// clock.advance_by(Duration::from_millis(60));
/// assert!(clock.is_watching(token));
///
/// clock.advance_by(Duration::from_millis(60));
/// assert!(!clock.is_watching(token));
/// assert!(!clock.release(token));
/// ```
#[derive(Default)]
pub struct Clock {
    now: Duration,
    slots: Vec<Slot>,
    free: Vec<usize>,
    active: usize,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Register a callback invoked with the new time on every advance.
    pub fn watch<F>(&mut self, watch: F) -> WatchToken
    where
        F: FnMut(Duration) -> WatchControl + 'static,
    {
        let watch: WatchFn = Box::new(watch);
        self.active += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.watch = Some(watch);
            return WatchToken {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            watch: Some(watch),
        });
        WatchToken {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Remove a watch. Returns false for a token already released.
    pub fn release(&mut self, token: WatchToken) -> bool {
        if !self.is_watching(token) {
            return false;
        }
        self.vacate(token.index);
        true
    }

    pub fn is_watching(&self, token: WatchToken) -> bool {
        self.slots
            .get(token.index)
            .is_some_and(|slot| slot.generation == token.generation && slot.watch.is_some())
    }

    /// Number of live watches.
    pub fn watch_count(&self) -> usize {
        self.active
    }

    /// Move time to `now` and notify every watch in registration slot order.
    ///
    /// Returns how many watches were notified. Time never moves backwards.
    pub fn advance_to(&mut self, now: Duration) -> usize {
        if now < self.now {
            log::warn!("clock ignoring time {:?} earlier than {:?}", now, self.now);
            return 0;
        }
        self.now = now;

        let mut notified = 0;
        for index in 0..self.slots.len() {
            let Some(mut watch) = self.slots[index].watch.take() else {
                continue;
            };
            notified += 1;
            match watch(now) {
                WatchControl::Continue => self.slots[index].watch = Some(watch),
                WatchControl::Release => self.vacate(index),
            }
        }
        notified
    }

    pub fn advance_by(&mut self, elapsed: Duration) -> usize {
        self.advance_to(self.now.saturating_add(elapsed))
    }

    fn vacate(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        slot.watch = None;
        slot.generation += 1;
        self.free.push(index);
        self.active -= 1;
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("now", &self.now)
            .field("watches", &self.active)
            .finish()
    }
}

/// Tokens owned by one component, released together on teardown.
#[derive(Debug, Default)]
pub struct WatchSet {
    tokens: Vec<WatchToken>,
}

impl WatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: WatchToken) {
        self.tokens.push(token);
    }

    /// Release every owned watch still registered. Returns how many were
    /// live; tokens that already went stale are skipped.
    pub fn release_all(&mut self, clock: &mut Clock) -> usize {
        self.tokens
            .drain(..)
            .filter(|token| clock.release(*token))
            .count()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Drop for WatchSet {
    fn drop(&mut self) {
        if !self.tokens.is_empty() {
            log::warn!(
                "watch set dropped holding {} tokens; call release_all on teardown",
                self.tokens.len()
            );
        }
    }
}
