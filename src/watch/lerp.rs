//! Time-based interpolation driven by a [`Clock`].

use super::clock::{Clock, WatchControl, WatchToken};
use std::time::Duration;

/// Normalized progress over a time span.
///
/// # Example
///
/// ```rust
/// use stagecraft::watch::Lerp;
/// use std::time::Duration;
///
/// let lerp = Lerp::new(Duration::from_millis(100), Duration::from_millis(200));
///
/// assert_eq!(lerp.fraction(Duration::from_millis(50)), 0.0);
/// assert_eq!(lerp.fraction(Duration::from_millis(200)), 0.5);
/// assert_eq!(lerp.fraction(Duration::from_millis(900)), 1.0);
/// assert_eq!(lerp.interpolate(10.0, 20.0, Duration::from_millis(200)), 15.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lerp {
    start: Duration,
    duration: Duration,
}

impl Lerp {
    pub fn new(start: Duration, duration: Duration) -> Self {
        Self { start, duration }
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Elapsed fraction clamped to `[0, 1]`. A zero duration is complete.
    pub fn fraction(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self, now: Duration) -> bool {
        now >= self.start.saturating_add(self.duration)
    }

    pub fn interpolate(&self, from: f64, to: f64, now: Duration) -> f64 {
        from + (to - from) * self.fraction(now)
    }

    /// Report the fraction on every clock advance until it reaches 1.
    ///
    /// The span starts at the clock's current time. The watch releases
    /// itself after reporting 1; [`LerpHandle::halt`] releases it earlier.
    pub fn watch<F>(clock: &mut Clock, duration: Duration, mut on_value: F) -> LerpHandle
    where
        F: FnMut(f64) + 'static,
    {
        let lerp = Lerp::new(clock.now(), duration);
        let token = clock.watch(move |now| {
            let value = lerp.fraction(now);
            on_value(value);
            if value >= 1.0 {
                WatchControl::Release
            } else {
                WatchControl::Continue
            }
        });
        LerpHandle { token, lerp }
    }
}

/// Release hook for a running [`Lerp::watch`].
#[derive(Debug)]
#[must_use = "a lerp watch keeps running until halted or complete"]
pub struct LerpHandle {
    token: WatchToken,
    lerp: Lerp,
}

impl LerpHandle {
    pub fn token(&self) -> WatchToken {
        self.token
    }

    pub fn lerp(&self) -> Lerp {
        self.lerp
    }

    /// Stop the watch. Returns false if it had already completed.
    pub fn halt(self, clock: &mut Clock) -> bool {
        clock.release(self.token)
    }
}
