//! Guard predicates for controlling state transitions.
//!
//! Guards are pure boolean functions over the host context. The engine
//! evaluates them top-to-bottom when a rule matches an event and fires the
//! first candidate whose guard holds.

use std::fmt;
use std::sync::Arc;

/// Pure predicate that decides whether a candidate transition fires.
///
/// Guards read the host context (game state, input flags, timers owned by
/// the host). They must not rely on the active state of sibling regions.
///
/// # Example
///
/// ```rust
/// use stagecraft::core::Guard;
///
/// struct Player {
///     speed: f32,
/// }
///
/// let moving = Guard::new("moving?", |p: &Player| p.speed > 0.0);
///
/// assert!(moving.check(&Player { speed: 2.5 }));
/// assert!(!moving.check(&Player { speed: 0.0 }));
/// assert_eq!(moving.name(), "moving?");
/// ```
pub struct Guard<C> {
    name: String,
    predicate: Arc<dyn Fn(&C) -> bool + Send + Sync>,
}

impl<C> Guard<C> {
    /// Create a named guard from a pure predicate function.
    ///
    /// The predicate must be deterministic for a given context and
    /// thread-safe (Send + Sync).
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        Guard {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Name the guard was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the predicate against the host context.
    pub fn check(&self, context: &C) -> bool {
        (self.predicate)(context)
    }
}

impl<C> Clone for Guard<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> fmt::Debug for Guard<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").field("name", &self.name).finish()
    }
}
