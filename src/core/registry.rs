//! Named guard and action implementations supplied by the host.
//!
//! Machine configurations refer to guards and actions by name so they can
//! be written as plain data (JSON or the fluent config builder). The
//! registry resolves those names to closures when the machine is compiled.

use super::action::{Action, ActionContext, ActionError};
use super::guard::Guard;
use std::collections::HashMap;

/// Registry of guard predicates and action callbacks for context `C`.
///
/// # Example
///
/// ```rust
/// use stagecraft::core::Implementations;
///
/// struct Fighter {
///     attacking: bool,
/// }
///
/// let implementations = Implementations::new()
///     .guard("attacking?", |f: &Fighter| f.attacking)
///     .action("play-swing", |_ctx| Ok(()));
///
/// assert!(implementations.find_guard("attacking?").is_some());
/// assert!(implementations.find_action("play-swing").is_some());
/// assert!(implementations.find_guard("blocking?").is_none());
/// ```
pub struct Implementations<C> {
    guards: HashMap<String, Guard<C>>,
    actions: HashMap<String, Action<C>>,
}

impl<C> Implementations<C> {
    pub fn new() -> Self {
        Self {
            guards: HashMap::new(),
            actions: HashMap::new(),
        }
    }

    /// Register a guard predicate. A later registration replaces an earlier
    /// one with the same name.
    pub fn guard<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&C) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        self.guards.insert(name.clone(), Guard::new(name, predicate));
        self
    }

    /// Register an action callback. A later registration replaces an earlier
    /// one with the same name.
    pub fn action<F>(mut self, name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.actions.insert(name.clone(), Action::new(name, run));
        self
    }

    pub fn find_guard(&self, name: &str) -> Option<&Guard<C>> {
        self.guards.get(name)
    }

    pub fn find_action(&self, name: &str) -> Option<&Action<C>> {
        self.actions.get(name)
    }
}

impl<C> Default for Implementations<C> {
    fn default() -> Self {
        Self::new()
    }
}
