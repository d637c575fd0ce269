//! Side-effecting callbacks run on entry, exit, transition and timer firing.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Why the engine invoked an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// The owning state was entered
    Entry,
    /// The owning state was exited
    Exit,
    /// The action is attached to the candidate that matched an event
    Transition,
    /// The action is attached to a delayed transition that fired
    Timer,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::Transition => "transition",
            Self::Timer => "timer",
        };
        f.write_str(s)
    }
}

/// Error returned by a host action.
///
/// Aborts the transition in progress, see [`crate::service::ServiceError::ActionFailed`].
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Everything an action can see while it runs.
///
/// The host context is shared read-only. Events raised here are queued and
/// processed after the current `send` or timer firing completes.
pub struct ActionContext<'a, C> {
    context: &'a C,
    kind: ActionKind,
    state: &'a str,
    raised: &'a mut VecDeque<String>,
}

impl<'a, C> ActionContext<'a, C> {
    pub(crate) fn new(
        context: &'a C,
        kind: ActionKind,
        state: &'a str,
        raised: &'a mut VecDeque<String>,
    ) -> Self {
        Self {
            context,
            kind,
            state,
            raised,
        }
    }

    /// The host context.
    pub fn context(&self) -> &C {
        self.context
    }

    /// Which kind of invocation triggered this action.
    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    /// Id of the state the action is attached to. For transition actions
    /// this is the state that declared the matched rule.
    pub fn state(&self) -> &str {
        self.state
    }

    /// Queue an event for processing once the current step completes.
    pub fn raise(&mut self, event: impl Into<String>) {
        self.raised.push_back(event.into());
    }
}

/// Type alias for action callbacks.
pub type ActionFn<C> =
    dyn Fn(&mut ActionContext<'_, C>) -> Result<(), ActionError> + Send + Sync;

/// A named side-effecting callback.
///
/// # Example
///
/// ```rust
/// use stagecraft::core::{Action, ActionKind};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let hits = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&hits);
/// let hit: Action<()> = Action::new("hit", move |ctx| {
///     assert_eq!(ctx.kind(), ActionKind::Timer);
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// });
/// assert_eq!(hit.name(), "hit");
/// ```
pub struct Action<C> {
    name: String,
    run: Arc<ActionFn<C>>,
}

impl<C> Action<C> {
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(&mut ActionContext<'_, C>) -> Result<(), ActionError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn invoke(&self, ctx: &mut ActionContext<'_, C>) -> Result<(), ActionError> {
        (self.run)(ctx)
    }
}

impl<C> Clone for Action<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            run: Arc::clone(&self.run),
        }
    }
}

impl<C> fmt::Debug for Action<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}
