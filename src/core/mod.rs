//! Host-facing building blocks of the engine.
//!
//! This module contains the pieces the host plugs into a machine:
//! - Guard predicates evaluated against the host context
//! - Actions invoked on entry, exit, transition and timer firing
//! - The named registry that configurations resolve against
//! - Bounded transition history

mod action;
mod guard;
mod history;
mod registry;

pub use action::{Action, ActionContext, ActionError, ActionFn, ActionKind};
pub use guard::Guard;
pub use history::{TransitionHistory, TransitionRecord, Trigger, DEFAULT_HISTORY_CAPACITY};
pub use registry::Implementations;
