//! Compiled, immutable statechart model.
//!
//! A [`Machine`] is an arena of [`StateNode`]s produced by
//! [`compile`](crate::builder::compile). It holds no runtime state and is
//! shared read-only by every [`Service`](crate::service::Service) created
//! from it.

mod definition;
mod node;

pub use definition::Machine;
pub use node::{Candidate, DelayedTransition, NodeId, NodeKind, StateNode, TransitionRule};
