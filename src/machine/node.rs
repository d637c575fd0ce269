//! Compiled state nodes.

use crate::core::{Action, Guard};
use std::time::Duration;

/// Index of a node inside its machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// No children
    Atomic,
    /// Exactly one child active at a time
    Compound,
    /// Every child active as an independent region
    Parallel,
}

/// One candidate of a transition rule.
pub struct Candidate<C> {
    pub(crate) target: Option<NodeId>,
    pub(crate) guard: Option<Guard<C>>,
    pub(crate) actions: Vec<Action<C>>,
}

impl<C> Candidate<C> {
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    pub fn guard(&self) -> Option<&Guard<C>> {
        self.guard.as_ref()
    }

    pub fn actions(&self) -> &[Action<C>] {
        &self.actions
    }

    /// Check if this candidate can fire for the given context (pure).
    pub fn is_enabled(&self, context: &C) -> bool {
        self.guard.as_ref().is_none_or(|g| g.check(context))
    }
}

/// Ordered candidates for one event.
pub struct TransitionRule<C> {
    pub(crate) event: String,
    pub(crate) candidates: Vec<Candidate<C>>,
}

impl<C> TransitionRule<C> {
    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn candidates(&self) -> &[Candidate<C>] {
        &self.candidates
    }

    /// First candidate whose guard is absent or holds.
    pub fn select(&self, context: &C) -> Option<&Candidate<C>> {
        self.candidates.iter().find(|candidate| {
            let enabled = candidate.is_enabled(context);
            if let Some(guard) = &candidate.guard {
                log::trace!("guard '{}' for '{}' -> {}", guard.name(), self.event, enabled);
            }
            enabled
        })
    }
}

/// Transition armed on entry and fired once `delay` has elapsed.
pub struct DelayedTransition<C> {
    pub(crate) delay: Duration,
    pub(crate) target: NodeId,
    pub(crate) actions: Vec<Action<C>>,
}

impl<C> DelayedTransition<C> {
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn actions(&self) -> &[Action<C>] {
        &self.actions
    }
}

/// A compiled, immutable state.
pub struct StateNode<C> {
    pub(crate) id: String,
    pub(crate) path: String,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) initial: Option<NodeId>,
    pub(crate) depth: usize,
    pub(crate) region: Option<usize>,
    pub(crate) rules: Vec<TransitionRule<C>>,
    pub(crate) entry: Vec<Action<C>>,
    pub(crate) exit: Vec<Action<C>>,
    pub(crate) after: Vec<DelayedTransition<C>>,
}

impl<C> StateNode<C> {
    /// Identifier, unique among siblings.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Dotted path from the root, root id included.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn initial(&self) -> Option<NodeId> {
        self.initial
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Region this node belongs to. `None` only for a parallel root.
    pub fn region(&self) -> Option<usize> {
        self.region
    }

    /// Rule declared on this node for `event`.
    pub fn rule(&self, event: &str) -> Option<&TransitionRule<C>> {
        self.rules.iter().find(|r| r.event == event)
    }

    pub fn rules(&self) -> &[TransitionRule<C>] {
        &self.rules
    }

    pub fn entry(&self) -> &[Action<C>] {
        &self.entry
    }

    pub fn exit(&self) -> &[Action<C>] {
        &self.exit
    }

    pub fn after(&self) -> &[DelayedTransition<C>] {
        &self.after
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
