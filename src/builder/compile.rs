//! Compilation of a [`StateConfig`] tree into a [`Machine`].
//!
//! Every check runs on the whole tree and all violations are accumulated
//! with stillwater's `Validation`, so a broken configuration is reported in
//! a single pass instead of one error at a time.

use crate::builder::config::StateConfig;
use crate::builder::error::{ConfigurationError, ConfigurationErrors};
use crate::core::{Action, Guard, Implementations};
use crate::machine::{
    Candidate, DelayedTransition, Machine, NodeId, NodeKind, StateNode, TransitionRule,
};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigurationError>>;

enum TargetSlot {
    Candidate { rule: usize, candidate: usize },
    Delayed(usize),
}

struct PendingTarget {
    node: NodeId,
    slot: TargetSlot,
    target: String,
}

struct Compiler<'a, C> {
    implementations: &'a Implementations<C>,
    nodes: Vec<StateNode<C>>,
    regions: Vec<NodeId>,
    pending: Vec<PendingTarget>,
    checks: Vec<Check>,
}

/// Compile a configuration tree into an immutable machine.
///
/// Guard and action names are resolved against `implementations`. Returns
/// every problem found in the tree when the configuration is invalid.
///
/// # Example
///
/// ```rust
/// use stagecraft::builder::{compile, CandidateConfig, StateConfig};
/// use stagecraft::core::Implementations;
///
/// struct Game {
///     moving: bool,
/// }
///
/// let config = StateConfig::new("lower-body")
///     .initial("idle")
///     .state(StateConfig::new("idle").on("tick", CandidateConfig::to("run").guard("moving?")))
///     .state(StateConfig::new("run"));
///
/// let implementations = Implementations::new().guard("moving?", |g: &Game| g.moving);
/// let machine = compile(&config, &implementations).unwrap();
/// assert_eq!(machine.id(), "lower-body");
///
/// let broken = StateConfig::new("lower-body")
///     .state(StateConfig::new("idle").on("tick", CandidateConfig::to("fly")));
/// let errors = compile(&broken, &implementations).unwrap_err();
/// assert_eq!(errors.len(), 2); // missing initial, unknown target
/// ```
pub fn compile<C>(
    config: &StateConfig,
    implementations: &Implementations<C>,
) -> Result<Machine<C>, ConfigurationErrors> {
    let mut compiler = Compiler {
        implementations,
        nodes: Vec::new(),
        regions: Vec::new(),
        pending: Vec::new(),
        checks: vec![Validation::success(())],
    };
    compiler.add_node(config, None);
    compiler.resolve_targets();
    compiler.finish()
}

impl<C> Compiler<'_, C> {
    fn fail(&mut self, error: ConfigurationError) {
        self.checks.push(Validation::fail(error));
    }

    fn add_node(&mut self, config: &StateConfig, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent_path = parent.map(|p| self.nodes[p.0].path.clone());
        let path = match &parent_path {
            Some(parent_path) => format!("{parent_path}.{}", config.id),
            None => config.id.clone(),
        };

        if config.id.trim().is_empty() {
            self.fail(ConfigurationError::EmptyId {
                parent: parent_path.unwrap_or_default(),
            });
        }

        let kind = if !config.regions.is_empty() {
            if !config.states.is_empty() {
                self.fail(ConfigurationError::ConflictingChildren {
                    state: path.clone(),
                });
            }
            NodeKind::Parallel
        } else if !config.states.is_empty() {
            NodeKind::Compound
        } else {
            NodeKind::Atomic
        };

        if kind == NodeKind::Parallel {
            if parent.is_some() {
                self.fail(ConfigurationError::NestedParallel {
                    state: path.clone(),
                });
            } else if !config.on.is_empty() || !config.after.is_empty() {
                self.fail(ConfigurationError::ParallelTransitions {
                    state: path.clone(),
                });
            }
        }

        let region = match parent {
            None if kind == NodeKind::Parallel => None,
            None => {
                self.regions.push(id);
                Some(0)
            }
            Some(p) if self.nodes[p.0].kind == NodeKind::Parallel => {
                if kind != NodeKind::Compound {
                    self.fail(ConfigurationError::RegionWithoutInitial {
                        region: path.clone(),
                    });
                }
                self.regions.push(id);
                Some(self.regions.len() - 1)
            }
            Some(p) => self.nodes[p.0].region,
        };

        let entry = self.resolve_actions(&path, &config.entry);
        let exit = self.resolve_actions(&path, &config.exit);

        let mut rules = Vec::with_capacity(config.on.len());
        for (rule, (event, candidates)) in config.on.iter().enumerate() {
            let mut compiled = Vec::with_capacity(candidates.len());
            for (candidate, declared) in candidates.iter().enumerate() {
                if let Some(target) = &declared.target {
                    self.pending.push(PendingTarget {
                        node: id,
                        slot: TargetSlot::Candidate { rule, candidate },
                        target: target.clone(),
                    });
                }
                let guard = match &declared.guard {
                    Some(name) => self.resolve_guard(&path, name),
                    None => None,
                };
                compiled.push(Candidate {
                    target: None,
                    guard,
                    actions: self.resolve_actions(&path, &declared.actions),
                });
            }
            rules.push(TransitionRule {
                event: event.clone(),
                candidates: compiled,
            });
        }

        let mut after = Vec::with_capacity(config.after.len());
        for (index, declared) in config.after.iter().enumerate() {
            if declared.delay == 0 {
                self.fail(ConfigurationError::ZeroDelay {
                    state: path.clone(),
                    target: declared.target.clone(),
                });
            }
            self.pending.push(PendingTarget {
                node: id,
                slot: TargetSlot::Delayed(index),
                target: declared.target.clone(),
            });
            after.push(DelayedTransition {
                delay: declared.delay(),
                target: id,
                actions: self.resolve_actions(&path, &declared.actions),
            });
        }

        let depth = parent.map_or(0, |p| self.nodes[p.0].depth + 1);
        self.nodes.push(StateNode {
            id: config.id.clone(),
            path: path.clone(),
            kind,
            parent,
            children: Vec::new(),
            initial: None,
            depth,
            region,
            rules,
            entry,
            exit,
            after,
        });

        let child_configs = if kind == NodeKind::Parallel {
            &config.regions
        } else {
            &config.states
        };
        let mut seen = HashSet::new();
        let mut children = Vec::with_capacity(child_configs.len());
        for child in child_configs {
            if !seen.insert(child.id.as_str()) {
                self.fail(ConfigurationError::DuplicateState {
                    parent: path.clone(),
                    id: child.id.clone(),
                });
            }
            children.push(self.add_node(child, Some(id)));
        }

        let initial = match (kind, &config.initial) {
            (NodeKind::Compound, None) => {
                self.fail(ConfigurationError::MissingInitial { state: path });
                None
            }
            (NodeKind::Compound, Some(name)) => {
                let found = children
                    .iter()
                    .copied()
                    .find(|c| self.nodes[c.0].id == *name);
                if found.is_none() {
                    self.fail(ConfigurationError::UnknownInitial {
                        state: path,
                        initial: name.clone(),
                    });
                }
                found
            }
            (_, Some(name)) => {
                self.fail(ConfigurationError::UnexpectedInitial {
                    state: path,
                    initial: name.clone(),
                });
                None
            }
            (_, None) => None,
        };

        let node = &mut self.nodes[id.0];
        node.children = children;
        node.initial = initial;
        id
    }

    fn resolve_guard(&mut self, path: &str, name: &str) -> Option<Guard<C>> {
        let guard = self.implementations.find_guard(name).cloned();
        if guard.is_none() {
            self.fail(ConfigurationError::UnknownGuard {
                state: path.to_string(),
                guard: name.to_string(),
            });
        }
        guard
    }

    fn resolve_actions(&mut self, path: &str, names: &[String]) -> Vec<Action<C>> {
        let mut actions = Vec::with_capacity(names.len());
        for name in names {
            match self.implementations.find_action(name) {
                Some(action) => actions.push(action.clone()),
                None => self.fail(ConfigurationError::UnknownAction {
                    state: path.to_string(),
                    action: name.clone(),
                }),
            }
        }
        actions
    }

    fn child_named(&self, parent: NodeId, id: &str) -> Option<NodeId> {
        self.nodes[parent.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].id == id)
    }

    /// Children of the declaring node first, then siblings of the node and
    /// of each ancestor, nearest first. `#` addresses a full path.
    fn lookup_target(&self, from: NodeId, target: &str) -> Option<NodeId> {
        if let Some(path) = target.strip_prefix('#') {
            return self.nodes.iter().position(|n| n.path == path).map(NodeId);
        }
        if let Some(found) = self.child_named(from, target) {
            return Some(found);
        }
        let mut current = from;
        while let Some(parent) = self.nodes[current.0].parent {
            if let Some(found) = self.child_named(parent, target) {
                return Some(found);
            }
            current = parent;
        }
        (self.nodes[0].id == target).then_some(NodeId(0))
    }

    fn resolve_targets(&mut self) {
        for pending in std::mem::take(&mut self.pending) {
            let source = &self.nodes[pending.node.0];
            let state = source.path.clone();
            let source_region = source.region;

            let Some(target) = self.lookup_target(pending.node, &pending.target) else {
                self.fail(ConfigurationError::UnknownTarget {
                    state,
                    target: pending.target,
                });
                continue;
            };

            let resolved = &self.nodes[target.0];
            let (kind, region) = (resolved.kind, resolved.region);
            if kind == NodeKind::Parallel {
                self.fail(ConfigurationError::ParallelTarget {
                    state,
                    target: pending.target,
                });
                continue;
            }
            if region != source_region {
                self.fail(ConfigurationError::CrossRegionTarget {
                    state,
                    target: pending.target,
                });
                continue;
            }

            let node = &mut self.nodes[pending.node.0];
            match pending.slot {
                TargetSlot::Candidate { rule, candidate } => {
                    node.rules[rule].candidates[candidate].target = Some(target);
                }
                TargetSlot::Delayed(index) => node.after[index].target = target,
            }
        }
    }

    fn finish(self) -> Result<Machine<C>, ConfigurationErrors> {
        let Compiler {
            nodes,
            regions,
            checks,
            ..
        } = self;

        match Validation::all_vec(checks) {
            Validation::Success(_) => {
                let by_path = nodes
                    .iter()
                    .enumerate()
                    .map(|(i, n)| (n.path.clone(), NodeId(i)))
                    .collect();
                log::debug!(
                    "compiled machine '{}' with {} states in {} regions",
                    nodes[0].id,
                    nodes.len(),
                    regions.len()
                );
                Ok(Machine {
                    nodes,
                    regions,
                    by_path,
                })
            }
            Validation::Failure(errors) => {
                let errors: Vec<ConfigurationError> = errors.iter().cloned().collect();
                log::debug!("machine configuration rejected with {} errors", errors.len());
                Err(ConfigurationErrors::new(errors))
            }
        }
    }
}
