//! The immutable machine definition shared by every service.

use super::node::{NodeId, NodeKind, StateNode};
use std::collections::HashMap;

/// A compiled statechart.
///
/// Nodes live in an arena indexed by [`NodeId`]; the root is always the
/// first node. Build one with [`compile`](crate::builder::compile) and share
/// it between services through an `Arc`.
pub struct Machine<C> {
    pub(crate) nodes: Vec<StateNode<C>>,
    pub(crate) regions: Vec<NodeId>,
    pub(crate) by_path: HashMap<String, NodeId>,
}

impl<C> Machine<C> {
    /// Identifier of the root state.
    pub fn id(&self) -> &str {
        &self.nodes[0].id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &StateNode<C> {
        &self.nodes[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &StateNode<C>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Root node of every region, in declaration order. A parallel root has
    /// one region per child; any other root is itself the only region.
    pub fn regions(&self) -> &[NodeId] {
        &self.regions
    }

    /// Name of the region at `region`, if there is one.
    pub fn region_name(&self, region: usize) -> Option<&str> {
        self.regions
            .get(region)
            .map(|root| self.node(*root).id.as_str())
    }

    pub(crate) fn region_id(&self, region: usize) -> &str {
        &self.node(self.regions[region]).id
    }

    pub fn region_index(&self, name: &str) -> Option<usize> {
        self.regions.iter().position(|r| self.node(*r).id == name)
    }

    /// Look a node up by its dotted path, root id included.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn is_parallel(&self) -> bool {
        self.nodes[0].kind == NodeKind::Parallel
    }

    /// Chain of nodes from the node's region root down to the node itself.
    pub fn region_path(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let state = self.node(node);
            path.push(node);
            if self.regions.contains(&node) {
                break;
            }
            current = state.parent;
        }
        path.reverse();
        path
    }

    /// Nodes entered below `id` by following initial children to a leaf.
    pub fn initial_descent(&self, id: NodeId) -> Vec<NodeId> {
        let mut descent = Vec::new();
        let mut current = self.node(id).initial;
        while let Some(node) = current {
            descent.push(node);
            current = self.node(node).initial;
        }
        descent
    }

    /// Ids along a node chain, for reporting.
    pub fn ids(&self, chain: &[NodeId]) -> Vec<String> {
        chain.iter().map(|n| self.node(*n).id.clone()).collect()
    }
}

impl<C> std::fmt::Debug for Machine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.id())
            .field("nodes", &self.nodes.len())
            .field("regions", &self.regions.len())
            .finish()
    }
}
