//! Include dependency graph over translation units, backed by petgraph

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::model::{GroupId, SourceFile};

/// One translation unit: every file sharing a group id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    pub id: GroupId,
    pub sources: BTreeSet<SourceFile>,
    /// Local files included by any of `sources`, resolved to workspace paths.
    pub adjacency: BTreeSet<SourceFile>,
}

/// Directed graph of local include relationships between translation units.
///
/// Nodes are kept in an ordered index so iteration, and therefore SCC
/// discovery, does not depend on insertion order.
pub struct DependencyGraph {
    inner: DiGraph<GroupNode, ()>,
    index: BTreeMap<GroupId, NodeIndex>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        DependencyGraph {
            inner: DiGraph::new(),
            index: BTreeMap::new(),
        }
    }

    /// Add an empty node for `id` unless one exists. Returns its index.
    pub fn add_group(&mut self, id: GroupId) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.inner.add_node(GroupNode {
            id: id.clone(),
            sources: BTreeSet::new(),
            adjacency: BTreeSet::new(),
        });
        self.index.insert(id, idx);
        idx
    }

    /// Attach a file to the node of its group id, creating the node if needed.
    pub fn add_source(&mut self, file: SourceFile) {
        let idx = self.add_group(file.group_id());
        self.inner[idx].sources.insert(file);
    }

    pub fn contains(&self, id: &GroupId) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, id: &GroupId) -> Option<&GroupNode> {
        self.index.get(id).map(|&idx| &self.inner[idx])
    }

    /// Record that `from` includes `included`.
    ///
    /// Returns false, without modifying the graph, when either endpoint has
    /// no node. Repeated dependencies are recorded once.
    pub fn add_dependency(&mut self, from: &GroupId, included: SourceFile) -> bool {
        let (Some(&src), Some(&dst)) = (self.index.get(from), self.index.get(&included.group_id()))
        else {
            return false;
        };
        if self.inner[src].adjacency.insert(included) && self.inner.find_edge(src, dst).is_none() {
            self.inner.add_edge(src, dst, ());
        }
        true
    }

    /// Group ids of direct dependencies of `id`.
    pub fn dependencies_of(&self, id: &GroupId) -> BTreeSet<GroupId> {
        let Some(&idx) = self.index.get(id) else {
            return BTreeSet::new();
        };
        self.inner
            .edges(idx)
            .map(|e| self.inner[e.target()].id.clone())
            .collect()
    }

    /// All group ids in sorted order.
    pub fn group_ids(&self) -> impl Iterator<Item = &GroupId> {
        self.index.keys()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Strongly connected components, found with Tarjan's algorithm.
    ///
    /// Each component lists its group ids sorted, and components are sorted
    /// by their first id, so the result is independent of discovery order.
    pub fn strongly_connected_components(&self) -> Vec<Vec<GroupId>> {
        let mut components: Vec<Vec<GroupId>> = tarjan_scc(&self.inner)
            .into_iter()
            .map(|component| {
                let mut ids: Vec<GroupId> = component
                    .into_iter()
                    .map(|idx| self.inner[idx].id.clone())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        components.sort();
        components
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
