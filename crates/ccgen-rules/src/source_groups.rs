//! Splitting a directory's sources into groups that compile together
//!
//! ```text
//! sources + includes
//!     │
//!     ├──> build_dependency_graph   one node per translation unit (foo.h + foo.cc)
//!     ├──> strongly connected components (Tarjan)
//!     ├──> split_into_source_groups one group per component, named after its first header
//!     └──> resolve_group_dependencies
//! ```

use std::collections::{BTreeMap, BTreeSet};

use ccgen_core::{
    concat_unique, partition_sources, DependencyGraph, GroupId, SourceFile, SourceGroup,
    SourceInfos,
};

use crate::error::{Result, RulesError};

/// Groups keyed by name, iterated in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceGroups(BTreeMap<GroupId, SourceGroup>);

impl SourceGroups {
    pub fn new() -> Self {
        SourceGroups(BTreeMap::new())
    }

    pub fn get(&self, id: &GroupId) -> Option<&SourceGroup> {
        self.0.get(id)
    }

    pub fn insert(&mut self, id: GroupId, group: SourceGroup) {
        self.0.insert(id, group);
    }

    pub fn contains(&self, id: &GroupId) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupId, &SourceGroup)> {
        self.0.iter()
    }

    /// Sorted group ids.
    pub fn group_ids(&self) -> Vec<GroupId> {
        self.0.keys().cloned().collect()
    }

    /// Sort sources, sub-groups and dependencies of every group.
    pub fn sort(&mut self) {
        for group in self.0.values_mut() {
            group.sources.sort();
            group.sources.dedup();
            group.sub_groups.sort();
            group.sub_groups.dedup();
            group.depends_on.sort();
            group.depends_on.dedup();
        }
    }

    /// Rename the group `current` to `replacement`, merging it into an
    /// existing `replacement` group if there is one.
    ///
    /// Returns false when the names are equal or `current` does not exist.
    pub fn rename_or_merge_with(&mut self, current: &GroupId, replacement: &GroupId) -> bool {
        if current == replacement {
            return false;
        }
        let Some(group) = self.0.remove(current) else {
            return false;
        };
        let merged = match self.0.remove(replacement) {
            Some(target) => SourceGroup {
                sources: [target.sources, group.sources].concat(),
                depends_on: concat_unique(&target.depends_on, &group.depends_on),
                sub_groups: [target.sub_groups, group.sub_groups].concat(),
            },
            None => group,
        };
        self.0.insert(replacement.clone(), merged);
        true
    }

    /// Map every source to its group, failing if one is claimed twice.
    pub fn source_to_group_ids(&self) -> Result<BTreeMap<SourceFile, GroupId>> {
        let mut source_to_group = BTreeMap::new();
        for (id, group) in &self.0 {
            for file in &group.sources {
                if let Some(previous) = source_to_group.insert(file.clone(), id.clone()) {
                    if previous != *id {
                        return Err(RulesError::InconsistentGroups {
                            file: file.clone(),
                            first: previous,
                            second: id.clone(),
                        });
                    }
                }
            }
        }
        Ok(source_to_group)
    }
}

impl FromIterator<(GroupId, SourceGroup)> for SourceGroups {
    fn from_iter<T: IntoIterator<Item = (GroupId, SourceGroup)>>(iter: T) -> Self {
        SourceGroups(iter.into_iter().collect())
    }
}

impl IntoIterator for SourceGroups {
    type Item = (GroupId, SourceGroup);
    type IntoIter = std::collections::btree_map::IntoIter<GroupId, SourceGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// One group per file, without looking at dependencies.
pub fn identity_source_groups(srcs: &[SourceFile]) -> SourceGroups {
    srcs.iter()
        .map(|src| (src.group_id(), SourceGroup::of(vec![src.clone()])))
        .collect()
}

/// All sources in a single group named after the directory.
pub fn group_sources_by_directory(dir_name: &str, srcs: &[SourceFile]) -> SourceGroups {
    let mut sources = srcs.to_vec();
    sources.sort();
    std::iter::once((GroupId::new(dir_name), SourceGroup::of(sources))).collect()
}

/// Split sources into groups following local include relationships.
///
/// A header and its implementation always share a group. Sources without
/// a matching header form single-file groups nothing else can depend on.
/// Files whose includes form a cycle end up in the same group. Every source
/// is assigned to exactly one group.
pub fn group_sources_by_units(sources: &[SourceFile], infos: &SourceInfos) -> Result<SourceGroups> {
    let graph = build_dependency_graph(sources, infos);
    let sccs = graph.strongly_connected_components();
    let mut groups = split_into_source_groups(&sccs, &graph);
    resolve_group_dependencies(&mut groups, &graph);
    groups.sort();
    groups.source_to_group_ids()?;

    tracing::debug!(
        "Grouped {} sources into {} groups ({} graph nodes, {} edges)",
        sources.len(),
        groups.len(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(groups)
}

/// Nodes are translation units; edges come from quoted includes that name
/// a file of another node. An include is resolved against the workspace
/// root first, then against the including file's directory. Includes
/// matching no node are external or unresolvable and create no edge.
pub fn build_dependency_graph(sources: &[SourceFile], infos: &SourceInfos) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for src in sources {
        graph.add_source(src.clone());
    }

    for file in sources {
        let Some(info) = infos.get(file) else {
            continue;
        };
        let node = file.group_id();
        for include in &info.includes.double_quote {
            for base_dir in ["", file.dir()] {
                let dep = SourceFile::new(base_dir, include);
                if graph.contains(&dep.group_id()) {
                    graph.add_dependency(&node, dep);
                    break;
                }
            }
        }
    }
    graph
}

/// Turn each strongly connected component into a group. `sub_groups` is
/// only set for components of more than one translation unit.
pub fn split_into_source_groups(sccs: &[Vec<GroupId>], graph: &DependencyGraph) -> SourceGroups {
    let mut groups = SourceGroups::new();
    for component in sccs {
        let sources: Vec<SourceFile> = component
            .iter()
            .filter_map(|id| graph.node(id))
            .flat_map(|node| node.sources.iter().cloned())
            .collect();
        if sources.is_empty() {
            continue;
        }
        let mut name = select_group_name(&sources);
        if groups.contains(&name) {
            // Same base name in different directories; fall back to the path.
            name = GroupId::new(component[0].as_str().replace('/', "_"));
        }
        let mut group = SourceGroup::of(sources);
        if component.len() > 1 {
            group.sub_groups = component.clone();
        }
        groups.insert(name, group);
    }
    groups
}

/// Lower-cased base name of the lexicographically first header, or of the
/// first source when the group has no headers.
pub fn select_group_name(files: &[SourceFile]) -> GroupId {
    let (mut srcs, mut hdrs) = partition_sources(files);
    hdrs.sort();
    srcs.sort();
    let selected = hdrs.first().or(srcs.first());
    GroupId::new(selected.map(|f| f.base_name().to_lowercase()).unwrap_or_default())
}

/// Record, for every group, the other groups owning headers it includes.
pub fn resolve_group_dependencies(groups: &mut SourceGroups, graph: &DependencyGraph) {
    let mut header_to_group: BTreeMap<SourceFile, GroupId> = BTreeMap::new();
    for (id, group) in groups.iter() {
        for file in group.sources.iter().filter(|f| f.is_header()) {
            header_to_group.insert(file.clone(), id.clone());
        }
    }

    for (id, group) in groups.0.iter_mut() {
        let mut dependencies = BTreeSet::new();
        for file in &group.sources {
            let Some(node) = graph.node(&file.group_id()) else {
                continue;
            };
            for dep in &node.adjacency {
                if let Some(dep_group) = header_to_group.get(dep) {
                    if dep_group != id {
                        dependencies.insert(dep_group.clone());
                    }
                }
            }
        }
        group.depends_on = dependencies.into_iter().collect();
    }
}
