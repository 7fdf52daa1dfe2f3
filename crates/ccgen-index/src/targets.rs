//! Folding targets that share headers into a single indexable target
//!
//! Package managers often generate several `cc_library` rules over the
//! same header glob, chained through `deps`. Only the target at the top of
//! such a chain should own the headers in the index.

use std::collections::{BTreeMap, BTreeSet};

use ccgen_core::Label;
use petgraph::unionfind::UnionFind;

use crate::error::{IndexError, Result};
use crate::indexer::{Module, Target};

/// Partition targets into groups connected through shared header labels.
///
/// Groups are ordered by their first target in `module`, and targets keep
/// their relative order within a group.
pub fn group_targets_by_headers(module: &Module) -> Vec<Vec<Target>> {
    let mut sets: UnionFind<usize> = UnionFind::new(module.targets.len());
    let mut header_owner: BTreeMap<&Label, usize> = BTreeMap::new();
    for (idx, target) in module.targets.iter().enumerate() {
        for hdr in &target.hdrs {
            match header_owner.get(hdr) {
                Some(&other) => {
                    sets.union(idx, other);
                }
                None => {
                    header_owner.insert(hdr, idx);
                }
            }
        }
    }

    let mut position: BTreeMap<usize, usize> = BTreeMap::new();
    let mut groups: Vec<Vec<Target>> = Vec::new();
    for (idx, target) in module.targets.iter().enumerate() {
        let root = sets.find_mut(idx);
        let slot = *position.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(target.clone());
    }
    groups
}

/// Targets no other target of the set depends on.
pub fn select_root_targets(targets: &[Target]) -> Vec<&Target> {
    let depended_on: BTreeSet<String> = targets
        .iter()
        .flat_map(|t| t.deps.iter().map(move |dep| absolute(dep, &t.name)))
        .collect();
    targets
        .iter()
        .filter(|t| !depended_on.contains(&absolute(&t.name, &t.name)))
        .collect()
}

/// Replace the targets of `module` by one target per header-sharing group:
/// the group's single root, extended with the headers and include paths of
/// the other members.
pub fn merge_into_roots(module: &Module) -> Result<Module> {
    let mut merged = Vec::new();
    for group in group_targets_by_headers(module) {
        let roots = select_root_targets(&group);
        let [root] = roots.as_slice() else {
            return Err(IndexError::AmbiguousRoot {
                repository: module.repository.clone(),
                roots: roots.iter().map(|t| t.name.to_string()).collect(),
            });
        };
        let mut root = (*root).clone();
        for target in &group {
            if target.name == root.name {
                continue;
            }
            for hdr in &target.hdrs {
                if !root.hdrs.contains(hdr) {
                    root.hdrs.push(hdr.clone());
                }
            }
            for include in &target.includes {
                if !root.includes.contains(include) {
                    root.includes.push(include.clone());
                }
            }
        }
        merged.push(root);
    }
    tracing::debug!(
        "Reduced {} targets of {:?} to {} roots",
        module.targets.len(),
        module.repository,
        merged.len()
    );
    Ok(Module {
        repository: module.repository.clone(),
        targets: merged,
    })
}

/// Render `label`, resolving `:name` forms against the package of `owner`.
fn absolute(label: &Label, owner: &Label) -> String {
    if label.relative {
        Label::new(owner.repo.clone(), owner.pkg.clone(), label.name.clone()).to_string()
    } else {
        Label::new(label.repo.clone(), label.pkg.clone(), label.name.clone()).to_string()
    }
}
