//! Aligning freshly computed groups with the rules of a previous generation

use std::collections::{BTreeMap, BTreeSet};

use ccgen_core::{concat_unique, GroupId, SourceFile, SourceGroup};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RulesError};
use crate::generate::RuleKind;
use crate::source_groups::SourceGroups;

/// A rule as it exists in the BUILD file before generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorRule {
    pub name: String,
    /// Bazel rule kind, e.g. `cc_library`.
    pub kind: String,
    /// Package-relative files listed in `srcs` and `hdrs`.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl PriorRule {
    pub fn new(name: &str, kind: RuleKind, sources: &[&str]) -> Self {
        PriorRule {
            name: name.to_string(),
            kind: kind.as_str().to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Kind of the rule if it is one this generator manages.
    pub fn cc_kind(&self) -> Option<RuleKind> {
        RuleKind::from_bazel(&self.kind)
    }
}

/// Snapshot of the previous generation's rules in one package.
#[derive(Debug, Clone, Default)]
pub struct PriorRules {
    rules: BTreeMap<String, PriorRule>,
    rule_sources: BTreeMap<String, BTreeSet<SourceFile>>,
    /// Rule each claimed file belonged to.
    owners: BTreeMap<SourceFile, String>,
}

impl PriorRules {
    pub fn empty() -> Self {
        PriorRules::default()
    }

    /// Index rules of the package at `rel`.
    ///
    /// Only rules with buildable sources (`cc_library`, `cc_binary`,
    /// `cc_test`) claim files. A file claimed by two rules is an error.
    pub fn from_rules(rel: &str, rules: impl IntoIterator<Item = PriorRule>) -> Result<Self> {
        let mut prior = PriorRules::default();
        for rule in rules {
            let claims_sources = matches!(
                rule.cc_kind(),
                Some(RuleKind::Library | RuleKind::Binary | RuleKind::Test)
            );
            if claims_sources {
                for name in &rule.sources {
                    let file = SourceFile::new(rel, name);
                    if let Some(first) = prior.owners.get(&file) {
                        if *first != rule.name {
                            return Err(RulesError::InconsistentPriorState {
                                file,
                                first: first.clone(),
                                second: rule.name.clone(),
                            });
                        }
                    }
                    prior.owners.insert(file.clone(), rule.name.clone());
                    prior
                        .rule_sources
                        .entry(rule.name.clone())
                        .or_default()
                        .insert(file);
                }
            }
            prior.rules.insert(rule.name.clone(), rule);
        }
        Ok(prior)
    }

    pub fn get(&self, name: &str) -> Option<&PriorRule> {
        self.rules.get(name)
    }

    pub fn rules(&self) -> impl Iterator<Item = &PriorRule> {
        self.rules.values()
    }

    pub fn rules_of_kind(&self, kind: RuleKind) -> Vec<&PriorRule> {
        self.rules
            .values()
            .filter(|r| r.cc_kind() == Some(kind))
            .collect()
    }

    /// Sources a rule claimed, workspace-relative.
    pub fn sources_of(&self, name: &str) -> impl Iterator<Item = &SourceFile> {
        self.rule_sources.get(name).into_iter().flatten()
    }

    /// Rule that previously listed `file`.
    pub fn owner_of(&self, file: &SourceFile) -> Option<&str> {
        self.owners.get(file).map(String::as_str)
    }

    /// Names of the rules that previously listed the member files of
    /// `group`. Rules owning other files with the same group id do not
    /// count.
    pub fn assigned_rules(&self, group: &SourceGroup) -> BTreeSet<String> {
        group
            .sources
            .iter()
            .filter_map(|src| self.owner_of(src))
            .map(str::to_string)
            .collect()
    }
}

/// Groups whose sources were owned by several existing rules, with the
/// sorted names of those rules.
pub type AmbiguousAssignments = BTreeMap<GroupId, Vec<String>>;

/// Rename or merge groups so they keep the names of the rules that already
/// own their sources.
///
/// A group whose sources belonged to exactly one rule takes that rule's
/// name, merging with any other group doing the same. A group spanning
/// several rules keeps its own name and is reported as ambiguous. The
/// ambiguity check runs on the merged groups, so the outcome does not
/// depend on the order groups are visited.
pub fn reconcile(groups: &mut SourceGroups, prior: &PriorRules) -> Result<AmbiguousAssignments> {
    let mut renames: BTreeMap<GroupId, GroupId> = BTreeMap::new();
    for (id, group) in groups.iter() {
        let assigned = prior.assigned_rules(group);
        if assigned.len() == 1 {
            if let Some(name) = assigned.into_iter().next() {
                let target = GroupId::new(name);
                if target != *id {
                    renames.insert(id.clone(), target);
                }
            }
        }
    }

    let mut merged: BTreeMap<GroupId, SourceGroup> = BTreeMap::new();
    for (id, group) in std::mem::take(groups) {
        let target = renames.get(&id).cloned().unwrap_or(id);
        match merged.remove(&target) {
            Some(existing) => {
                tracing::debug!("Merging source group into existing rule {}", target);
                merged.insert(
                    target,
                    SourceGroup {
                        sources: [existing.sources, group.sources].concat(),
                        depends_on: concat_unique(&existing.depends_on, &group.depends_on),
                        sub_groups: [existing.sub_groups, group.sub_groups].concat(),
                    },
                );
            }
            None => {
                merged.insert(target, group);
            }
        }
    }

    // Dependencies follow renamed groups.
    for (id, group) in merged.iter_mut() {
        let depends_on: BTreeSet<GroupId> = group
            .depends_on
            .iter()
            .map(|dep| renames.get(dep).unwrap_or(dep).clone())
            .filter(|dep| dep != id)
            .collect();
        group.depends_on = depends_on.into_iter().collect();
    }

    *groups = merged.into_iter().collect();
    groups.sort();
    groups.source_to_group_ids()?;

    let mut ambiguous = AmbiguousAssignments::new();
    for (id, group) in groups.iter() {
        let assigned = prior.assigned_rules(group);
        if assigned.len() > 1 {
            ambiguous.insert(id.clone(), assigned.into_iter().collect());
        }
    }
    Ok(ambiguous)
}
