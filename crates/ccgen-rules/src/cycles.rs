//! Policy for groups that fuse sources of several existing rules
//!
//! This typically happens when files of previously independent rules start
//! including each other and form a cycle, or when switching to directory
//! grouping folds several rules into one.

use std::collections::BTreeSet;

use ccgen_core::{CycleMode, GroupingMode, Label, SourceGroup};
use serde::Serialize;

use crate::reconcile::PriorRules;

/// Replacement of an existing rule's `deps`, applied instead of
/// regenerating the rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleUpdate {
    pub name: String,
    pub kind: String,
    pub deps: Vec<Label>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Existing rules were merged into one.
    MergedRules,
    /// Existing rules form a cycle and were left as they are.
    CyclicRules,
}

/// Human-readable report of an ambiguity and what was done about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Sorted names of the implicated rules.
    pub rules: Vec<String>,
    /// Sorted package-relative sources of the group.
    pub sources: Vec<String>,
    pub message: String,
}

/// Reference to a rule by kind and name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct RuleRef {
    pub kind: String,
    pub name: String,
}

/// What to do with an ambiguous group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Emit the group as a single rule and delete the superseded ones.
    Merge {
        deletions: Vec<RuleRef>,
        diagnostic: Diagnostic,
    },
    /// Do not emit the group; rewire the existing rules instead.
    Keep {
        updates: Vec<RuleUpdate>,
        diagnostic: Diagnostic,
    },
}

/// Inputs describing one ambiguous group.
#[derive(Debug, Clone, Copy)]
pub struct AmbiguousGroup<'a> {
    /// Package path, used to render sources and in messages.
    pub rel: &'a str,
    /// Name the group would be emitted under.
    pub rule_name: &'a str,
    pub group: &'a SourceGroup,
    /// Sorted names of the existing rules owning the group's sources.
    pub rules: &'a [String],
}

/// Decide how to handle a group claimed by several existing rules.
///
/// `kept_names` holds the names of every rule emitted for the package; an
/// implicated rule whose name is still emitted is never deleted.
pub fn resolve_ambiguity(
    mode: CycleMode,
    grouping: GroupingMode,
    ambiguous: AmbiguousGroup<'_>,
    prior: &PriorRules,
    kept_names: &BTreeSet<String>,
) -> Resolution {
    let mut sources: Vec<String> = ambiguous
        .group
        .sources
        .iter()
        .map(|src| src.relative_to(ambiguous.rel))
        .collect();
    sources.sort();
    let mut rules = ambiguous.rules.to_vec();
    rules.sort();
    let package = display_package(ambiguous.rel);

    match mode {
        CycleMode::Merge => {
            let reason = match grouping {
                GroupingMode::Unit => "create a cyclic dependency",
                GroupingMode::Directory => "are invalidating directory grouping",
            };
            let message = format!(
                "Rules {:?} defined in {} {}, their sources {:?} are merged into a single \
                 rule '{}'. To prevent automatic merging of rules set `cycles = \"{}\"`",
                rules,
                package,
                reason,
                sources,
                ambiguous.rule_name,
                CycleMode::Warn.as_str(),
            );
            tracing::warn!("{}", message);

            let deletions = rules
                .iter()
                .filter(|name| name.as_str() != ambiguous.rule_name && !kept_names.contains(*name))
                .filter_map(|name| prior.get(name))
                .map(|rule| RuleRef {
                    kind: rule.kind.clone(),
                    name: rule.name.clone(),
                })
                .collect();
            Resolution::Merge {
                deletions,
                diagnostic: Diagnostic {
                    kind: DiagnosticKind::MergedRules,
                    rules,
                    sources,
                    message,
                },
            }
        }
        CycleMode::Warn => {
            let message = format!(
                "Existing rules {:?} defined in {} form a cyclic dependency. \
                 Possible resolutions:\n  \
                 - Set `cycles = \"{}\"` to automatically merge rules \
                 to avoid cyclic dependencies.\n  \
                 - Manually combine rules to avoid cyclic dependencies.\n  \
                 - Remove `#include`s from source files that cause cyclic dependencies: {:?}",
                rules,
                package,
                CycleMode::Merge.as_str(),
                sources,
            );
            tracing::warn!("{}", message);

            let updates = rules
                .iter()
                .filter_map(|name| prior.get(name))
                .map(|rule| RuleUpdate {
                    name: rule.name.clone(),
                    kind: rule.kind.clone(),
                    deps: rules
                        .iter()
                        .filter(|other| **other != rule.name)
                        .map(|other| Label::relative(other.clone()))
                        .collect(),
                })
                .collect();
            Resolution::Keep {
                updates,
                diagnostic: Diagnostic {
                    kind: DiagnosticKind::CyclicRules,
                    rules,
                    sources,
                    message,
                },
            }
        }
    }
}

fn display_package(rel: &str) -> String {
    format!("//{rel}")
}
