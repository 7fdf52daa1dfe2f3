//! ccgen rules: source grouping, reconciliation with existing rules and rule generation

pub mod cycles;
pub mod error;
pub mod generate;
pub mod reconcile;
pub mod resolve;
pub mod source_groups;


pub use cycles::{
    resolve_ambiguity, AmbiguousGroup, Diagnostic, DiagnosticKind, Resolution, RuleRef, RuleUpdate,
};
pub use error::{Result, RulesError};
pub use generate::{
    extract_imports, generate_rules, split_sources_into_groups, test_rule_name, CcInclude,
    GenerateArgs, GenerateResult, GeneratedRule, GeneratedTarget, RuleImports, RuleKind,
};
pub use reconcile::{reconcile, AmbiguousAssignments, PriorRule, PriorRules};
pub use resolve::{local_index, IncludeResolver, ResolvedDeps};
pub use source_groups::{
    build_dependency_graph, group_sources_by_directory, group_sources_by_units,
    identity_source_groups, resolve_group_dependencies, select_group_name,
    split_into_source_groups, SourceGroups,
};
