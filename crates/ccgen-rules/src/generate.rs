//! Rule generation for one package

use std::collections::BTreeSet;

use ccgen_core::{
    paths, CycleMode, GroupId, GroupingMode, Label, SourceFile, SourceInfos, SourceSet,
};
use serde::Serialize;

use crate::cycles::{
    resolve_ambiguity, AmbiguousGroup, Diagnostic, Resolution, RuleRef, RuleUpdate,
};
use crate::error::Result;
use crate::reconcile::{reconcile, PriorRules};
use crate::source_groups::{
    group_sources_by_directory, group_sources_by_units, identity_source_groups, SourceGroups,
};

const PUBLIC_VISIBILITY: &str = "//visibility:public";
const CC_PROTO_SUFFIX: &str = "_cc_proto";
const BINARY_SUFFIX: &str = "_bin";

/// Rule kinds produced and managed by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RuleKind {
    #[serde(rename = "cc_library")]
    Library,
    #[serde(rename = "cc_binary")]
    Binary,
    #[serde(rename = "cc_test")]
    Test,
    #[serde(rename = "cc_proto_library")]
    ProtoLibrary,
}

impl RuleKind {
    pub const ALL: [RuleKind; 4] = [
        RuleKind::Library,
        RuleKind::Binary,
        RuleKind::Test,
        RuleKind::ProtoLibrary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Library => "cc_library",
            RuleKind::Binary => "cc_binary",
            RuleKind::Test => "cc_test",
            RuleKind::ProtoLibrary => "cc_proto_library",
        }
    }

    pub fn from_bazel(kind: &str) -> Option<Self> {
        RuleKind::ALL.into_iter().find(|k| k.as_str() == kind)
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum GeneratedRule {
    #[serde(rename = "cc_library")]
    Library {
        name: String,
        srcs: Vec<String>,
        hdrs: Vec<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        visibility: Vec<String>,
    },
    #[serde(rename = "cc_binary")]
    Binary { name: String, srcs: Vec<String> },
    #[serde(rename = "cc_test")]
    Test { name: String, srcs: Vec<String> },
    #[serde(rename = "cc_proto_library")]
    ProtoLibrary {
        name: String,
        deps: Vec<Label>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        visibility: Vec<String>,
    },
}

impl GeneratedRule {
    pub fn name(&self) -> &str {
        match self {
            GeneratedRule::Library { name, .. }
            | GeneratedRule::Binary { name, .. }
            | GeneratedRule::Test { name, .. }
            | GeneratedRule::ProtoLibrary { name, .. } => name,
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            GeneratedRule::Library { .. } => RuleKind::Library,
            GeneratedRule::Binary { .. } => RuleKind::Binary,
            GeneratedRule::Test { .. } => RuleKind::Test,
            GeneratedRule::ProtoLibrary { .. } => RuleKind::ProtoLibrary,
        }
    }

    /// Package-relative headers exported by this rule.
    pub fn hdrs(&self) -> &[String] {
        match self {
            GeneratedRule::Library { hdrs, .. } => hdrs,
            _ => &[],
        }
    }
}

/// A single `#include` as written and as a workspace path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CcInclude {
    pub raw: String,
    /// For quoted includes, the path joined onto the including package.
    pub normalized: String,
    pub system: bool,
}

/// Includes of a rule, split by whether they come from public headers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleImports {
    pub hdr_includes: Vec<CcInclude>,
    pub src_includes: Vec<CcInclude>,
}

impl RuleImports {
    pub fn is_empty(&self) -> bool {
        self.hdr_includes.is_empty() && self.src_includes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedTarget {
    pub rule: GeneratedRule,
    pub imports: RuleImports,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerateResult {
    pub rules: Vec<GeneratedTarget>,
    pub updates: Vec<RuleUpdate>,
    /// Existing rules to delete.
    pub empty: Vec<RuleRef>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy)]
pub struct GenerateArgs<'a> {
    /// Workspace-relative package path, empty for the root.
    pub rel: &'a str,
    /// Name of the package directory, used by directory grouping.
    pub dir_name: &'a str,
    pub sources: &'a SourceSet,
    pub prior: &'a PriorRules,
    pub grouping: GroupingMode,
    pub cycles: CycleMode,
    /// Package-relative `.proto` files.
    pub proto_files: &'a [String],
    /// The BUILD file already sets a default visibility.
    pub has_default_visibility: bool,
}

impl GenerateArgs<'_> {
    fn visibility(&self) -> Vec<String> {
        if self.has_default_visibility {
            Vec::new()
        } else {
            vec![PUBLIC_VISIBILITY.to_string()]
        }
    }

    fn relative_paths(&self, files: &[SourceFile]) -> Vec<String> {
        files.iter().map(|f| f.relative_to(self.rel)).collect()
    }
}

/// Generate the C/C++ rules of one package.
pub fn generate_rules(args: &GenerateArgs<'_>) -> Result<GenerateResult> {
    let mut result = GenerateResult::default();
    let consumed = generate_proto_rules(args, &mut result);
    generate_library_rules(args, &consumed, &mut result)?;
    generate_binary_rules(args, &mut result);
    generate_test_rules(args, &mut result)?;

    result.empty.extend(find_empty_rules(args, &result));
    result.empty.sort();
    result.empty.dedup();

    tracing::debug!(
        "Generated {} rules in //{} ({} updates, {} deletions)",
        result.rules.len(),
        args.rel,
        result.updates.len(),
        result.empty.len()
    );
    Ok(result)
}

/// Split sources according to the grouping mode.
pub fn split_sources_into_groups(
    grouping: GroupingMode,
    dir_name: &str,
    srcs: &[SourceFile],
    infos: &SourceInfos,
) -> Result<SourceGroups> {
    match grouping {
        GroupingMode::Directory => Ok(group_sources_by_directory(dir_name, srcs)),
        GroupingMode::Unit => group_sources_by_units(srcs, infos),
    }
}

/// Collect includes of `files`, header includes apart from source includes.
pub fn extract_imports(rel: &str, files: &[SourceFile], infos: &SourceInfos) -> RuleImports {
    let mut imports = RuleImports::default();
    for file in files {
        let Some(info) = infos.get(file) else {
            continue;
        };
        let includes = if file.is_header() {
            &mut imports.hdr_includes
        } else {
            &mut imports.src_includes
        };
        for include in &info.includes.double_quote {
            let raw = paths::clean(include);
            includes.push(CcInclude {
                normalized: paths::join([rel, raw.as_str()]),
                raw,
                system: false,
            });
        }
        for include in &info.includes.bracket {
            includes.push(CcInclude {
                raw: include.clone(),
                normalized: include.clone(),
                system: true,
            });
        }
    }
    imports
}

/// Rule name to use for a new rule, reusing the existing one when this is
/// the only group of its kind and exactly one such rule exists.
fn new_or_existing_name(
    kind: RuleKind,
    name: String,
    group_count: usize,
    prior: &PriorRules,
) -> String {
    if group_count == 1 {
        if let [existing] = prior.rules_of_kind(kind).as_slice() {
            return existing.name.clone();
        }
    }
    name
}

/// Emit one `cc_proto_library` per `.proto` file. Returns the generated
/// `.pb.h`/`.pb.cc` files, which belong to those rules instead of libraries.
fn generate_proto_rules(
    args: &GenerateArgs<'_>,
    result: &mut GenerateResult,
) -> BTreeSet<SourceFile> {
    let mut consumed = BTreeSet::new();
    for proto in args.proto_files {
        let Some(base_name) = proto.strip_suffix(".proto") else {
            continue;
        };
        consumed.insert(SourceFile::new(args.rel, &format!("{base_name}.pb.h")));
        consumed.insert(SourceFile::new(args.rel, &format!("{base_name}.pb.cc")));

        let stem = paths::file_name(base_name);
        result.rules.push(GeneratedTarget {
            rule: GeneratedRule::ProtoLibrary {
                name: format!("{stem}{CC_PROTO_SUFFIX}"),
                deps: vec![Label::relative(format!("{stem}_proto"))],
                visibility: args.visibility(),
            },
            imports: RuleImports::default(),
        });
    }
    consumed
}

/// Shared handling of reconciled groups for libraries and tests. Returns
/// the surviving `(rule name, group)` pairs in name order.
fn reconciled_groups(
    args: &GenerateArgs<'_>,
    kind: RuleKind,
    mut groups: SourceGroups,
    rule_name: impl Fn(&str) -> String,
    result: &mut GenerateResult,
) -> Result<Vec<(String, Vec<SourceFile>)>> {
    let ambiguous = reconcile(&mut groups, args.prior)?;
    let group_count = groups.len();
    let names: Vec<(String, _)> = groups
        .iter()
        .map(|(id, group)| {
            let name = new_or_existing_name(kind, rule_name(id.as_str()), group_count, args.prior);
            (name, (id, group))
        })
        .collect();
    let kept_names: BTreeSet<String> = names.iter().map(|(name, _)| name.clone()).collect();

    // Rules left in place by warn mode keep their current sources, so no
    // other group may be emitted under their names.
    let mut frozen: BTreeSet<String> = BTreeSet::new();
    let mut merged: BTreeSet<&GroupId> = BTreeSet::new();
    for (name, (id, group)) in &names {
        let Some(rules) = ambiguous.get(*id) else {
            continue;
        };
        let resolution = resolve_ambiguity(
            args.cycles,
            args.grouping,
            AmbiguousGroup {
                rel: args.rel,
                rule_name: name,
                group,
                rules,
            },
            args.prior,
            &kept_names,
        );
        match resolution {
            Resolution::Merge {
                deletions,
                diagnostic,
            } => {
                result.empty.extend(deletions);
                result.diagnostics.push(diagnostic);
                merged.insert(*id);
            }
            Resolution::Keep {
                updates,
                diagnostic,
            } => {
                frozen.extend(rules.iter().cloned());
                result.updates.extend(updates);
                result.diagnostics.push(diagnostic);
            }
        }
    }

    let mut emitted = Vec::new();
    for (name, (id, group)) in names {
        if ambiguous.contains_key(id) && !merged.contains(id) {
            continue;
        }
        if frozen.contains(&name) {
            tracing::debug!("Leaving rule {} unchanged, it is part of a cycle", name);
            continue;
        }
        emitted.push((name, group.sources.clone()));
    }
    Ok(emitted)
}

fn generate_library_rules(
    args: &GenerateArgs<'_>,
    excluded: &BTreeSet<SourceFile>,
    result: &mut GenerateResult,
) -> Result<()> {
    let all_srcs: Vec<SourceFile> = args
        .sources
        .srcs
        .iter()
        .chain(&args.sources.hdrs)
        .filter(|file| !excluded.contains(*file))
        .cloned()
        .collect();
    if all_srcs.is_empty() {
        return Ok(());
    }
    let groups =
        split_sources_into_groups(args.grouping, args.dir_name, &all_srcs, &args.sources.infos)?;
    let groups = reconciled_groups(args, RuleKind::Library, groups, str::to_string, result)?;
    for (name, sources) in groups {
        let (srcs, hdrs) = ccgen_core::partition_sources(&sources);
        result.rules.push(GeneratedTarget {
            rule: GeneratedRule::Library {
                name,
                srcs: args.relative_paths(&srcs),
                hdrs: args.relative_paths(&hdrs),
                visibility: args.visibility(),
            },
            imports: extract_imports(args.rel, &sources, &args.sources.infos),
        });
    }
    Ok(())
}

fn generate_binary_rules(args: &GenerateArgs<'_>, result: &mut GenerateResult) {
    let groups = identity_source_groups(&args.sources.main_srcs);
    let group_count = groups.len();
    for (_, group) in groups.iter() {
        let Some(first) = group.sources.first() else {
            continue;
        };
        let mut name = new_or_existing_name(
            RuleKind::Binary,
            first.base_name().to_string(),
            group_count,
            args.prior,
        );
        if result.rules.iter().any(|t| t.rule.name() == name) {
            tracing::debug!("Rule name {} is taken in //{}, suffixing binary", name, args.rel);
            name.push_str(BINARY_SUFFIX);
        }
        result.rules.push(GeneratedTarget {
            rule: GeneratedRule::Binary {
                name,
                srcs: args.relative_paths(&group.sources),
            },
            imports: extract_imports(args.rel, &group.sources, &args.sources.infos),
        });
    }
}

/// `foo` becomes `foo_test`; names already starting or ending with `test`
/// are kept.
pub fn test_rule_name(group_name: &str) -> String {
    if group_name.starts_with("test") || group_name.ends_with("test") {
        group_name.to_string()
    } else {
        format!("{group_name}_test")
    }
}

fn generate_test_rules(args: &GenerateArgs<'_>, result: &mut GenerateResult) -> Result<()> {
    if args.sources.test_srcs.is_empty() {
        return Ok(());
    }
    let groups = split_sources_into_groups(
        args.grouping,
        args.dir_name,
        &args.sources.test_srcs,
        &args.sources.infos,
    )?;
    let groups = reconciled_groups(args, RuleKind::Test, groups, test_rule_name, result)?;
    for (name, sources) in groups {
        result.rules.push(GeneratedTarget {
            rule: GeneratedRule::Test {
                name,
                srcs: args.relative_paths(&sources),
            },
            imports: extract_imports(args.rel, &sources, &args.sources.infos),
        });
    }
    Ok(())
}

/// Existing managed rules that were not regenerated and none of whose
/// sources remain buildable.
fn find_empty_rules(args: &GenerateArgs<'_>, result: &GenerateResult) -> Vec<RuleRef> {
    let produced: BTreeSet<&str> = result
        .rules
        .iter()
        .map(|t| t.rule.name())
        .chain(result.updates.iter().map(|u| u.name.as_str()))
        .collect();
    args.prior
        .rules()
        .filter(|rule| rule.cc_kind().is_some())
        .filter(|rule| !produced.contains(rule.name.as_str()))
        .filter(|rule| {
            !args
                .prior
                .sources_of(&rule.name)
                .any(|src| args.sources.contains_buildable(src))
        })
        .map(|rule| RuleRef {
            kind: rule.kind.clone(),
            name: rule.name.clone(),
        })
        .collect()
}
