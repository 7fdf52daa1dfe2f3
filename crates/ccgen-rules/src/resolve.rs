//! Resolving a rule's includes to the labels of the rules owning them

use std::collections::BTreeSet;

use ccgen_core::{Label, SearchPath};
use ccgen_index::HeaderIndex;
use serde::Serialize;

use crate::generate::{CcInclude, GeneratedTarget, RuleImports, RuleKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedDeps {
    /// Needed by public headers, propagated to dependents.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<Label>,
    /// Needed by sources only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub implementation_deps: Vec<Label>,
}

/// Build an index of the headers exported by freshly generated rules.
pub fn local_index(rel: &str, targets: &[GeneratedTarget]) -> HeaderIndex {
    let mut index = HeaderIndex::default();
    for target in targets {
        let label = Label::new("", rel, target.rule.name());
        for hdr in target.rule.hdrs() {
            index.insert(ccgen_core::paths::join([rel, hdr.as_str()]), label.clone());
        }
    }
    index
}

/// Header indexes and include search roots used to find include owners.
#[derive(Debug, Clone, Copy)]
pub struct IncludeResolver<'a> {
    /// Headers of the rules generated in this run.
    pub local: &'a HeaderIndex,
    /// Loaded index files, searched in order after `local`.
    pub external: &'a [HeaderIndex],
    /// Search roots tried in addition to the repository root.
    pub search: &'a [SearchPath],
}

impl<'a> IncludeResolver<'a> {
    pub fn new(local: &'a HeaderIndex, external: &'a [HeaderIndex]) -> Self {
        IncludeResolver {
            local,
            external,
            search: &[],
        }
    }

    pub fn with_search(mut self, search: &'a [SearchPath]) -> Self {
        self.search = search;
        self
    }

    /// Workspace paths `include` may refer to, most specific first.
    ///
    /// Quoted includes try the including package before the repository
    /// root. Every search root adds the path it maps the include to.
    pub fn candidate_paths(&self, include: &CcInclude) -> Vec<String> {
        let mut candidates = vec![include.normalized.clone()];
        let repository_root = SearchPath::default();
        for root in std::iter::once(&repository_root).chain(self.search) {
            if let Some(path) = root.apply(&include.raw) {
                if !candidates.contains(&path) {
                    candidates.push(path);
                }
            }
        }
        candidates
    }

    /// Find the rule providing `include`. Each index is asked for every
    /// candidate path before moving on to the next index.
    pub fn find_provider(&self, include: &CcInclude) -> Option<&'a Label> {
        let candidates = self.candidate_paths(include);
        std::iter::once(self.local)
            .chain(self.external)
            .find_map(|index| candidates.iter().find_map(|path| index.get(path)))
    }

    /// Turn the includes of the rule `from` into dependency labels.
    ///
    /// Includes nobody provides, and includes provided by `from` itself, are
    /// dropped. Only libraries have `implementation_deps`; for them a label
    /// needed by both headers and sources only appears in `deps`. Other
    /// kinds get everything in `deps`.
    pub fn resolve_imports(
        &self,
        from: &Label,
        kind: RuleKind,
        imports: &RuleImports,
    ) -> ResolvedDeps {
        if imports.is_empty() {
            return ResolvedDeps::default();
        }
        let resolve = |includes: &[CcInclude]| -> BTreeSet<Label> {
            includes
                .iter()
                .filter_map(|include| {
                    let provider = self.find_provider(include);
                    if provider.is_none() {
                        tracing::trace!("No provider for include {}", include.raw);
                    }
                    provider
                })
                .filter(|label| !same_target(label, from))
                .cloned()
                .collect()
        };
        let mut deps = resolve(&imports.hdr_includes);
        let src_deps = resolve(&imports.src_includes);
        if kind != RuleKind::Library {
            deps.extend(src_deps);
            return ResolvedDeps {
                deps: deps.into_iter().collect(),
                implementation_deps: Vec::new(),
            };
        }
        let implementation_deps = src_deps
            .into_iter()
            .filter(|label| !deps.contains(label))
            .collect();
        ResolvedDeps {
            deps: deps.into_iter().collect(),
            implementation_deps,
        }
    }
}

fn same_target(a: &Label, b: &Label) -> bool {
    a.repo == b.repo && a.pkg == b.pkg && a.name == b.name
}
