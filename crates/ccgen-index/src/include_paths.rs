//! Enumeration of the `#include` spellings under which a header is reachable
//!
//! `cc_library` exposes headers through three composable attributes:
//! `strip_include_prefix` removes a real path prefix, `include_prefix`
//! prepends a virtual one, and `includes` adds search paths. A consumer may
//! use the result of any combination, so every valid spelling is returned.

use std::collections::BTreeSet;

use ccgen_core::paths;

use crate::indexer::Target;

/// All paths an `#include` could use to reach `hdr`, a path relative to the
/// package of `target`.
pub fn indexable_include_paths(hdr: &str, target: &Target) -> BTreeSet<String> {
    let package = target.name.pkg.as_str();
    let full_path = paths::join([package, hdr]);

    let mut spellings = BTreeSet::new();
    spellings.insert(full_path.clone());

    let mut stripped = None;
    if !target.strip_include_prefix.is_empty() {
        let prefix = resolve_strip_prefix(package, &target.strip_include_prefix);
        if let Some(rel) = paths::rel(&prefix, &full_path) {
            if target.include_prefix.is_empty() {
                spellings.insert(rel.clone());
            }
            stripped = Some(rel);
        }
    }

    if stripped.is_none() {
        spellings.insert(hdr.to_string());
    }

    if !target.include_prefix.is_empty() {
        let base = stripped.as_deref().unwrap_or(hdr);
        if !base.is_empty() {
            spellings.insert(paths::join([target.include_prefix.as_str(), base]));
        }
    }

    for include in &target.includes {
        let search_path = if include == "." { "" } else { include.as_str() };
        if let Some(rel) = paths::rel(&paths::join([package, search_path]), &full_path) {
            spellings.insert(rel);
        }
    }

    if target.includes.iter().any(|i| i == ".") && !hdr.contains('/') {
        spellings.insert(hdr.to_string());
        spellings.insert(full_path);
    }

    spellings
}

/// A leading `/` makes the prefix repository-relative; otherwise it is
/// relative to the package.
fn resolve_strip_prefix(package: &str, prefix: &str) -> String {
    match prefix.strip_prefix('/') {
        Some(absolute) => paths::clean(absolute),
        None => paths::join([package, prefix]),
    }
}
