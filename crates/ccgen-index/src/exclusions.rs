//! Heuristics for skipping headers and targets that are implementation details

use ccgen_core::Label;

/// Decides which header spellings and targets are left out of an index.
pub trait ExclusionPolicy {
    fn exclude_header(&self, path: &str) -> bool;
    fn exclude_target(&self, label: &Label) -> bool;
}

/// Skips blank and hidden header paths, and targets living in `internal`
/// or `impl` packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalExclusions;

impl ExclusionPolicy for InternalExclusions {
    fn exclude_header(&self, path: &str) -> bool {
        if path.trim().is_empty() {
            return true;
        }
        path.split('/')
            .any(|segment| segment.starts_with('.') || segment.starts_with('_'))
    }

    fn exclude_target(&self, label: &Label) -> bool {
        split_words(&label.pkg).any(|token| token == "internal" || token == "impl")
    }
}

/// Indexes everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExclusions;

impl ExclusionPolicy for NoExclusions {
    fn exclude_header(&self, _path: &str) -> bool {
        false
    }

    fn exclude_target(&self, _label: &Label) -> bool {
        false
    }
}

/// Letter-only tokens of `s`.
fn split_words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|token| !token.is_empty())
}
