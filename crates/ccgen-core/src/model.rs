//! Core data structures shared by the grouping and indexing pipelines

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::paths;

/// Extensions of compilable C/C++ sources.
pub const SOURCE_EXTENSIONS: &[&str] = &[".c", ".cc", ".cpp", ".cxx", ".c++", ".S"];

/// Extensions of C/C++ headers.
pub const HEADER_EXTENSIONS: &[&str] = &[".h", ".hh", ".hpp", ".hxx"];

/// Case-insensitive extension match, `extensions` entries include the dot.
pub fn has_matching_extension(file_name: &str, extensions: &[&str]) -> bool {
    let ext = extension_of(file_name);
    !ext.is_empty() && extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

fn extension_of(path: &str) -> &str {
    let name = paths::file_name(path);
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

/// Workspace-relative, slash-separated path of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceFile(String);

impl SourceFile {
    /// Join `name` onto `directory`; both are workspace-relative.
    pub fn new(directory: &str, name: &str) -> Self {
        SourceFile(paths::join([directory, name]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension including the leading dot, empty when there is none.
    pub fn extension(&self) -> &str {
        extension_of(&self.0)
    }

    /// File name without directory and extension.
    pub fn base_name(&self) -> &str {
        let name = paths::file_name(&self.0);
        let ext = self.extension();
        &name[..name.len() - ext.len()]
    }

    pub fn dir(&self) -> &str {
        paths::dir(&self.0)
    }

    pub fn is_header(&self) -> bool {
        has_matching_extension(&self.0, HEADER_EXTENSIONS)
    }

    pub fn is_cc_file(&self) -> bool {
        self.is_header() || has_matching_extension(&self.0, SOURCE_EXTENSIONS)
    }

    /// Identity of the translation unit this file belongs to: the path
    /// without extension, case-folded. `foo.h` and `foo.cc` share it.
    pub fn group_id(&self) -> GroupId {
        let ext = self.extension();
        GroupId(self.0[..self.0.len() - ext.len()].to_lowercase())
    }

    /// Path relative to `dir`, or the full path when it is not beneath it.
    pub fn relative_to(&self, dir: &str) -> String {
        paths::rel(dir, &self.0).unwrap_or_else(|| self.0.clone())
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceFile {
    fn from(path: &str) -> Self {
        SourceFile::new("", path)
    }
}

/// Classification of a buildable C/C++ file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Header,
    Source,
    /// Implementation file defining a program entry point.
    Main,
    Test,
}

/// `#include` directives of a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Includes {
    /// `#include "..."`
    pub double_quote: Vec<String>,
    /// `#include <...>`
    pub bracket: Vec<String>,
}

/// Information extracted from a source file's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub includes: Includes,
    pub has_main: bool,
}

impl SourceInfo {
    /// Convenience constructor for a file with only quoted includes.
    pub fn with_quoted<'a>(includes: impl IntoIterator<Item = &'a str>) -> Self {
        SourceInfo {
            includes: Includes {
                double_quote: includes.into_iter().map(str::to_string).collect(),
                bracket: Vec::new(),
            },
            has_main: false,
        }
    }
}

pub type SourceInfos = BTreeMap<SourceFile, SourceInfo>;

/// Files of one directory, partitioned by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSet {
    pub srcs: Vec<SourceFile>,
    pub hdrs: Vec<SourceFile>,
    pub main_srcs: Vec<SourceFile>,
    pub test_srcs: Vec<SourceFile>,
    /// Files not recognized as C/C++ or that failed to parse.
    pub unmatched: Vec<SourceFile>,
    pub infos: SourceInfos,
}

impl SourceSet {
    /// Record a parsed file under the list matching `kind`.
    pub fn insert(&mut self, file: SourceFile, kind: SourceKind, info: SourceInfo) {
        match kind {
            SourceKind::Header => self.hdrs.push(file.clone()),
            SourceKind::Source => self.srcs.push(file.clone()),
            SourceKind::Main => self.main_srcs.push(file.clone()),
            SourceKind::Test => self.test_srcs.push(file.clone()),
        }
        self.infos.insert(file, info);
    }

    pub fn contains_buildable(&self, file: &SourceFile) -> bool {
        self.srcs.contains(file)
            || self.hdrs.contains(file)
            || self.main_srcs.contains(file)
            || self.test_srcs.contains(file)
    }

    pub fn is_empty(&self) -> bool {
        self.srcs.is_empty()
            && self.hdrs.is_empty()
            && self.main_srcs.is_empty()
            && self.test_srcs.is_empty()
    }
}

/// Name of a group of sources, and later of the rule built from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        GroupId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        GroupId(id.to_string())
    }
}

/// Sources that compile together, plus the groups they depend on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceGroup {
    pub sources: Vec<SourceFile>,
    /// Translation units folded into this group by cycle collapsing.
    /// Empty unless the group was formed from a cycle.
    pub sub_groups: Vec<GroupId>,
    pub depends_on: Vec<GroupId>,
}

impl SourceGroup {
    pub fn of(sources: Vec<SourceFile>) -> Self {
        SourceGroup {
            sources,
            ..SourceGroup::default()
        }
    }

    /// `(srcs, hdrs)` split of this group's files.
    pub fn partition(&self) -> (Vec<SourceFile>, Vec<SourceFile>) {
        partition_sources(&self.sources)
    }
}

/// Splits files into `(srcs, hdrs)`, preserving order.
pub fn partition_sources(files: &[SourceFile]) -> (Vec<SourceFile>, Vec<SourceFile>) {
    files.iter().cloned().partition(|f| !f.is_header())
}

/// Concatenate two slices keeping the first occurrence of every element.
pub fn concat_unique<T: Clone + Ord>(first: &[T], second: &[T]) -> Vec<T> {
    let mut seen = BTreeSet::new();
    first
        .iter()
        .chain(second)
        .filter(|v| seen.insert((*v).clone()))
        .cloned()
        .collect()
}
