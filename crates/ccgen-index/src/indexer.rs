//! Header index: maps `#include` paths to the rules exposing them
//!
//! Modules describe (possibly external) repositories and their
//! `cc_library`-like targets. Every header of every target is expanded to
//! all of its include spellings; a spelling provided by exactly one target
//! becomes an index entry, one provided by several is reported as ambiguous.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use ccgen_core::Label;
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::exclusions::ExclusionPolicy;
use crate::include_paths::indexable_include_paths;

/// A repository and the targets defined in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// External repository name, empty for the main repository.
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// Attributes of a `cc_library`-like rule relevant to header visibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: Label,
    /// Header files; each label's name is the path within its package.
    #[serde(default)]
    pub hdrs: Vec<Label>,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub strip_include_prefix: String,
    #[serde(default)]
    pub include_prefix: String,
    #[serde(default)]
    pub deps: Vec<Label>,
}

impl Target {
    pub fn new(name: Label) -> Self {
        Target {
            name,
            ..Target::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingResult {
    /// Headers provided by exactly one rule.
    pub header_to_rule: BTreeMap<String, Label>,
    /// Headers provided by several rules, with the sorted candidates.
    pub ambiguous: BTreeMap<String, Vec<Label>>,
}

/// Build the header index of `modules`.
///
/// Target labels are re-qualified with their module's repository so that
/// headers of external modules resolve to labels usable from the main one.
pub fn create_header_index(modules: &[Module], policy: &dyn ExclusionPolicy) -> IndexingResult {
    let mut candidates: BTreeMap<String, BTreeSet<Label>> = BTreeMap::new();
    for module in modules {
        for target in &module.targets {
            let label = target.name.with_repo(&module.repository);
            if policy.exclude_target(&label) {
                tracing::debug!("Skipping internal target {}", label);
                continue;
            }
            for hdr in &target.hdrs {
                for spelling in indexable_include_paths(&hdr.name, target) {
                    if policy.exclude_header(&spelling) {
                        continue;
                    }
                    candidates.entry(spelling).or_default().insert(label.clone());
                }
            }
        }
    }

    let mut result = IndexingResult::default();
    for (path, labels) in candidates {
        let mut labels: Vec<Label> = labels.into_iter().collect();
        if labels.len() == 1 {
            if let Some(label) = labels.pop() {
                result.header_to_rule.insert(path, label);
            }
        } else {
            labels.sort();
            result.ambiguous.insert(path, labels);
        }
    }
    tracing::debug!(
        "Indexed {} headers from {} modules, {} ambiguous",
        result.header_to_rule.len(),
        modules.len(),
        result.ambiguous.len()
    );
    result
}

impl IndexingResult {
    /// Flat JSON object of unambiguous entries, labels rendered as strings.
    pub fn to_json(&self) -> Result<String> {
        let mappings: BTreeMap<&str, String> = self
            .header_to_rule
            .iter()
            .map(|(hdr, label)| (hdr.as_str(), label.to_string()))
            .collect();
        Ok(serde_json::to_string_pretty(&mappings)?)
    }

    /// Write [`IndexingResult::to_json`] to `path`, creating parent directories.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let data = self.to_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| IndexError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, data).map_err(|source| IndexError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Wrote {} header mappings to {}", self.header_to_rule.len(), path.display());
        Ok(())
    }
}

impl fmt::Display for IndexingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Indexing result:")?;
        writeln!(f, "Headers with mapping: {}", self.header_to_rule.len())?;
        for (hdr, label) in &self.header_to_rule {
            writeln!(f, "{:<80}: {}", hdr, label)?;
        }
        writeln!(f, "Ambiguous headers: {}", self.ambiguous.len())?;
        for (hdr, labels) in &self.ambiguous {
            let rendered: Vec<String> = labels.iter().map(Label::to_string).collect();
            writeln!(f, "{:<80}: [{}]", hdr, rendered.join(", "))?;
        }
        Ok(())
    }
}

/// A loaded header index, include path to owning label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    entries: BTreeMap<String, Label>,
}

impl HeaderIndex {
    /// Parse an index file. Entries whose label does not parse are skipped.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self> {
        let raw: BTreeMap<String, String> =
            serde_json::from_str(text).map_err(|source| IndexError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        let mut entries = BTreeMap::new();
        for (hdr, label) in raw {
            match Label::parse(&label) {
                Ok(label) => {
                    entries.insert(hdr, label);
                }
                Err(e) => {
                    tracing::warn!("Skipping index entry {} in {}: {}", hdr, origin.display(), e)
                }
            }
        }
        Ok(HeaderIndex { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::from_json(&text, path)?;
        tracing::debug!("Loaded {} header mappings from {}", index.len(), path.display());
        Ok(index)
    }

    pub fn get(&self, include: &str) -> Option<&Label> {
        self.entries.get(include)
    }

    pub fn insert(&mut self, include: impl Into<String>, label: Label) {
        self.entries.insert(include.into(), label);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Label)> {
        self.entries.iter()
    }
}
