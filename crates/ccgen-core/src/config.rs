//! Generator configuration, loaded from `.ccgen.toml`

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::paths;

/// Config file looked up at the repository root.
pub const CONFIG_FILE: &str = ".ccgen.toml";

/// How sources of a directory are split into rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    /// A single library per directory.
    #[default]
    Directory,
    /// A library per translation unit, or per cycle of translation units.
    Unit,
}

/// What to do when new groups fuse sources of several existing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleMode {
    /// Squash the implicated rules into one.
    #[default]
    Merge,
    /// Leave existing rules alone, wire them to each other and warn.
    Warn,
}

impl GroupingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupingMode::Directory => "directory",
            GroupingMode::Unit => "unit",
        }
    }
}

impl CycleMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleMode::Merge => "merge",
            CycleMode::Warn => "warn",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerateConfig {
    pub grouping: GroupingMode,
    pub cycles: CycleMode,
    /// Glob patterns of repository-relative paths to skip.
    pub exclude: Vec<String>,
    /// Header index files used to resolve includes, repository-relative.
    pub index_files: Vec<PathBuf>,
    /// Extra include search roots, tried after the repository root.
    pub search: Vec<SearchPath>,
}

/// An include search root: includes under `strip_include_prefix` are looked
/// up as workspace paths under `include_prefix`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchPath {
    pub strip_include_prefix: String,
    pub include_prefix: String,
}

impl SearchPath {
    pub fn new(strip_include_prefix: &str, include_prefix: &str) -> Self {
        SearchPath {
            strip_include_prefix: strip_include_prefix.to_string(),
            include_prefix: include_prefix.to_string(),
        }
    }

    /// Workspace path of `include` under this root, or `None` when the
    /// include does not start with the strip prefix.
    pub fn apply(&self, include: &str) -> Option<String> {
        let rest = if self.strip_include_prefix.is_empty() {
            include
        } else {
            include
                .strip_prefix(self.strip_include_prefix.as_str())?
                .strip_prefix('/')?
        };
        Some(paths::join([self.include_prefix.as_str(), rest]))
    }

    fn validate(&self) -> Result<()> {
        for prefix in [&self.strip_include_prefix, &self.include_prefix] {
            if prefix.is_empty() {
                continue;
            }
            let reason = if prefix.starts_with('/') {
                "must be relative"
            } else if paths::clean(prefix) != *prefix {
                "is not clean"
            } else {
                continue;
            };
            return Err(CoreError::InvalidSearchPath {
                path: prefix.clone(),
                reason,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Skip hidden headers and targets in `internal`/`impl` packages.
    pub exclude_internal: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        IndexConfig {
            exclude_internal: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub generate: GenerateConfig,
    pub index: IndexConfig,
}

impl Config {
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(|source| CoreError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })?;
        for search in &config.generate.search {
            search.validate()?;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text, path)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `.ccgen.toml` from `root`, or defaults when it does not exist.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Config::default())
        }
    }

    /// Compile the exclude patterns into a matcher.
    pub fn exclude_matcher(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.generate.exclude {
            let glob = Glob::new(pattern).map_err(|source| CoreError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| CoreError::InvalidPattern {
            pattern: self.generate.exclude.join(","),
            source,
        })
    }
}
