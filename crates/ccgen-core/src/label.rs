//! Bazel labels

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Fully-qualified identifier of a build rule or file:
/// `@repo//pkg:name`, `//pkg:name` or the package-relative `:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label {
    /// External repository name, empty for the main repository.
    pub repo: String,
    /// Slash-separated package path, empty for the repository root.
    pub pkg: String,
    pub name: String,
    /// `:name` form, resolved against the package of the BUILD file using it.
    pub relative: bool,
}

impl Label {
    pub fn new(repo: impl Into<String>, pkg: impl Into<String>, name: impl Into<String>) -> Self {
        Label {
            repo: repo.into(),
            pkg: pkg.into(),
            name: name.into(),
            relative: false,
        }
    }

    /// A `:name` label pointing at a rule in the same package.
    pub fn relative(name: impl Into<String>) -> Self {
        Label {
            name: name.into(),
            relative: true,
            ..Label::default()
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason| CoreError::InvalidLabel {
            label: input.to_string(),
            reason,
        };
        let s = input.trim();
        if s.is_empty() {
            return Err(invalid("empty label"));
        }
        if s.chars().any(char::is_whitespace) {
            return Err(invalid("label contains whitespace"));
        }

        if let Some(name) = s.strip_prefix(':') {
            if name.is_empty() || name.contains(':') {
                return Err(invalid("malformed target name"));
            }
            return Ok(Label::relative(name));
        }

        let (repo, rest) = if let Some(stripped) = s.strip_prefix('@') {
            let stripped = stripped.trim_start_matches('@');
            match stripped.find("//") {
                Some(idx) => (&stripped[..idx], &stripped[idx..]),
                None => (stripped, ""),
            }
        } else {
            ("", s)
        };

        if rest.is_empty() {
            if repo.is_empty() {
                return Err(invalid("missing repository name"));
            }
            return Ok(Label::new(repo, "", repo));
        }

        let body = rest
            .strip_prefix("//")
            .ok_or_else(|| invalid("expected '//' before package"))?;
        let (pkg, name) = match body.split_once(':') {
            Some((pkg, name)) => (pkg, name.to_string()),
            None => {
                let name = crate::paths::file_name(body);
                if name.is_empty() {
                    return Err(invalid("missing target name"));
                }
                (body, name.to_string())
            }
        };
        if name.is_empty() || name.contains(':') {
            return Err(invalid("malformed target name"));
        }
        if pkg.starts_with('/') || pkg.ends_with('/') {
            return Err(invalid("malformed package path"));
        }
        Ok(Label::new(repo, pkg, name))
    }

    /// Same target re-qualified into another repository.
    pub fn with_repo(&self, repo: &str) -> Self {
        Label {
            repo: repo.to_string(),
            relative: false,
            ..self.clone()
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relative {
            return write!(f, ":{}", self.name);
        }
        if !self.repo.is_empty() {
            write!(f, "@{}", self.repo)?;
        }
        if !self.pkg.is_empty() && crate::paths::file_name(&self.pkg) == self.name {
            write!(f, "//{}", self.pkg)
        } else {
            write!(f, "//{}:{}", self.pkg, self.name)
        }
    }
}

impl FromStr for Label {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Label::parse(s)
    }
}

impl TryFrom<String> for Label {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Label::parse(&value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.to_string()
    }
}

// Ordered by rendered form so sorted label lists read naturally in BUILD files.
impl Ord for Label {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl PartialOrd for Label {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
