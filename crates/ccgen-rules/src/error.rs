use ccgen_core::{GroupId, SourceFile};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RulesError>;

/// Invariant violations. Any of these aborts generation for the directory.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RulesError {
    #[error("inconsistent source groups, file {file} assigned to both groups {first} and {second}")]
    InconsistentGroups {
        file: SourceFile,
        first: GroupId,
        second: GroupId,
    },

    #[error("inconsistent existing rules, source {file} is claimed by both {first} and {second}")]
    InconsistentPriorState {
        file: SourceFile,
        first: String,
        second: String,
    },
}
