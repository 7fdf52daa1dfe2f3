use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write index file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize header index to json: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("malformed json in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("targets sharing headers in {repository:?} have no single root: {roots:?}")]
    AmbiguousRoot { repository: String, roots: Vec<String> },
}
