use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: String },

    #[error("failed to set tree-sitter language: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("tree-sitter produced no syntax tree for {path}")]
    NoTree { path: String },
}
