//! Tree-sitter grammars for C and C++ sources

pub mod cc;

use ccgen_core::model::{has_matching_extension, HEADER_EXTENSIONS, SOURCE_EXTENSIONS};
use tree_sitter::Language;

/// Grammar used to parse a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    C,
    Cpp,
}

impl FileType {
    /// Determine the grammar from the file extension.
    ///
    /// Only `.c` files use the C grammar; headers are parsed as C++ since
    /// they may be shared by both languages.
    pub fn from_path(path: &str) -> Option<Self> {
        if has_matching_extension(path, &[".c"]) {
            Some(FileType::C)
        } else if has_matching_extension(path, SOURCE_EXTENSIONS)
            || has_matching_extension(path, HEADER_EXTENSIONS)
        {
            Some(FileType::Cpp)
        } else {
            None
        }
    }

    /// Get the tree-sitter language for this file type
    pub fn get_language(&self) -> Language {
        match self {
            FileType::C => tree_sitter_c::LANGUAGE.into(),
            FileType::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        }
    }
}
