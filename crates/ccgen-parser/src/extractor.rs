//! Source extractor trait and the tree-sitter backed implementation

use ccgen_core::SourceInfo;
use tree_sitter::Parser;

use crate::error::{ParseError, Result};
use crate::languages::{cc, FileType};

pub trait SourceExtractor {
    /// Extract includes and entry-point presence from a file's content.
    fn extract(&mut self, path: &str, content: &[u8]) -> Result<SourceInfo>;
}

/// Include extractor owning one parser per grammar.
///
/// Parsers are not shareable between threads; create one extractor per
/// worker.
pub struct IncludeExtractor {
    c: Parser,
    cpp: Parser,
}

impl IncludeExtractor {
    pub fn new() -> Result<Self> {
        let mut c = Parser::new();
        c.set_language(&FileType::C.get_language())?;
        let mut cpp = Parser::new();
        cpp.set_language(&FileType::Cpp.get_language())?;
        Ok(IncludeExtractor { c, cpp })
    }

    fn parser_for(&mut self, path: &str) -> &mut Parser {
        match FileType::from_path(path) {
            Some(FileType::C) => &mut self.c,
            _ => &mut self.cpp,
        }
    }
}

impl SourceExtractor for IncludeExtractor {
    fn extract(&mut self, path: &str, content: &[u8]) -> Result<SourceInfo> {
        let source = std::str::from_utf8(content).map_err(|_| ParseError::NotUtf8 {
            path: path.to_string(),
        })?;
        let tree = self
            .parser_for(path)
            .parse(source, None)
            .ok_or_else(|| ParseError::NoTree {
                path: path.to_string(),
            })?;
        let info = cc::extract_source_info(tree.root_node(), source.as_bytes());
        tracing::debug!(
            "Extracted {} quoted and {} bracket includes from {}",
            info.includes.double_quote.len(),
            info.includes.bracket.len(),
            path
        );
        Ok(info)
    }
}
