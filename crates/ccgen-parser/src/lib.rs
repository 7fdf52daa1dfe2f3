//! Include extraction and source classification for C/C++ files

pub mod collect;
pub mod error;
pub mod extractor;
pub mod languages;


pub use collect::{classify, collect_source_infos, collect_source_infos_parallel};
pub use error::{ParseError, Result};
pub use extractor::{IncludeExtractor, SourceExtractor};
