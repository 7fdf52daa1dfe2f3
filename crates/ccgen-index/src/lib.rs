//! ccgen index: maps include paths to the rules that provide them

pub mod error;
pub mod exclusions;
pub mod include_paths;
pub mod indexer;
pub mod targets;


pub use error::{IndexError, Result};
pub use exclusions::{ExclusionPolicy, InternalExclusions, NoExclusions};
pub use include_paths::indexable_include_paths;
pub use indexer::{create_header_index, HeaderIndex, IndexingResult, Module, Target};
pub use targets::{group_targets_by_headers, merge_into_roots, select_root_targets};
