//! ccgen core: source model, labels, include graph and configuration

pub mod config;
pub mod error;
pub mod graph;
pub mod label;
pub mod model;
pub mod paths;

#[cfg(test)]
mod tests;

#[cfg(test)]
pub mod test_utils;

pub use config::{
    Config, CycleMode, GenerateConfig, GroupingMode, IndexConfig, SearchPath, CONFIG_FILE,
};
pub use error::{CoreError, Result};
pub use graph::{DependencyGraph, GroupNode};
pub use label::Label;
pub use model::{
    concat_unique, has_matching_extension, partition_sources, GroupId, Includes, SourceFile,
    SourceGroup, SourceInfo, SourceInfos, SourceKind, SourceSet, HEADER_EXTENSIONS,
    SOURCE_EXTENSIONS,
};
