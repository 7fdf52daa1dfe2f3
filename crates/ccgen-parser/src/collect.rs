//! Classification of a directory's files into a `SourceSet`

use std::path::Path;

use ccgen_core::{SourceFile, SourceInfo, SourceKind, SourceSet};
use rayon::prelude::*;

use crate::error::{ParseError, Result};
use crate::extractor::{IncludeExtractor, SourceExtractor};

/// Classify a parsed C/C++ file by name and content.
///
/// Headers win over everything else; a base name starting or ending with
/// `test` marks a test; a `main` definition marks a program entry point.
pub fn classify(file: &SourceFile, info: &SourceInfo) -> SourceKind {
    let base_name = file.base_name().to_lowercase();
    if file.is_header() {
        SourceKind::Header
    } else if base_name.starts_with("test") || base_name.ends_with("test") {
        SourceKind::Test
    } else if info.has_main {
        SourceKind::Main
    } else {
        SourceKind::Source
    }
}

enum Outcome {
    Parsed(SourceFile, SourceKind, SourceInfo),
    Unmatched(SourceFile),
}

fn process_file<E: SourceExtractor>(
    extractor: &mut E,
    rel: &str,
    dir: &Path,
    name: &str,
) -> Outcome {
    let file = SourceFile::new(rel, name);
    if !file.is_cc_file() {
        return Outcome::Unmatched(file);
    }
    let path = dir.join(name);
    let parsed = std::fs::read(&path)
        .map_err(|source| ParseError::Read {
            path: path.clone(),
            source,
        })
        .and_then(|content| extractor.extract(file.as_str(), &content));
    match parsed {
        Ok(info) => {
            let kind = classify(&file, &info);
            Outcome::Parsed(file, kind, info)
        }
        Err(e) => {
            tracing::warn!("Failed to parse source {}, reason: {}", path.display(), e);
            Outcome::Unmatched(file)
        }
    }
}

fn assemble(outcomes: impl IntoIterator<Item = Outcome>) -> SourceSet {
    let mut set = SourceSet::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Parsed(file, kind, info) => set.insert(file, kind, info),
            Outcome::Unmatched(file) => set.unmatched.push(file),
        }
    }
    set
}

/// Parse and classify `file_names` found in `dir`, whose workspace-relative
/// path is `rel`.
pub fn collect_source_infos<E: SourceExtractor>(
    rel: &str,
    dir: &Path,
    file_names: &[String],
    extractor: &mut E,
) -> SourceSet {
    assemble(
        file_names
            .iter()
            .map(|name| process_file(extractor, rel, dir, name))
            .collect::<Vec<_>>(),
    )
}

/// Same as [`collect_source_infos`], parsing files on the rayon pool.
///
/// Output order follows `file_names`, so results are identical to the
/// sequential version.
pub fn collect_source_infos_parallel(
    rel: &str,
    dir: &Path,
    file_names: &[String],
) -> Result<SourceSet> {
    // Fail early if a grammar cannot be loaded instead of once per file.
    IncludeExtractor::new()?;

    let outcomes: Vec<Outcome> = file_names
        .par_iter()
        .map_init(
            || IncludeExtractor::new().ok(),
            |extractor, name| match extractor {
                Some(extractor) => process_file(extractor, rel, dir, name),
                None => Outcome::Unmatched(SourceFile::new(rel, name)),
            },
        )
        .collect();
    Ok(assemble(outcomes))
}
