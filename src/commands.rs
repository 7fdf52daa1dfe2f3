//! CLI command implementations

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use ccgen_core::{paths, Config, Label};
use ccgen_index::{
    create_header_index, merge_into_roots, ExclusionPolicy, HeaderIndex, InternalExclusions, Module,
    NoExclusions,
};
use ccgen_rules::{
    generate_rules, local_index, CcInclude, Diagnostic, GenerateArgs, GeneratedRule,
    IncludeResolver, PriorRule, PriorRules, ResolvedDeps, RuleRef, RuleUpdate,
};
use ignore::WalkBuilder;
use serde::Serialize;

pub fn load_config(root: &Path, explicit: Option<&Path>) -> anyhow::Result<Config> {
    let config = match explicit {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(root)?,
    };
    Ok(config)
}

/// Generated rules of one package, with dependencies resolved.
#[derive(Debug, Serialize)]
pub struct PackageOutput {
    pub package: String,
    pub rules: Vec<ResolvedRule>,
    pub updates: Vec<RuleUpdate>,
    pub empty: Vec<RuleRef>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Serialize)]
pub struct ResolvedRule {
    #[serde(flatten)]
    pub rule: GeneratedRule,
    #[serde(flatten)]
    pub deps: ResolvedDeps,
}

/// Files of one package directory.
struct PackageDir {
    rel: String,
    path: PathBuf,
    files: Vec<String>,
}

pub fn generate(
    root: &Path,
    dir: Option<&Path>,
    prior: Option<&Path>,
    config: &Config,
) -> anyhow::Result<()> {
    let start = match dir {
        Some(dir) => root.join(dir),
        None => root.to_path_buf(),
    };
    tracing::info!(
        "Generating rules under {} (grouping: {}, cycles: {})",
        start.display(),
        config.generate.grouping.as_str(),
        config.generate.cycles.as_str()
    );

    let packages = walk_packages(root, &start, config)?;
    let prior_rules = load_prior_rules(prior)?;
    let external: Vec<HeaderIndex> = config
        .generate
        .index_files
        .iter()
        .map(|file| HeaderIndex::load(&root.join(file)))
        .collect::<Result<_, _>>()?;

    let root_name = std::fs::canonicalize(root)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "root".to_string());

    let mut generated = Vec::new();
    for package in &packages {
        let sources = ccgen_parser::collect_source_infos_parallel(
            &package.rel,
            &package.path,
            &package.files,
        )?;
        let proto_files: Vec<String> = package
            .files
            .iter()
            .filter(|name| name.ends_with(".proto"))
            .cloned()
            .collect();
        if sources.is_empty() && proto_files.is_empty() && !prior_rules.contains_key(&package.rel) {
            continue;
        }

        let prior = match PriorRules::from_rules(
            &package.rel,
            prior_rules.get(&package.rel).cloned().unwrap_or_default(),
        ) {
            Ok(prior) => prior,
            Err(e) => {
                tracing::error!("Skipping package //{}: {}", package.rel, e);
                continue;
            }
        };
        let dir_name = match paths::file_name(&package.rel) {
            "" => root_name.as_str(),
            name => name,
        };
        let args = GenerateArgs {
            rel: &package.rel,
            dir_name,
            sources: &sources,
            prior: &prior,
            grouping: config.generate.grouping,
            cycles: config.generate.cycles,
            proto_files: &proto_files,
            has_default_visibility: false,
        };
        match generate_rules(&args) {
            Ok(result) => generated.push((package.rel.clone(), result)),
            Err(e) => tracing::error!("Skipping package //{}: {}", package.rel, e),
        }
    }

    // Headers of all generated libraries are visible to every package.
    let mut local = HeaderIndex::default();
    for (rel, result) in &generated {
        for (hdr, label) in local_index(rel, &result.rules).iter() {
            local.insert(hdr.clone(), label.clone());
        }
    }

    let resolver = IncludeResolver::new(&local, &external).with_search(&config.generate.search);
    let outputs: Vec<PackageOutput> = generated
        .into_iter()
        .map(|(rel, result)| {
            let rules = result
                .rules
                .into_iter()
                .map(|target| {
                    let from = Label::new("", rel.as_str(), target.rule.name());
                    let deps = resolver.resolve_imports(&from, target.rule.kind(), &target.imports);
                    ResolvedRule {
                        rule: target.rule,
                        deps,
                    }
                })
                .collect();
            PackageOutput {
                package: rel,
                rules,
                updates: result.updates,
                empty: result.empty,
                diagnostics: result.diagnostics,
            }
        })
        .collect();

    tracing::info!("Generated rules for {} packages", outputs.len());
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

/// Group the files under `start` by directory, honoring `.gitignore` and the
/// configured exclude patterns. Directories are returned in path order.
fn walk_packages(root: &Path, start: &Path, config: &Config) -> anyhow::Result<Vec<PackageDir>> {
    if !start.is_dir() {
        anyhow::bail!("Path is not a directory: {}", start.display());
    }
    let excludes = config.exclude_matcher()?;

    let mut packages: BTreeMap<String, PackageDir> = BTreeMap::new();
    let walker = WalkBuilder::new(start)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .follow_links(false)
        .build();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot read entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Some(rel_path) = relative_slash_path(root, path) else {
            continue;
        };
        if excludes.is_match(&rel_path) {
            tracing::debug!("Excluded {}", rel_path);
            continue;
        }
        let Some(parent) = path.parent() else {
            continue;
        };
        let rel = paths::dir(&rel_path).to_string();
        let name = paths::file_name(&rel_path).to_string();
        packages
            .entry(rel.clone())
            .or_insert_with(|| PackageDir {
                rel,
                path: parent.to_path_buf(),
                files: Vec::new(),
            })
            .files
            .push(name);
    }

    let mut packages: Vec<PackageDir> = packages.into_values().collect();
    for package in &mut packages {
        package.files.sort();
    }
    tracing::debug!("Found {} directories", packages.len());
    Ok(packages)
}

fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(paths::join(parts.iter().map(String::as_str)))
}

/// Existing rules per package: `{"pkg/path": [{"name", "kind", "sources"}]}`.
fn load_prior_rules(path: Option<&Path>) -> anyhow::Result<BTreeMap<String, Vec<PriorRule>>> {
    let Some(path) = path else {
        return Ok(BTreeMap::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let prior = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(prior)
}

pub fn index(
    modules_file: &Path,
    output: &Path,
    exclude_internal: bool,
    merge_roots: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(modules_file)
        .with_context(|| format!("Failed to read {}", modules_file.display()))?;
    let mut modules: Vec<Module> =
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", modules_file.display()))?;
    tracing::info!("Indexing {} modules from {}", modules.len(), modules_file.display());

    if merge_roots {
        modules = modules.iter().map(merge_into_roots).collect::<Result<_, _>>()?;
    }

    let policy: &dyn ExclusionPolicy = if exclude_internal {
        &InternalExclusions
    } else {
        &NoExclusions
    };
    let result = create_header_index(&modules, policy);
    result.write_to_file(output)?;

    for (hdr, labels) in &result.ambiguous {
        let rendered: Vec<String> = labels.iter().map(Label::to_string).collect();
        tracing::warn!("Ambiguous header {} provided by {}", hdr, rendered.join(", "));
    }
    if verbose {
        tracing::debug!("{}", result);
    }
    Ok(())
}

pub fn resolve(
    index_files: &[PathBuf],
    includes: &[String],
    config: &Config,
) -> anyhow::Result<()> {
    let indexes: Vec<HeaderIndex> = index_files
        .iter()
        .map(|path| HeaderIndex::load(path))
        .collect::<Result<_, _>>()?;
    let local = HeaderIndex::default();
    let resolver = IncludeResolver::new(&local, &indexes).with_search(&config.generate.search);

    for include in includes {
        let path = paths::clean(include);
        let include_ref = CcInclude {
            raw: path.clone(),
            normalized: path,
            system: true,
        };
        match resolver.find_provider(&include_ref) {
            Some(label) => println!("{}\t{}", include, label),
            None => {
                tracing::warn!("No rule provides {}", include);
                println!("{}\t-", include);
            }
        }
    }
    Ok(())
}
