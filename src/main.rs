//! ccgen CLI entry point

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ccgen")]
#[command(about = "Bazel C/C++ rule generator and header indexer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (defaults to .ccgen.toml in the repository root)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate cc rules for every package under a directory
    Generate {
        /// Directory to process, relative to the root (defaults to the whole repository)
        dir: Option<PathBuf>,

        /// Override the configured grouping mode
        #[arg(long, value_enum)]
        grouping: Option<GroupingArg>,

        /// Override the configured cycle handling mode
        #[arg(long, value_enum)]
        cycles: Option<CyclesArg>,

        /// JSON file with the existing rules of each package
        #[arg(long)]
        prior: Option<PathBuf>,
    },
    /// Build a header index from a JSON list of modules
    Index {
        /// JSON file listing modules and their targets
        #[arg(long)]
        modules: PathBuf,

        /// Where to write the index
        #[arg(short, long)]
        output: PathBuf,

        /// Also index headers of internal targets and hidden paths
        #[arg(long)]
        keep_internal: bool,

        /// Fold targets sharing headers into the target on top of their dependency chain
        #[arg(long)]
        merge_roots: bool,
    },
    /// Print the rule providing each include path
    Resolve {
        /// Header index files, searched in order
        #[arg(long = "index", required = true)]
        indexes: Vec<PathBuf>,

        /// Include paths to resolve
        #[arg(required = true)]
        includes: Vec<String>,
    },
    /// Show version
    Version,
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupingArg {
    Directory,
    Unit,
}

#[derive(Clone, Copy, ValueEnum)]
enum CyclesArg {
    Merge,
    Warn,
}

impl From<GroupingArg> for ccgen_core::GroupingMode {
    fn from(arg: GroupingArg) -> Self {
        match arg {
            GroupingArg::Directory => ccgen_core::GroupingMode::Directory,
            GroupingArg::Unit => ccgen_core::GroupingMode::Unit,
        }
    }
}

impl From<CyclesArg> for ccgen_core::CycleMode {
    fn from(arg: CyclesArg) -> Self {
        match arg {
            CyclesArg::Merge => ccgen_core::CycleMode::Merge,
            CyclesArg::Warn => ccgen_core::CycleMode::Warn,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, stdout carries command output
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("ccgen={}", log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("ccgen v{}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Repository root: {}", cli.root.display());

    let config = commands::load_config(&cli.root, cli.config.as_deref())?;

    match cli.command {
        Commands::Generate {
            dir,
            grouping,
            cycles,
            prior,
        } => {
            let mut config = config;
            if let Some(grouping) = grouping {
                config.generate.grouping = grouping.into();
            }
            if let Some(cycles) = cycles {
                config.generate.cycles = cycles.into();
            }
            commands::generate(&cli.root, dir.as_deref(), prior.as_deref(), &config)
        }
        Commands::Index {
            modules,
            output,
            keep_internal,
            merge_roots,
        } => {
            let exclude_internal = config.index.exclude_internal && !keep_internal;
            commands::index(&modules, &output, exclude_internal, merge_roots, cli.verbose)
        }
        Commands::Resolve { indexes, includes } => {
            commands::resolve(&indexes, &includes, &config)
        }
        Commands::Version => {
            println!("ccgen v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
