use anyhow::Context;
use clap::{Parser, Subcommand};
use lsif_loom::output::OutputFormat;
use lsif_loom::{
    Aggregator, IndexMeta, Settings, collect_shard_paths, load_shards, logging, write_index,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

/// Weave per-compilation-unit index shards into one cross-reference graph
#[derive(Parser)]
#[command(
    name = "lsif-loom",
    version = env!("CARGO_PKG_VERSION"),
    about = "Merge per-unit code index shards and export a navigable LSIF graph"
)]
struct Cli {
    /// Path to a custom loom.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge shard files and emit the graph
    Merge {
        /// Shard files, or directories to scan for *.json shards
        #[arg(required = true)]
        shards: Vec<PathBuf>,

        /// Write the graph to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Absolute path or URI of the project being indexed
        #[arg(long)]
        project_root: Option<String>,

        /// Output protocol
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Emit extra diagnostic fields in the graph
        #[arg(long)]
        debug: bool,

        /// Number of parallel loading workers (overrides config)
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Error: failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Merge {
            shards,
            output,
            project_root,
            format,
            debug,
            threads,
        } => {
            if output.is_some() {
                settings.output = output;
            }
            if project_root.is_some() {
                settings.project_root = project_root;
            }
            if let Some(format) = format {
                settings.format = format;
            }
            if debug {
                settings.debug = true;
            }
            if let Some(threads) = threads {
                settings.threads = threads;
            }

            match run_merge(&settings, &shards) {
                Ok(true) => ExitCode::SUCCESS,
                Ok(false) => {
                    // The graph was still written from the units that did
                    // arrive; the failure only shows in the exit status.
                    eprintln!("Error: one or more compilation units failed to load");
                    ExitCode::FAILURE
                }
                Err(err) => {
                    eprintln!("Error: {err:#}");
                    ExitCode::FAILURE
                }
            }
        }

        Commands::Config => match toml::to_string_pretty(&settings) {
            Ok(rendered) => {
                println!("{rendered}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("Error: failed to render configuration: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

/// Load every shard, freeze the merged index, and serialize it.
///
/// Returns whether all compilation units loaded cleanly; the caller turns
/// that into the exit status.
fn run_merge(settings: &Settings, shards: &[PathBuf]) -> anyhow::Result<bool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(settings.threads)
        .build_global()
        .context("failed to configure the worker pool")?;

    let paths = collect_shard_paths(shards);
    anyhow::ensure!(!paths.is_empty(), "no shard files found under the given paths");
    tracing::info!(target: "merge", "merging {} shard(s)", paths.len());

    let aggregator = Aggregator::new();
    let stats = load_shards(&paths, &aggregator);

    let meta = IndexMeta {
        project_root: settings
            .project_root_uri()
            .context("failed to resolve project root")?
            .into(),
        format: settings.format,
        debug: settings.debug,
    };
    let snapshot = aggregator.freeze(meta);

    let summary = match &settings.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            let summary = write_index(&snapshot, &mut out)?;
            out.flush().context("failed to flush output")?;
            summary
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            let summary = write_index(&snapshot, &mut out)?;
            out.flush().context("failed to flush output")?;
            summary
        }
    };

    eprintln!(
        "{} symbols across {} documents ({} ranges); {} dangling reference(s) and {} dangling relation(s) skipped",
        summary.symbols,
        summary.documents,
        summary.ranges,
        summary.dangling_refs,
        summary.dangling_relations,
    );

    Ok(stats.all_ok())
}
