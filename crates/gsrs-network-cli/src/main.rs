//! `gsrs-network`: write one network document per substance in a GSRS dump.
//!
//! The dump is read as JSON lines, either plain or as a gzip-compressed
//! `.gsrs` export.

mod dump;
mod writer;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use colored::Colorize;
use gsrs_network_core::record::DEFAULT_REFERENCE_FIELD;
use gsrs_network_core::state::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_ELEMENTS, DEFAULT_MAX_LINKS_PER_NODE};
use gsrs_network_core::{
    generate_networks, generate_networks_parallel, GenerationSummary, LinkClassifier,
    NetworkOptions, RecordOptions,
};
use tracing_subscriber::EnvFilter;

use crate::writer::JsonDirWriter;

#[derive(Parser, Debug)]
#[command(name = "gsrs-network")]
#[command(author, version, about = "Generate substance network JSON documents from a GSRS dump")]
struct Cli {
    /// Dump file with one JSON record per line, plain or gzip (`-` for stdin)
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Output directory, created if missing
    #[arg(short = 'd', long = "out-dir", default_value = "jsons")]
    out_dir: PathBuf,

    /// Maximum number of expansion levels
    #[arg(short = 'l', long = "levels", default_value_t = DEFAULT_MAX_DEPTH)]
    levels: usize,

    /// Maximum nodes plus links added beyond the root
    #[arg(short = 'm', long, default_value_t = DEFAULT_MAX_ELEMENTS)]
    max_elements: usize,

    /// Maximum links produced from a single node
    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_LINKS_PER_NODE)]
    max_links_per_node: usize,

    /// Field marking an object as a reference to another record
    #[arg(long, default_value = DEFAULT_REFERENCE_FIELD)]
    reference_field: String,

    /// Top-level section scanned for references (repeatable; default `relationships`)
    #[arg(long = "section", conflicts_with = "all_sections")]
    sections: Vec<String>,

    /// Scan the whole record for references
    #[arg(long)]
    all_sections: bool,

    /// Only generate networks for these record ids (repeatable)
    #[arg(long = "root")]
    roots: Vec<String>,

    /// Indent the written JSON
    #[arg(long)]
    pretty: bool,

    /// Materialize roots on a thread pool
    #[arg(long)]
    parallel: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn record_options(&self) -> RecordOptions {
        let reference_sections = if self.all_sections {
            Vec::new()
        } else if self.sections.is_empty() {
            RecordOptions::default().reference_sections
        } else {
            self.sections.clone()
        };
        RecordOptions {
            reference_field: self.reference_field.clone(),
            reference_sections,
        }
    }

    fn network_options(&self) -> NetworkOptions {
        NetworkOptions {
            max_depth: self.levels,
            max_elements: self.max_elements,
            max_links_per_node: self.max_links_per_node,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let (store, report) = dump::load_store(&cli.file, cli.record_options())?;
    let writer = JsonDirWriter::create(&cli.out_dir, cli.pretty)?;
    let options = cli.network_options();
    let classifier = LinkClassifier::default();
    let roots = (!cli.roots.is_empty()).then_some(cli.roots.as_slice());

    let summary = if cli.parallel {
        generate_networks_parallel(&store, roots, &options, &classifier, &writer)
    } else {
        generate_networks(&store, roots, &options, &classifier, &writer)
    };

    print_summary(&summary, report.skipped, &writer);

    if summary.written == 0 {
        bail!("no network documents were written");
    }
    Ok(())
}

fn print_summary(summary: &GenerationSummary, skipped_lines: usize, writer: &JsonDirWriter) {
    eprintln!(
        "{} {} network document(s) to {}",
        "wrote".green().bold(),
        summary.written,
        writer.dir().display().to_string().bold()
    );
    if summary.budget_exhausted > 0 {
        eprintln!(
            "  {} {} document(s) hit the element budget",
            "note:".cyan(),
            summary.budget_exhausted
        );
    }
    if skipped_lines > 0 {
        eprintln!("  {} skipped {} malformed line(s)", "warning:".yellow().bold(), skipped_lines);
    }
    if summary.missing_roots > 0 {
        eprintln!(
            "  {} {} requested root(s) not in the dump",
            "warning:".yellow().bold(),
            summary.missing_roots
        );
    }
    if summary.failed > 0 {
        eprintln!("  {} {} document(s) failed to write", "error:".red().bold(), summary.failed);
    }
}
