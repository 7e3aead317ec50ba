//! trawl - A filter-driven recursive file finder.
//!
//! Usage:
//!   trawl [PATHS]...                     List every file below PATHS
//!   trawl src --ext rs --modified "<2d"  Rust sources changed recently
//!   trawl . --dirs --glob "target"       Directories named target
//!   trawl --help                         Show help

use std::path::PathBuf;

use chrono::{DateTime, Local};
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::EnvFilter;

use trawl_walk::{Finder, Match};

#[derive(Parser)]
#[command(
    name = "trawl",
    version,
    about = "A filter-driven recursive file finder",
    long_about = "trawl walks one or more directories and prints the entries that \
                  pass every filter.\n\n\
                  Size expressions look like \"<10kb\" or \">= 1mb\"; time \
                  expressions like \"< 2 days\" or \">1y\" and compare the age \
                  of the timestamp."
)]
struct Cli {
    /// Directories to search (defaults to current directory)
    paths: Vec<PathBuf>,

    /// Match file extensions (repeatable, leading dot optional)
    #[arg(short, long = "ext")]
    ext: Vec<String>,

    /// Match names against glob patterns (repeatable, any may match)
    #[arg(short, long = "glob")]
    glob: Vec<String>,

    /// Exclude paths matching a regex (repeatable)
    #[arg(short = 'x', long = "discard")]
    discard: Vec<String>,

    /// Size comparison, e.g. "<10kb"
    #[arg(short, long)]
    size: Option<String>,

    /// Match zero-byte files
    #[arg(long)]
    empty: bool,

    /// Modification age comparison, e.g. "< 2 days"
    #[arg(short, long)]
    modified: Option<String>,

    /// Access age comparison
    #[arg(long)]
    accessed: Option<String>,

    /// Status change age comparison
    #[arg(long)]
    changed: Option<String>,

    /// Maximum directory depth below each root (0 = direct children only)
    #[arg(short, long)]
    depth: Option<u32>,

    /// Skip hidden files
    #[arg(long)]
    ignore_hidden: bool,

    /// Do not descend into hidden directories
    #[arg(long)]
    ignore_hidden_dirs: bool,

    /// Return directories instead of files
    #[arg(long)]
    dirs: bool,

    /// Match Unix domain sockets only
    #[arg(long)]
    socket: bool,

    /// Invert the combined filters
    #[arg(short, long)]
    not: bool,

    /// Include size and modification time
    #[arg(long)]
    stats: bool,

    /// Walk with blocking calls instead of concurrently
    #[arg(long)]
    sync: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    fn finder(&self) -> Finder {
        let mut finder = Finder::new().paths(self.paths.iter().cloned());

        if let Some(depth) = self.depth {
            finder = finder.depth(depth);
        }
        if !self.ext.is_empty() {
            finder = finder.ext(&self.ext);
        }
        if !self.glob.is_empty() {
            finder = finder.glob(&self.glob);
        }
        if !self.discard.is_empty() {
            finder = finder.discard(&self.discard);
        }
        if let Some(expr) = &self.size {
            finder = finder.size(expr);
        }
        if let Some(expr) = &self.modified {
            finder = finder.modified(expr);
        }
        if let Some(expr) = &self.accessed {
            finder = finder.accessed(expr);
        }
        if let Some(expr) = &self.changed {
            finder = finder.changed(expr);
        }
        if self.empty {
            finder = finder.empty();
        }
        if self.socket {
            finder = finder.socket();
        }
        if self.ignore_hidden {
            finder = finder.ignore_hidden_files();
        }
        if self.ignore_hidden_dirs {
            finder = finder.ignore_hidden_dirs();
        }
        if self.dirs {
            finder = finder.directories();
        }
        if self.stats {
            finder = finder.include_stats();
        }
        if self.not {
            finder = finder.negate();
        }
        finder
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let finder = cli.finder();

    let results = if cli.sync {
        finder.find_sync().context("Search failed")?
    } else {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
        runtime.block_on(finder.find()).context("Search failed")?
    };

    match cli.format {
        OutputFormat::Text => {
            for result in &results {
                println!("{}", format_line(result));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
    }

    Ok(())
}

/// Format one result for text output.
fn format_line(result: &Match) -> String {
    match result.stats() {
        None => result.path().display().to_string(),
        Some(stats) => {
            let modified: DateTime<Local> = stats.timestamps.modified.into();
            format!(
                "{:>10}  {}  {}",
                format_size(stats.size),
                modified.format("%Y-%m-%d %H:%M"),
                result.path().display()
            )
        }
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
