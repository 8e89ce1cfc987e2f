//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # Report duplicate files under two trees
//! blockdupe -d ~/photos -d /mnt/backup/photos
//!
//! # Cheap chain only, machine output to a file
//! blockdupe -d ~/media -a filesize -a initial_xxhash -o dupes.tsv
//!
//! # Verbose run with a progress line
//! blockdupe -d /srv/data -v -P
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Report format for the duplicate groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One duplicate group per line, tab-separated, fully sorted.
    Robot,
    /// Groups plus scan summary and per-digest counters.
    Json,
}

/// Duplicate file finder built on lazy hierarchical blocking.
///
/// Files are grouped by a chain of digests that runs from free (size) to
/// expensive (whole-file SHA-1); each digest is computed only for files
/// that are still indistinguishable from another file.
#[derive(Debug, Parser)]
#[command(name = "blockdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan (repeat for several roots)
    #[arg(short = 'd', long = "dir", value_name = "DIR", required = true)]
    pub dir: Vec<PathBuf>,

    /// Digest chain by id, in order (repeatable). Default:
    /// filesize, initial_xxhash, final_xxhash, sha
    #[arg(short = 'a', long = "alg", value_name = "ID")]
    pub alg: Vec<String>,

    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long = "outfile", value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Report format
    #[arg(short = 'f', long = "format", value_enum, default_value = "robot")]
    pub format: OutputFormat,

    /// Render a progress line on stderr during the scan
    #[arg(short = 'P', long = "progress")]
    pub progress: bool,

    /// Skip zero-length files
    #[arg(long = "ignore-empty")]
    pub ignore_empty: bool,

    /// Suppress warnings
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase verbosity (-v adds the statistics block, -vv debug logs)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Include source locations in warnings and log output
    #[arg(long = "debug")]
    pub debug: bool,
}
