//! blockdupe - Duplicate File Finder
//!
//! Entry point for the blockdupe CLI.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use blockdupe::cli::{Cli, OutputFormat};
use blockdupe::dedup::{FileDeduplicator, ScanOptions, ScanProgress};
use blockdupe::digests::DigestCatalog;
use blockdupe::logging;
use blockdupe::output::{JsonReport, RobotReport, Statistics};
use blockdupe::progress::ConsoleProgress;

fn main() {
    let cli = Cli::parse();

    // Initialize logging before anything can warn.
    logging::init_logging(cli.verbose, cli.quiet, cli.debug);

    if let Err(e) = run(&cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let chain = if cli.alg.is_empty() {
        DigestCatalog::default_chain()
    } else {
        DigestCatalog::select(&cli.alg)?
    };

    let mut dedup =
        FileDeduplicator::with_blocking(chain).with_ignore_empty(cli.ignore_empty);

    let mut progress = cli.progress.then(ConsoleProgress::stderr);
    for dir in &cli.dir {
        dedup
            .scan_with(
                dir,
                ScanOptions {
                    ignore_empty: None,
                    progress: progress.as_mut().map(|p| p as &mut dyn ScanProgress),
                },
            )
            .with_context(|| format!("scanning {}", dir.display()))?;
    }
    if let Some(progress) = progress.as_mut() {
        progress.finish();
    }

    let groups = dedup.duplicates();

    match &cli.outfile {
        Some(path) => {
            let mut file = File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            // The statistics block is a terminal affordance; file output
            // stays machine-clean regardless of verbosity.
            write_report(cli, &dedup, &groups, &mut file, false)?;
            file.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            write_report(cli, &dedup, &groups, &mut out, cli.verbose > 0)?;
            out.flush()?;
        }
    }

    Ok(())
}

fn write_report<W: Write>(
    cli: &Cli,
    dedup: &FileDeduplicator,
    groups: &[Vec<PathBuf>],
    out: &mut W,
    stats: bool,
) -> Result<()> {
    match cli.format {
        OutputFormat::Robot => {
            if stats {
                writeln!(out, "{}", "-".repeat(30))?;
            }
            RobotReport::new(groups).write_to(out)?;
            if stats {
                writeln!(out, "{}", "-".repeat(30))?;
                Statistics::new(dedup, groups).write_to(out)?;
            }
        }
        OutputFormat::Json => {
            JsonReport::new(dedup, groups).write_to(out, true)?;
        }
    }
    Ok(())
}
