//! Logging setup on top of the `log` facade and `env_logger`.
//!
//! Levels come from the CLI flags unless `RUST_LOG` is set, which always
//! wins:
//!
//! 1. `--quiet`: errors only (warnings about unreadable files included)
//! 2. default: warnings
//! 3. `-v`: info, `-vv`: debug, `-vvv`: trace
//!
//! `--debug` switches to a format that appends ` at FILE line N` to every
//! record; the default format is level and message only.

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the logging subsystem. Call once, before any log output.
pub fn init_logging(verbose: u8, quiet: bool, debug: bool) {
    let mut builder = Builder::new();

    if env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    if debug {
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{:<5} {} at {} line {}",
                record.level(),
                record.args(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0)
            )
        });
    } else {
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }

    builder.init();
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
