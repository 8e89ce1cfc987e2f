//! Terminal progress line for long scans.
//!
//! Renders `scanned N files, <bytes>` to one stderr line, re-drawn after
//! every 1000 files. The line overwrites itself with a carriage return
//! and trailing padding, so a shrinking count never leaves stale
//! characters behind.

use std::io::{self, Write};
use std::path::Path;

use crate::dedup::ScanProgress;
use crate::output::human_bytes;

const RENDER_EVERY: u64 = 1000;

/// A self-overwriting progress line.
pub struct ConsoleProgress<W: Write> {
    out: W,
    files: u64,
    bytes: u64,
    last_len: usize,
}

impl ConsoleProgress<io::Stderr> {
    /// A progress line on stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ConsoleProgress<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            files: 0,
            bytes: 0,
            last_len: 0,
        }
    }

    fn render(&mut self) {
        let line = format!(
            "scanned {} files, {}",
            self.files,
            human_bytes(self.bytes)
        );
        let padding = self.last_len.saturating_sub(line.len());
        // Rendering failures (a closed stderr) are not worth surfacing.
        let _ = write!(self.out, "\r{line}{:padding$}", "");
        let _ = self.out.flush();
        self.last_len = line.len();
    }

    /// Render the final counts and move to a fresh line.
    pub fn finish(&mut self) {
        self.render();
        let _ = writeln!(self.out);
    }

    /// Files counted so far (scanned plus unreadable).
    #[must_use]
    pub fn files(&self) -> u64 {
        self.files
    }
}

impl<W: Write> ScanProgress for ConsoleProgress<W> {
    fn on_file_scanned(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
        if self.files % RENDER_EVERY == 0 {
            self.render();
        }
    }

    fn on_unreadable(&mut self, _path: &Path) {
        self.files += 1;
        if self.files % RENDER_EVERY == 0 {
            self.render();
        }
    }
}
