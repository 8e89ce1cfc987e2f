//! Report writers for duplicate groups.
//!
//! Two formats: `robot`, a stable line-oriented format for scripts (one
//! duplicate group per line, tab-separated, fully sorted), and `json`
//! for anything richer. The verbose statistics block is separate so the
//! robot stream stays machine-clean.

use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::dedup::{FileDeduplicator, ScanSummary};
use crate::engine::FnSpec;

/// Format a byte count with binary prefixes, one decimal place.
///
/// The scale switches as soon as the count exceeds it: 1024 is still
/// `1024 B`, 1025 becomes `1.0 KiB`.
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const SCALES: [(&str, u64); 4] = [
        ("Ti", 1 << 40),
        ("Gi", 1 << 30),
        ("Mi", 1 << 20),
        ("Ki", 1 << 10),
    ];
    for (prefix, scale) in SCALES {
        if bytes > scale {
            return format!("{:.1} {}B", bytes as f64 / scale as f64, prefix);
        }
    }
    format!("{bytes} B")
}

/// Sorted tab-separated lines, one per group of two or more paths.
#[must_use]
pub fn robot_lines(groups: &[Vec<PathBuf>]) -> Vec<String> {
    let mut lines: Vec<String> = groups
        .iter()
        .filter(|g| g.len() > 1)
        .map(|g| {
            let mut paths: Vec<String> =
                g.iter().map(|p| p.display().to_string()).collect();
            paths.sort();
            paths.join("\t")
        })
        .collect();
    lines.sort();
    lines
}

/// The `robot` report: duplicate groups only, deterministic order.
pub struct RobotReport<'a> {
    groups: &'a [Vec<PathBuf>],
}

impl<'a> RobotReport<'a> {
    #[must_use]
    pub fn new(groups: &'a [Vec<PathBuf>]) -> Self {
        Self { groups }
    }

    /// Write the report to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for line in robot_lines(self.groups) {
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }
}

/// The verbose statistics block appended after a robot report.
pub struct Statistics<'a> {
    summary: &'a ScanSummary,
    specs: Vec<FnSpec>,
    invocations: Vec<u64>,
    collisions: Vec<u64>,
    groups: &'a [Vec<PathBuf>],
}

impl<'a> Statistics<'a> {
    #[must_use]
    pub fn new(dedup: &'a FileDeduplicator, groups: &'a [Vec<PathBuf>]) -> Self {
        Self {
            summary: dedup.summary(),
            specs: dedup.blocking(),
            invocations: dedup.count_digests(),
            collisions: dedup.count_collisions(),
            groups,
        }
    }

    /// Write the block to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let s = self.summary;
        let total =
            s.files_scanned + s.files_unreadable + s.hardlinks_skipped + s.empty_skipped;
        let unique = self.groups.iter().filter(|g| g.len() == 1).count();
        let dup_sets = self.groups.iter().filter(|g| g.len() > 1).count();
        let dup_files: usize = self
            .groups
            .iter()
            .filter(|g| g.len() > 1)
            .map(|g| g.len() - 1)
            .sum();

        writeln!(writer, "total files:     {total}")?;
        if s.files_unreadable > 0 {
            writeln!(
                writer,
                "unreadable:      {} ({})",
                s.files_unreadable,
                human_bytes(s.bytes_unreadable)
            )?;
        }
        writeln!(writer, "unique files:    {unique}")?;
        writeln!(writer, "duplicate sets:  {dup_sets}")?;
        writeln!(writer, "duplicate files: {dup_files}")?;

        for (level, spec) in self.specs.iter().enumerate() {
            let invocations = self.invocations.get(level).copied().unwrap_or(0);
            let collisions = self.collisions.get(level).copied().unwrap_or(0);
            writeln!(writer, "  {} : {invocations} {collisions}", spec.name)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct DigestStats {
    id: &'static str,
    name: &'static str,
    class: &'static str,
    invocations: u64,
    collisions: u64,
}

/// The `json` report: groups, scan summary, and per-digest counters.
pub struct JsonReport<'a> {
    dedup: &'a FileDeduplicator,
    groups: &'a [Vec<PathBuf>],
}

impl<'a> JsonReport<'a> {
    #[must_use]
    pub fn new(dedup: &'a FileDeduplicator, groups: &'a [Vec<PathBuf>]) -> Self {
        Self { dedup, groups }
    }

    /// Write the report to `writer`, pretty-printed if requested.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> io::Result<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            groups: &'a [Vec<PathBuf>],
            summary: &'a ScanSummary,
            digests: Vec<DigestStats>,
        }

        let invocations = self.dedup.count_digests();
        let collisions = self.dedup.count_collisions();
        let digests = self
            .dedup
            .blocking()
            .iter()
            .enumerate()
            .map(|(level, spec)| DigestStats {
                id: spec.id,
                name: spec.name,
                class: spec.class,
                invocations: invocations.get(level).copied().unwrap_or(0),
                collisions: collisions.get(level).copied().unwrap_or(0),
            })
            .collect();

        let body = Body {
            groups: self.groups,
            summary: self.dedup.summary(),
            digests,
        };

        if pretty {
            serde_json::to_writer_pretty(&mut *writer, &body)?;
        } else {
            serde_json::to_writer(&mut *writer, &body)?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_bytes_scales() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(42), "42 B");
        assert_eq!(human_bytes(1024), "1024 B");
        assert_eq!(human_bytes(1025), "1.0 KiB");
        assert_eq!(human_bytes(1536), "1.5 KiB");
        assert_eq!(human_bytes(1024 * 1024), "1024.0 KiB");
        assert_eq!(human_bytes(3 * 1024 * 1024), "3.0 MiB");
        assert_eq!(human_bytes(5 * 1024 * 1024 * 1024), "5.0 GiB");
        assert_eq!(human_bytes(2 * 1024 * 1024 * 1024 * 1024), "2.0 TiB");
    }

    #[test]
    fn test_robot_lines_sorted_and_filtered() {
        let groups = vec![
            vec![PathBuf::from("/x/unique.txt")],
            vec![PathBuf::from("/b/2.txt"), PathBuf::from("/a/1.txt")],
            vec![PathBuf::from("/a/0.txt"), PathBuf::from("/c/3.txt")],
        ];

        let lines = robot_lines(&groups);
        assert_eq!(
            lines,
            vec![
                "/a/0.txt\t/c/3.txt".to_string(),
                "/a/1.txt\t/b/2.txt".to_string(),
            ]
        );
    }

    #[test]
    fn test_robot_report_write() {
        let groups = vec![vec![
            PathBuf::from("/d/b.txt"),
            PathBuf::from("/d/a.txt"),
        ]];
        let mut buf = Vec::new();
        RobotReport::new(&groups).write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "/d/a.txt\t/d/b.txt\n");
    }

    #[test]
    fn test_robot_report_empty_when_no_duplicates() {
        let groups = vec![vec![PathBuf::from("/only.txt")]];
        let mut buf = Vec::new();
        RobotReport::new(&groups).write_to(&mut buf).unwrap();
        assert!(buf.is_empty());
    }
}
