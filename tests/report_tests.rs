//! Report formatting over a real scan.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use blockdupe::dedup::FileDeduplicator;
use blockdupe::output::{JsonReport, RobotReport, Statistics};
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, content: &[u8]) {
    File::create(dir.join(name))
        .unwrap()
        .write_all(content)
        .unwrap();
}

fn scanned_fixture() -> (TempDir, FileDeduplicator) {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "dup_b.bin", b"same bytes");
    write_file(dir.path(), "dup_a.bin", b"same bytes");
    write_file(dir.path(), "unique.bin", b"different bytes");

    let mut dedup = FileDeduplicator::new();
    dedup.scan(dir.path()).unwrap();
    (dir, dedup)
}

#[test]
fn robot_report_lists_sorted_duplicate_groups() {
    let (dir, dedup) = scanned_fixture();
    let groups = dedup.duplicates();

    let mut out = Vec::new();
    RobotReport::new(&groups).write_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    let a = dir.path().join("dup_a.bin");
    let b = dir.path().join("dup_b.bin");
    assert_eq!(text, format!("{}\t{}\n", a.display(), b.display()));
}

#[test]
fn statistics_block_counts_and_digest_lines() {
    let (_dir, dedup) = scanned_fixture();
    let groups = dedup.duplicates();

    let mut out = Vec::new();
    Statistics::new(&dedup, &groups)
        .write_to(&mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("total files:     3"));
    assert!(text.contains("unique files:    1"));
    assert!(text.contains("duplicate sets:  1"));
    assert!(text.contains("duplicate files: 1"));
    // Nothing was unreadable, so that line is omitted.
    assert!(!text.contains("unreadable"));
    // One line per configured digest level.
    assert!(text.contains("file size :"));
    assert!(text.contains("SHA-1 of entire file :"));
}

#[test]
fn json_report_round_trips_through_serde() {
    let (_dir, dedup) = scanned_fixture();
    let groups = dedup.duplicates();

    let mut out = Vec::new();
    JsonReport::new(&dedup, &groups)
        .write_to(&mut out, false)
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(value["groups"].as_array().unwrap().len(), groups.len());
    assert_eq!(value["summary"]["files_scanned"], 3);
    let digests = value["digests"].as_array().unwrap();
    assert_eq!(digests.len(), 4);
    assert_eq!(digests[0]["id"], "filesize");
    // Two same-size files forced the size digest on both; the unique
    // size never needed more than the first level.
    assert_eq!(digests[0]["invocations"], 3);
}
