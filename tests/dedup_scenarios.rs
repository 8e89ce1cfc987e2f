//! End-to-end scenarios for the file deduplicator.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use blockdupe::dedup::{FileDeduplicator, ScanOptions, ScanProgress};
use tempfile::TempDir;

/// Deterministic 42-byte payload shared by the duplicate fixtures.
fn payload() -> Vec<u8> {
    (0..42u8).map(|i| i.wrapping_mul(37).wrapping_add(11)).collect()
}

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    File::create(&path).unwrap().write_all(content).unwrap();
    path
}

fn dup_groups(groups: Vec<Vec<PathBuf>>) -> Vec<Vec<PathBuf>> {
    groups.into_iter().filter(|g| g.len() > 1).collect()
}

#[test]
fn identical_files_across_directories_form_one_group() {
    let root = TempDir::new().unwrap();
    let mut expected = Vec::new();
    for sub in ["one", "two", "three"] {
        let dir = root.path().join(sub);
        fs::create_dir(&dir).unwrap();
        expected.push(write_file(&dir, "data.bin", &payload()));
    }

    let mut dedup = FileDeduplicator::new();
    for sub in ["one", "two", "three"] {
        dedup.scan(root.path().join(sub)).unwrap();
    }

    let mut groups = dup_groups(dedup.duplicates());
    assert_eq!(groups.len(), 1);
    groups[0].sort();
    expected.sort();
    assert_eq!(groups[0], expected);
}

#[test]
fn different_content_same_size_stays_apart() {
    let dir = TempDir::new().unwrap();
    let mut other = payload();
    other[41] ^= 0xff;
    write_file(dir.path(), "a.bin", &payload());
    write_file(dir.path(), "b.bin", &other);

    let mut dedup = FileDeduplicator::new();
    dedup.scan(dir.path()).unwrap();

    assert!(dup_groups(dedup.duplicates()).is_empty());
    // The equal sizes collided at the first level and were resolved by a
    // later digest.
    let collisions = dedup.count_collisions();
    assert_eq!(collisions.first().copied(), Some(1));
    assert_eq!(collisions.last().copied(), Some(0));
}

#[cfg(unix)]
#[test]
fn hardlinks_count_once_and_resolve_to_a_canonical_path() {
    let dir = TempDir::new().unwrap();
    let original = write_file(dir.path(), "f00.bin", &payload());
    let mut all_names = vec![original.clone()];
    for i in 1..=10 {
        let link = dir.path().join(format!("f{i:02}.bin"));
        fs::hard_link(&original, &link).unwrap();
        all_names.push(link);
    }
    all_names.sort();

    let mut dedup = FileDeduplicator::new();
    dedup.scan(dir.path()).unwrap();

    // One path from the set reached the engine; the rest folded.
    let groups = dedup.duplicates();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 1);
    assert!(all_names.contains(&groups[0][0]));

    // One bucket holding all eleven names.
    let buckets = dedup.hardlinks();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].len(), 11);

    // Resolving picks the bucket minimum and persists it.
    let resolved =
        dedup.duplicates_with(|bucket| bucket.iter().min().unwrap().clone());
    assert_eq!(resolved[0], vec![all_names[0].clone()]);

    let unresolved = dedup.duplicates();
    assert_eq!(unresolved[0], vec![all_names[0].clone()]);

    // A different resolver rewrites the persisted path again; the new
    // canonical path sticks for later unresolved calls too.
    let resolved =
        dedup.duplicates_with(|bucket| bucket.iter().max().unwrap().clone());
    assert_eq!(resolved[0], vec![all_names[10].clone()]);
    assert_eq!(dedup.duplicates()[0], vec![all_names[10].clone()]);
}

#[cfg(unix)]
#[test]
fn unreadable_file_is_warned_and_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.bin", &payload());
    write_file(dir.path(), "b.bin", &payload());
    let locked = write_file(dir.path(), "c.bin", &payload());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Permission bits do not bind root; skip there.
    if File::open(&locked).is_ok() {
        return;
    }

    struct Flags {
        unreadable: Vec<PathBuf>,
    }
    impl ScanProgress for Flags {
        fn on_file_scanned(&mut self, _bytes: u64) {}
        fn on_unreadable(&mut self, path: &Path) {
            self.unreadable.push(path.to_path_buf());
        }
    }

    let mut flags = Flags {
        unreadable: Vec::new(),
    };
    let mut dedup = FileDeduplicator::new();
    dedup
        .scan_with(
            dir.path(),
            ScanOptions {
                ignore_empty: None,
                progress: Some(&mut flags),
            },
        )
        .unwrap();

    assert_eq!(flags.unreadable, vec![locked.clone()]);
    assert_eq!(dedup.summary().files_unreadable, 1);
    assert_eq!(dedup.summary().bytes_unreadable, 42);

    // The two readable copies still group.
    let groups = dup_groups(dedup.duplicates());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert!(!groups[0].contains(&locked));

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}

#[test]
fn default_chain_is_lazy_on_unique_sizes() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.bin", b"1");
    write_file(dir.path(), "b.bin", b"22");
    write_file(dir.path(), "c.bin", b"333");

    let mut dedup = FileDeduplicator::new();
    dedup.scan(dir.path()).unwrap();

    // Three distinct sizes: only the size digest ever ran, and only
    // because the files had to be told apart.
    assert_eq!(dedup.count_digests(), vec![3]);
    assert_eq!(dedup.count_collisions(), vec![0]);
}

#[test]
fn digest_chain_metadata_is_exposed() {
    let dedup = FileDeduplicator::new();
    let ids: Vec<_> = dedup.blocking().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["filesize", "initial_xxhash", "final_xxhash", "sha"]);
}

#[test]
fn empty_directory_produces_no_groups() {
    let dir = TempDir::new().unwrap();
    let mut dedup = FileDeduplicator::new();
    dedup.scan(dir.path()).unwrap();

    assert!(dedup.duplicates().is_empty());
    assert!(dedup.count_digests().is_empty());
    assert_eq!(dedup.summary().files_scanned, 0);
}
