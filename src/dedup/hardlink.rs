//! Inode bucketing for hardlink handling.
//!
//! Hardlinks are several directory entries naming the same inode; their
//! content is one file, not duplicates of each other. Within one scan
//! every regular file is recorded under its (device, inode) identity:
//! the first path of a bucket is fed to the engine, later paths join the
//! bucket and skip digesting entirely. Folding is scoped to a single
//! scan: a second scan of the same tree starts fresh and feeds its
//! paths again, so cross-scan sightings count as duplicates.
//!
//! The accumulated buckets double as the lookup table for canonical-path
//! rewriting after ingestion.
//!
//! On platforms without inode identities every path gets its own bucket,
//! which disables hardlink folding without changing anything else.

use std::collections::HashMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

/// Groups scanned paths by filesystem identity.
#[derive(Debug, Default)]
pub struct HardlinkIndex {
    buckets: Vec<Vec<PathBuf>>,
    by_path: HashMap<PathBuf, usize>,
}

impl HardlinkIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a scan-scoped recording session.
    ///
    /// Buckets created through the session land in this index, but inode
    /// folding only spans the session's own sightings.
    pub(super) fn session(&mut self) -> ScanSession<'_> {
        ScanSession {
            index: self,
            by_inode: HashMap::new(),
        }
    }

    /// All buckets in first-seen order; every bucket holds at least one
    /// path.
    #[must_use]
    pub fn buckets(&self) -> &[Vec<PathBuf>] {
        &self.buckets
    }

    /// The bucket containing `path`; the most recent one if the path was
    /// scanned several times.
    #[must_use]
    pub fn bucket_of(&self, path: &Path) -> Option<&[PathBuf]> {
        self.by_path
            .get(path)
            .map(|&idx| self.buckets[idx].as_slice())
    }
}

/// Inode folding for one scan.
pub(super) struct ScanSession<'a> {
    index: &'a mut HardlinkIndex,
    by_inode: HashMap<InodeKey, usize>,
}

impl ScanSession<'_> {
    /// Record `path` under its inode.
    ///
    /// Returns `true` when this session already saw the inode, i.e. the
    /// path is a hardlink of an earlier entry and must not be digested
    /// again.
    pub(super) fn record(&mut self, path: &Path, meta: &Metadata) -> bool {
        match InodeKey::from_metadata(meta) {
            Some(key) => {
                if let Some(&idx) = self.by_inode.get(&key) {
                    self.index.buckets[idx].push(path.to_path_buf());
                    self.index.by_path.insert(path.to_path_buf(), idx);
                    true
                } else {
                    let idx = self.push_bucket(path);
                    self.by_inode.insert(key, idx);
                    false
                }
            }
            None => {
                self.push_bucket(path);
                false
            }
        }
    }

    fn push_bucket(&mut self, path: &Path) -> usize {
        let idx = self.index.buckets.len();
        self.index.buckets.push(vec![path.to_path_buf()]);
        self.index.by_path.insert(path.to_path_buf(), idx);
        idx
    }
}

/// Filesystem identity of a file: (device, inode) on unix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InodeKey {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    _unsupported: (),
}

impl InodeKey {
    #[cfg(unix)]
    fn from_metadata(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_meta: &Metadata) -> Option<Self> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        File::create(&path).unwrap().write_all(b"content").unwrap();
        path
    }

    #[test]
    fn test_distinct_files_get_distinct_buckets() {
        let dir = TempDir::new().unwrap();
        let a = create_file(&dir, "a.txt");
        let b = create_file(&dir, "b.txt");

        let mut index = HardlinkIndex::new();
        let mut session = index.session();
        assert!(!session.record(&a, &std::fs::metadata(&a).unwrap()));
        assert!(!session.record(&b, &std::fs::metadata(&b).unwrap()));

        assert_eq!(index.buckets().len(), 2);
        assert_eq!(index.bucket_of(&a), Some(&[a.clone()][..]));
    }

    #[test]
    #[cfg(unix)]
    fn test_hardlinks_share_a_bucket() {
        let dir = TempDir::new().unwrap();
        let original = create_file(&dir, "original.txt");
        let link = dir.path().join("link.txt");
        std::fs::hard_link(&original, &link).unwrap();

        let mut index = HardlinkIndex::new();
        let mut session = index.session();
        assert!(!session.record(&original, &std::fs::metadata(&original).unwrap()));
        assert!(session.record(&link, &std::fs::metadata(&link).unwrap()));

        assert_eq!(index.buckets().len(), 1);
        let bucket = index.bucket_of(&link).unwrap();
        assert_eq!(bucket, &[original, link]);
    }

    #[test]
    #[cfg(unix)]
    fn test_folding_is_per_session() {
        let dir = TempDir::new().unwrap();
        let path = create_file(&dir, "a.txt");
        let meta = std::fs::metadata(&path).unwrap();

        let mut index = HardlinkIndex::new();
        assert!(!index.session().record(&path, &meta));
        // A fresh session does not remember the inode.
        assert!(!index.session().record(&path, &meta));
        assert_eq!(index.buckets().len(), 2);
    }

    #[test]
    fn test_bucket_of_unknown_path_is_none() {
        let index = HardlinkIndex::new();
        assert!(index.bucket_of(Path::new("/nope")).is_none());
    }
}
