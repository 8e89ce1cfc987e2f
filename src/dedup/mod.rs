//! File deduplication on top of the blocking engine.
//!
//! # Overview
//!
//! [`FileDeduplicator`] scans directory trees, filters the entries down
//! to readable regular files, folds hardlinks into inode buckets, and
//! feeds each distinct inode's first path into an [`Engine`] configured
//! with a digest chain. Afterwards the engine's blocks are the duplicate
//! report: one group per block, optionally with hardlink buckets
//! collapsed to a canonical path.
//!
//! # Example
//!
//! ```no_run
//! use blockdupe::dedup::FileDeduplicator;
//!
//! let mut dedup = FileDeduplicator::new();
//! dedup.scan("/home/user/photos").unwrap();
//!
//! for group in dedup.duplicates() {
//!     if group.len() > 1 {
//!         println!("{} copies: {:?}", group.len(), group);
//!     }
//! }
//! ```

pub mod hardlink;
mod walker;

pub use hardlink::HardlinkIndex;

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::digests::DigestCatalog;
use crate::engine::{BlockingFn, Engine, EngineError, FnSpec};

/// Errors that can occur during a scan.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The scan root is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// An I/O error occurred while traversing or statting.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A digest failed while the engine was placing a file.
    #[error("digest '{digest}' failed for {path}: {source}")]
    Digest {
        /// The file being digested.
        path: PathBuf,
        /// Id of the failing digest.
        digest: &'static str,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    fn from_engine(path: PathBuf, err: EngineError) -> Self {
        match err {
            EngineError::Key { digest, source } => Self::Digest {
                path,
                digest,
                source,
            },
        }
    }
}

/// Live feedback during a scan.
///
/// The console renderer implements this; anything else (tests, a GUI)
/// can too. Callbacks run on the scanning thread.
pub trait ScanProgress {
    /// A readable regular file was fed to the engine.
    fn on_file_scanned(&mut self, bytes: u64);

    /// A regular file could not be opened for reading and was skipped.
    fn on_unreadable(&mut self, path: &Path) {
        let _ = path;
    }
}

/// Counters accumulated across all scans of a deduplicator.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ScanSummary {
    /// Files fed to the engine.
    pub files_scanned: u64,
    /// Bytes of those files.
    pub bytes_scanned: u64,
    /// Regular files skipped because they could not be opened.
    pub files_unreadable: u64,
    /// Bytes of the unreadable files.
    pub bytes_unreadable: u64,
    /// Zero-length files dropped by `ignore_empty`.
    pub empty_skipped: u64,
    /// Paths folded into an existing inode bucket.
    pub hardlinks_skipped: u64,
}

/// Per-call overrides for [`FileDeduplicator::scan_with`].
#[derive(Default)]
pub struct ScanOptions<'a> {
    /// Override the configured empty-file handling for this call only.
    pub ignore_empty: Option<bool>,
    /// Progress sink for this call.
    pub progress: Option<&'a mut (dyn ScanProgress + 'static)>,
}

/// Scans directories and reports duplicate files.
pub struct FileDeduplicator {
    engine: Engine<PathBuf>,
    index: HardlinkIndex,
    summary: ScanSummary,
    ignore_empty: bool,
    progress: Option<Box<dyn ScanProgress>>,
}

impl Default for FileDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl FileDeduplicator {
    /// A deduplicator with the default digest chain
    /// (`filesize` → `initial_xxhash` → `final_xxhash` → `sha`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_blocking(DigestCatalog::default_chain())
    }

    /// A deduplicator with a custom digest chain.
    #[must_use]
    pub fn with_blocking(fns: Vec<Box<dyn BlockingFn<PathBuf>>>) -> Self {
        Self {
            engine: Engine::with_functions(fns),
            index: HardlinkIndex::new(),
            summary: ScanSummary::default(),
            ignore_empty: false,
            progress: None,
        }
    }

    /// Drop zero-length files during scans.
    #[must_use]
    pub fn with_ignore_empty(mut self, ignore: bool) -> Self {
        self.ignore_empty = ignore;
        self
    }

    /// Default progress sink for every scan; a per-call sink in
    /// [`ScanOptions`] overrides it for that call.
    #[must_use]
    pub fn with_progress(mut self, progress: Box<dyn ScanProgress>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Scan a directory tree with the configured defaults.
    ///
    /// May be called repeatedly to ingest several roots into the same
    /// engine. Hardlink folding is scoped to each call: rescanning a
    /// tree feeds its files again, and same-content files across scans
    /// count as duplicates.
    pub fn scan(&mut self, dir: impl AsRef<Path>) -> Result<(), ScanError> {
        self.scan_with(dir, ScanOptions::default())
    }

    /// Scan a directory tree, overriding defaults for this call only.
    pub fn scan_with<'a>(
        &'a mut self,
        dir: impl AsRef<Path>,
        options: ScanOptions<'a>,
    ) -> Result<(), ScanError> {
        let dir = dir.as_ref();
        let meta = std::fs::metadata(dir).map_err(|source| ScanError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let ignore_empty = options.ignore_empty.unwrap_or(self.ignore_empty);

        let Self {
            engine,
            index,
            summary,
            progress: default_progress,
            ..
        } = self;
        let mut progress: Option<&'a mut (dyn ScanProgress + 'static)> = match options.progress {
            Some(p) => Some(p),
            None => default_progress.as_mut().map(|p| &mut **p),
        };
        // Hardlink folding is scoped to this call; the buckets themselves
        // accumulate on the index.
        let mut session = index.session();

        for record in walker::walk(dir) {
            let record = record?;
            let size = record.meta.len();

            if size == 0 && ignore_empty {
                log::debug!("skipping empty file: {}", record.path.display());
                summary.empty_skipped += 1;
                continue;
            }

            if session.record(&record.path, &record.meta) {
                log::debug!("hardlink, already seen: {}", record.path.display());
                summary.hardlinks_skipped += 1;
                continue;
            }

            // Readability gate: a file we cannot open now would fail in
            // every later digest, so warn once and move on.
            if let Err(e) = std::fs::File::open(&record.path) {
                log::warn!("cannot read {}: {}", record.path.display(), e);
                summary.files_unreadable += 1;
                summary.bytes_unreadable += size;
                if let Some(p) = progress.as_deref_mut() {
                    p.on_unreadable(&record.path);
                }
                continue;
            }

            engine
                .add(record.path.clone())
                .map_err(|e| ScanError::from_engine(record.path, e))?;
            summary.files_scanned += 1;
            summary.bytes_scanned += size;
            if let Some(p) = progress.as_deref_mut() {
                p.on_file_scanned(size);
            }
        }

        Ok(())
    }

    /// One path group per engine block, in block creation order.
    ///
    /// Groups of one are unique files; larger groups are duplicates.
    #[must_use]
    pub fn duplicates(&self) -> Vec<Vec<PathBuf>> {
        self.engine
            .blocks()
            .iter()
            .map(|b| b.objects().to_vec())
            .collect()
    }

    /// Like [`duplicates`](Self::duplicates), but paths belonging to a
    /// hardlink bucket of two or more are replaced by
    /// `resolve(bucket)`.
    ///
    /// The replacement is persisted: later calls (resolved or not)
    /// observe the canonical path until another resolver overrides it.
    pub fn duplicates_with<F>(&mut self, resolve: F) -> Vec<Vec<PathBuf>>
    where
        F: Fn(&[PathBuf]) -> PathBuf,
    {
        let index = &self.index;
        for block in self.engine.blocks_mut() {
            for i in 0..block.num_objects() {
                let Some(bucket) = index.bucket_of(block.object(i)) else {
                    continue;
                };
                if bucket.len() < 2 {
                    continue;
                }
                let canonical = resolve(bucket);
                if &canonical != block.object(i) {
                    block.set_object(i, canonical);
                }
            }
        }
        self.duplicates()
    }

    /// All inode buckets discovered so far, in first-seen order.
    #[must_use]
    pub fn hardlinks(&self) -> &[Vec<PathBuf>] {
        self.index.buckets()
    }

    /// Metadata of the digest chain, in order.
    #[must_use]
    pub fn blocking(&self) -> Vec<FnSpec> {
        self.engine.blocking()
    }

    /// Per-level digest invocation counts.
    #[must_use]
    pub fn count_digests(&self) -> Vec<u64> {
        self.engine.count_keys_computed()
    }

    /// Per-level collision counts.
    #[must_use]
    pub fn count_collisions(&self) -> Vec<u64> {
        self.engine.count_collisions()
    }

    /// Counters accumulated across all scans.
    #[must_use]
    pub fn summary(&self) -> &ScanSummary {
        &self.summary
    }
}
