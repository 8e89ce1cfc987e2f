//! Directory walker yielding regular files in deterministic order.
//!
//! Uses [`jwalk`] for traversal with children sorted by name, so repeated
//! scans of an unchanged tree feed the engine in the same order. Symbolic
//! links are never followed and never yielded; directories and other
//! non-regular entries are filtered out here so the deduplicator only
//! ever sees plain files. The working directory is never changed.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use super::ScanError;

/// A regular file discovered during traversal, with its (symlink-free)
/// metadata.
pub(super) struct FileRecord {
    pub path: PathBuf,
    pub meta: Metadata,
}

/// Walk `root` depth-first, yielding every regular file beneath it.
///
/// Traversal errors surface as [`ScanError::Io`] items; the caller
/// decides whether to stop.
pub(super) fn walk(root: &Path) -> impl Iterator<Item = Result<FileRecord, ScanError>> {
    let root = root.to_path_buf();

    let walk_dir = WalkDir::new(&root)
        .follow_links(false)
        .skip_hidden(false)
        .process_read_dir(|_depth, _path, _read_dir_state, children| {
            // Sort children for deterministic ingestion order.
            children.sort_by(|a, b| match (a, b) {
                (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                (Err(_), Err(_)) => std::cmp::Ordering::Equal,
            });
        });

    walk_dir.into_iter().filter_map(move |entry_result| {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map_or_else(|| root.clone(), std::borrow::ToOwned::to_owned);
                return Some(Err(ScanError::Io {
                    path,
                    source: std::io::Error::other(e.to_string()),
                }));
            }
        };

        let path = entry.path();
        if path == root {
            return None;
        }

        let file_type = entry.file_type();
        if file_type.is_dir() {
            return None;
        }
        if file_type.is_symlink() {
            log::trace!("skipping symlink: {}", path.display());
            return None;
        }

        let meta = match std::fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(source) => return Some(Err(ScanError::Io { path, source })),
        };
        if !meta.is_file() {
            log::trace!("skipping non-regular file: {}", path.display());
            return None;
        }

        Some(Ok(FileRecord { path, meta }))
    })
}
