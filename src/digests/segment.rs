//! Cluster and segment arithmetic for sampled file digests.
//!
//! Sampled digests read a small window of a file instead of the whole
//! thing. Windows are aligned to "clusters": the filesystem block size
//! reported by stat, capped at the file length, defaulting to 4096 when
//! the platform reports nothing useful. The arithmetic here picks the
//! byte range; the digests decide what to do with the bytes.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Fallback cluster size when stat reports no block size.
pub const DEFAULT_CLUSTER: u64 = 4096;

/// Length of the centred cluster samples.
pub const SAMPLE_LEN: u64 = 128;

/// Length of the head/tail edge reads.
pub const EDGE_LEN: u64 = 1024;

/// A byte range within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: u64,
    pub len: u64,
}

impl Span {
    pub const EMPTY: Span = Span { offset: 0, len: 0 };
}

/// Effective cluster size for a file: `min(file_len, blksize)`, with
/// `blksize` falling back to [`DEFAULT_CLUSTER`] when zero.
#[must_use]
pub fn cluster_size(file_len: u64, blksize: u64) -> u64 {
    let blk = if blksize == 0 { DEFAULT_CLUSTER } else { blksize };
    file_len.min(blk)
}

/// The first cluster of the file.
#[must_use]
pub fn first_cluster(file_len: u64, cluster: u64) -> Span {
    if file_len == 0 || cluster == 0 {
        return Span::EMPTY;
    }
    Span {
        offset: 0,
        len: cluster.min(file_len),
    }
}

/// The cluster containing the midpoint of the file.
#[must_use]
pub fn middle_cluster(file_len: u64, cluster: u64) -> Span {
    if file_len == 0 || cluster == 0 {
        return Span::EMPTY;
    }
    let offset = file_len / 2 / cluster * cluster;
    Span {
        offset,
        len: cluster.min(file_len - offset),
    }
}

/// The last cluster of the file.
///
/// The natural last cluster starts at `floor((len-1)/cluster) * cluster`.
/// When that leaves fewer than `threshold` bytes, the window backs up one
/// cluster and covers that full cluster instead, so a file whose tail is
/// a sliver still yields a meaningful segment.
#[must_use]
pub fn last_cluster(file_len: u64, cluster: u64, threshold: u64) -> Span {
    if file_len == 0 || cluster == 0 {
        return Span::EMPTY;
    }
    let mut offset = (file_len - 1) / cluster * cluster;
    let mut len = file_len - offset;
    if len < threshold && offset >= cluster {
        offset -= cluster;
        len = cluster;
    }
    Span { offset, len }
}

/// A window of up to `sample_len` bytes centred within `span`.
#[must_use]
pub fn centered_sample(span: Span, sample_len: u64) -> Span {
    Span {
        offset: span.offset + span.len.saturating_sub(sample_len) / 2,
        len: sample_len.min(span.len),
    }
}

/// Read the bytes of `span` from the file at `path`.
///
/// The file is opened, read, and closed within this call; a span that
/// extends past the end of a file that shrank mid-scan yields the bytes
/// that remain.
pub fn read_span(path: &Path, span: Span) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    if span.offset > 0 {
        file.seek(SeekFrom::Start(span.offset))?;
    }
    let mut bytes = Vec::with_capacity(span.len as usize);
    file.take(span.len).read_to_end(&mut bytes)?;
    Ok(bytes)
}
