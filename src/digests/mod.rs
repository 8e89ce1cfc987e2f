//! Blocking functions for files.
//!
//! # Overview
//!
//! The digests here form a ladder from free to expensive: a stat call,
//! 128-byte samples, xxHash over single clusters, SHA-1 over single
//! clusters, SHA-1 over the whole file. The deduplicator's default chain
//! climbs that ladder (`filesize` → `initial_xxhash` → `final_xxhash` →
//! `sha`); users can assemble any subset in any order by id.
//!
//! Every digest opens, reads, and closes its file within a single call;
//! no descriptor outlives a key computation. Zero-length files map to the
//! canonical empty key for every segment-based digest, so empty files
//! always agree without touching the filesystem beyond stat.

pub mod segment;

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use xxhash_rust::xxh64::xxh64;

use crate::engine::{BlockingFactory, BlockingFn, FnSpec, Key};
use segment::{
    centered_sample, cluster_size, first_cluster, last_cluster, middle_cluster, read_span, Span,
    EDGE_LEN, SAMPLE_LEN,
};

/// Errors in the blocking configuration, detected before ingestion.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A digest id passed to `--alg` (or [`DigestCatalog::select`]) does
    /// not name any known blocking function.
    #[error("unknown digest '{id}' (see --help for the available ids)")]
    UnknownDigest {
        /// The unrecognized id.
        id: String,
    },
}

/// File length plus effective cluster size, from one stat call.
fn stat_file(path: &Path) -> io::Result<(u64, u64)> {
    let meta = std::fs::metadata(path)?;
    let len = meta.len();
    Ok((len, cluster_size(len, platform_blksize(&meta))))
}

#[cfg(unix)]
fn platform_blksize(meta: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    meta.blksize()
}

#[cfg(not(unix))]
fn platform_blksize(_meta: &Metadata) -> u64 {
    0
}

/// Key = file size in bytes.
struct FileSize;

impl BlockingFn<PathBuf> for FileSize {
    fn key(&self, path: &PathBuf) -> io::Result<Key> {
        Ok(Key::from(std::fs::metadata(path)?.len()))
    }

    fn spec(&self) -> FnSpec {
        FnSpec {
            id: "filesize",
            name: "file size",
            class: "stat",
        }
    }
}

#[derive(Clone, Copy)]
enum ClusterPos {
    First,
    Middle,
    Last,
}

/// Key = 128 raw bytes centred in the first, middle, or last cluster.
struct ClusterSample {
    pos: ClusterPos,
}

impl BlockingFn<PathBuf> for ClusterSample {
    fn key(&self, path: &PathBuf) -> io::Result<Key> {
        let (len, cluster) = stat_file(path)?;
        if len == 0 {
            return Ok(Key::empty());
        }
        let window = match self.pos {
            ClusterPos::First => first_cluster(len, cluster),
            ClusterPos::Middle => middle_cluster(len, cluster),
            ClusterPos::Last => last_cluster(len, cluster, SAMPLE_LEN),
        };
        let bytes = read_span(path, centered_sample(window, SAMPLE_LEN))?;
        Ok(Key::from(bytes))
    }

    fn spec(&self) -> FnSpec {
        match self.pos {
            ClusterPos::First => FnSpec {
                id: "sample",
                name: "initial cluster sample",
                class: "sample",
            },
            ClusterPos::Middle => FnSpec {
                id: "mid_sample",
                name: "middle cluster sample",
                class: "sample",
            },
            ClusterPos::Last => FnSpec {
                id: "end_sample",
                name: "final cluster sample",
                class: "sample",
            },
        }
    }
}

/// Key = up to 1024 raw bytes from the start or end of the file.
struct EdgeBytes {
    tail: bool,
}

impl BlockingFn<PathBuf> for EdgeBytes {
    fn key(&self, path: &PathBuf) -> io::Result<Key> {
        let (len, _) = stat_file(path)?;
        if len == 0 {
            return Ok(Key::empty());
        }
        let take = EDGE_LEN.min(len);
        let span = if self.tail {
            Span {
                offset: len - take,
                len: take,
            }
        } else {
            Span {
                offset: 0,
                len: take,
            }
        };
        Ok(Key::from(read_span(path, span)?))
    }

    fn spec(&self) -> FnSpec {
        if self.tail {
            FnSpec {
                id: "file_tail",
                name: "trailing bytes",
                class: "sample",
            }
        } else {
            FnSpec {
                id: "file_head",
                name: "leading bytes",
                class: "sample",
            }
        }
    }
}

#[derive(Clone, Copy)]
enum HashWindow {
    /// First half cluster: the cheapest hash that still reads data.
    FastInitial,
    /// First full cluster.
    Initial,
    /// Last cluster, backed up when the tail is under half a cluster.
    Final,
}

impl HashWindow {
    fn span(self, len: u64, cluster: u64) -> Span {
        match self {
            HashWindow::FastInitial => Span {
                offset: 0,
                len: (cluster / 2).min(len),
            },
            HashWindow::Initial => first_cluster(len, cluster),
            HashWindow::Final => last_cluster(len, cluster, cluster / 2),
        }
    }
}

/// Key = xxHash64 (seed 0) of one cluster-sized window.
struct XxhSegment {
    window: HashWindow,
}

impl BlockingFn<PathBuf> for XxhSegment {
    fn key(&self, path: &PathBuf) -> io::Result<Key> {
        let (len, cluster) = stat_file(path)?;
        if len == 0 {
            return Ok(Key::empty());
        }
        let bytes = read_span(path, self.window.span(len, cluster))?;
        Ok(Key::from(xxh64(&bytes, 0)))
    }

    fn spec(&self) -> FnSpec {
        match self.window {
            HashWindow::FastInitial => FnSpec {
                id: "fast_initial_xxhash",
                name: "xxhash of leading half cluster",
                class: "xxhash",
            },
            HashWindow::Initial => FnSpec {
                id: "initial_xxhash",
                name: "xxhash of initial cluster",
                class: "xxhash",
            },
            HashWindow::Final => FnSpec {
                id: "final_xxhash",
                name: "xxhash of final cluster",
                class: "xxhash",
            },
        }
    }
}

/// Key = SHA-1 of one cluster-sized window.
struct ShaSegment {
    window: HashWindow,
}

impl BlockingFn<PathBuf> for ShaSegment {
    fn key(&self, path: &PathBuf) -> io::Result<Key> {
        let (len, cluster) = stat_file(path)?;
        if len == 0 {
            return Ok(Key::empty());
        }
        let bytes = read_span(path, self.window.span(len, cluster))?;
        let digest: [u8; 20] = Sha1::digest(&bytes).into();
        Ok(Key::from(digest))
    }

    fn spec(&self) -> FnSpec {
        match self.window {
            HashWindow::FastInitial => FnSpec {
                id: "fast_initial_sha",
                name: "SHA-1 of leading half cluster",
                class: "sha",
            },
            HashWindow::Initial => FnSpec {
                id: "initial_sha",
                name: "SHA-1 of initial cluster",
                class: "sha",
            },
            HashWindow::Final => FnSpec {
                id: "final_sha",
                name: "SHA-1 of final cluster",
                class: "sha",
            },
        }
    }
}

/// Key = streaming SHA-1 of the entire file.
struct ShaWhole;

impl BlockingFn<PathBuf> for ShaWhole {
    fn key(&self, path: &PathBuf) -> io::Result<Key> {
        use std::io::Read;

        let mut file = std::fs::File::open(path)?;
        let mut hasher = Sha1::new();
        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        let digest: [u8; 20] = hasher.finalize().into();
        Ok(Key::from(digest))
    }

    fn spec(&self) -> FnSpec {
        FnSpec {
            id: "sha",
            name: "SHA-1 of entire file",
            class: "sha",
        }
    }
}

/// The canonical catalog of file digests.
///
/// # Example
///
/// ```no_run
/// use blockdupe::digests::DigestCatalog;
/// use blockdupe::engine::Engine;
///
/// let engine = Engine::with_functions(DigestCatalog::default_chain());
/// assert_eq!(engine.num_levels(), 4);
/// ```
pub struct DigestCatalog;

impl DigestCatalog {
    /// Every known digest, in preference order: cheap metadata first,
    /// whole-file SHA-1 last.
    #[must_use]
    pub fn all() -> Vec<Box<dyn BlockingFn<PathBuf>>> {
        vec![
            Box::new(FileSize),
            Box::new(ClusterSample {
                pos: ClusterPos::First,
            }),
            Box::new(ClusterSample {
                pos: ClusterPos::Middle,
            }),
            Box::new(ClusterSample {
                pos: ClusterPos::Last,
            }),
            Box::new(EdgeBytes { tail: false }),
            Box::new(EdgeBytes { tail: true }),
            Box::new(XxhSegment {
                window: HashWindow::FastInitial,
            }),
            Box::new(XxhSegment {
                window: HashWindow::Initial,
            }),
            Box::new(XxhSegment {
                window: HashWindow::Final,
            }),
            Box::new(ShaSegment {
                window: HashWindow::FastInitial,
            }),
            Box::new(ShaSegment {
                window: HashWindow::Initial,
            }),
            Box::new(ShaSegment {
                window: HashWindow::Final,
            }),
            Box::new(ShaWhole),
        ]
    }

    /// The default deduplication chain: `filesize` → `initial_xxhash` →
    /// `final_xxhash` → `sha`.
    #[must_use]
    pub fn default_chain() -> Vec<Box<dyn BlockingFn<PathBuf>>> {
        vec![
            Box::new(FileSize),
            Box::new(XxhSegment {
                window: HashWindow::Initial,
            }),
            Box::new(XxhSegment {
                window: HashWindow::Final,
            }),
            Box::new(ShaWhole),
        ]
    }

    /// The ids of every digest in the catalog, in preference order.
    #[must_use]
    pub fn ids() -> Vec<&'static str> {
        Self::all().iter().map(|f| f.spec().id).collect()
    }

    /// Look a digest up by its stable id.
    pub fn by_id(id: &str) -> Result<Box<dyn BlockingFn<PathBuf>>, ConfigError> {
        Self::all()
            .into_iter()
            .find(|f| f.spec().id == id)
            .ok_or_else(|| ConfigError::UnknownDigest { id: id.to_string() })
    }

    /// Assemble a chain from ids, preserving the given order.
    pub fn select<I, S>(ids: I) -> Result<Vec<Box<dyn BlockingFn<PathBuf>>>, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ids.into_iter().map(|id| Self::by_id(id.as_ref())).collect()
    }
}

impl BlockingFactory<PathBuf> for DigestCatalog {
    fn all_functions(&self) -> Vec<Box<dyn BlockingFn<PathBuf>>> {
        Self::all()
    }
}
