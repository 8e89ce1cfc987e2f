//! blockdupe - Duplicate File Finder
//!
//! Finds duplicate files by feeding paths through a lazy hierarchical
//! blocking engine: each file is partitioned by a chain of increasingly
//! expensive digests (size, sampled hashes, full SHA-1), and a digest is
//! only ever computed when it is needed to tell two files apart.

pub mod cli;
pub mod dedup;
pub mod digests;
pub mod engine;
pub mod logging;
pub mod output;
pub mod progress;
