//! Lazy hierarchical blocking engine.
//!
//! # Overview
//!
//! The engine partitions an arbitrary stream of objects into equivalence
//! blocks using an ordered chain of blocking functions (digests). Objects
//! that agree on every computed digest share a block; every block differs
//! from every other block in at least one key.
//!
//! The defining property is laziness: a digest is computed for an object
//! only when it is needed to distinguish that object from another one, and
//! never more than once per object. A lone object sits in a keyless block
//! until a second object with the same prefix forces the next digest.
//!
//! # Architecture
//!
//! - [`blocking`]: the [`Key`]/[`BlockingFn`]/[`BlockingFactory`] capability
//!   types
//! - [`block`]: terminal [`Block`] nodes
//! - [`keystore`]: the internal slot/dispatch-table tree
//!
//! # Example
//!
//! ```
//! use blockdupe::engine::{Engine, Key};
//!
//! // Partition pairs by first element, then by parity of the second.
//! let mut engine = Engine::with_functions(vec![
//!     Box::new(|o: &(u8, u8)| Key::from(u64::from(o.0))),
//!     Box::new(|o: &(u8, u8)| Key::from(u64::from(o.1 % 2))),
//! ]);
//!
//! for pair in [(b'a', 1), (b'b', 2), (b'a', 3)] {
//!     engine.add(pair).unwrap();
//! }
//!
//! // (a,1) and (a,3) share both keys and fused into one block.
//! let duplicates: Vec<_> = engine
//!     .blocks()
//!     .iter()
//!     .filter(|b| b.num_objects() > 1)
//!     .collect();
//! assert_eq!(duplicates.len(), 1);
//! ```

pub mod block;
pub mod blocking;
mod keystore;

pub use block::Block;
pub use blocking::{BlockingFactory, BlockingFn, BlockingItem, FnSpec, Key, NamedFn};

use keystore::{BlockId, KeyStore, Slot};

/// Errors surfaced by [`Engine::add`].
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// A blocking function failed while digesting an object. Nothing was
    /// committed for that object.
    #[error("blocking function '{digest}' failed: {source}")]
    Key {
        /// Id of the failing function.
        digest: &'static str,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// The hierarchical blocking engine.
///
/// Owns the partition tree and the append-only list of all blocks ever
/// created. External readers receive shared views; the tree is mutated
/// only through [`add`](Self::add) (and, within the crate, through the
/// hardlink path rewrite).
pub struct Engine<O> {
    fns: Vec<Box<dyn BlockingFn<O>>>,
    root: Slot,
    blocks: Vec<Block<O>>,
}

impl<O> Default for Engine<O> {
    fn default() -> Self {
        Self::with_functions(Vec::new())
    }
}

impl<O> Engine<O> {
    /// Build an engine from a blocking configuration, expanding factories
    /// in place in list order.
    #[must_use]
    pub fn new(config: Vec<BlockingItem<O>>) -> Self {
        let mut fns = Vec::new();
        for item in config {
            match item {
                BlockingItem::Function(f) => fns.push(f),
                BlockingItem::Factory(factory) => fns.extend(factory.all_functions()),
            }
        }
        Self::with_functions(fns)
    }

    /// Build an engine from an already-flat function chain.
    #[must_use]
    pub fn with_functions(fns: Vec<Box<dyn BlockingFn<O>>>) -> Self {
        Self {
            fns,
            root: Slot::Empty,
            blocks: Vec::new(),
        }
    }

    /// Ingest one object.
    ///
    /// Descends the tree level by level, computing the next digest only
    /// when the object reaches a dispatch table (or forces one into
    /// existence by colliding with a lone block). On digest failure the
    /// error propagates and nothing is committed for this object.
    pub fn add(&mut self, object: O) -> Result<(), EngineError> {
        let fns = &self.fns;
        let blocks = &mut self.blocks;
        let mut slot = &mut self.root;
        let mut level = 0usize;
        let mut prefix: Vec<Key> = Vec::new();

        loop {
            match slot {
                // Unclaimed prefix: the object rests here without computing
                // the next digest. This is what bounds digest work.
                Slot::Empty => {
                    let id = BlockId(blocks.len());
                    blocks.push(Block::new(prefix, object));
                    *slot = Slot::Leaf(id);
                    return Ok(());
                }
                // Chain exhausted: everything left here is equivalent.
                Slot::Leaf(id) if level == fns.len() => {
                    blocks[id.0].push_object(object);
                    return Ok(());
                }
                // A lone block claims this prefix: split. Both keys are
                // computed before anything mutates, so a digest failure
                // leaves the tree exactly as it was.
                Slot::Leaf(id) => {
                    let id = *id;
                    let new_key = compute(fns, level, &object)?;
                    let existing_key = compute(fns, level, blocks[id.0].object(0))?;

                    blocks[id.0].push_key(existing_key.clone());
                    let mut store = KeyStore::new();
                    store.set(existing_key, Slot::Leaf(id));
                    *slot = Slot::Node(store);

                    let Slot::Node(store) = slot else {
                        unreachable!()
                    };
                    prefix.push(new_key.clone());
                    slot = store.entry(new_key);
                    level += 1;
                }
                Slot::Node(store) => {
                    let key = compute(fns, level, &object)?;
                    prefix.push(key.clone());
                    slot = store.entry(key);
                    level += 1;
                }
            }
        }
    }

    /// Ingest several objects in order.
    pub fn extend(
        &mut self,
        objects: impl IntoIterator<Item = O>,
    ) -> Result<(), EngineError> {
        for object in objects {
            self.add(object)?;
        }
        Ok(())
    }

    /// All blocks in creation order.
    ///
    /// Blocks with one object are unique; blocks with two or more are
    /// duplicate sets.
    #[must_use]
    pub fn blocks(&self) -> &[Block<O>] {
        &self.blocks
    }

    /// Mutable access for the sanctioned post-ingestion path rewrite.
    pub(crate) fn blocks_mut(&mut self) -> &mut [Block<O>] {
        &mut self.blocks
    }

    /// Metadata of the resolved flat function chain, in order.
    #[must_use]
    pub fn blocking(&self) -> Vec<FnSpec> {
        self.fns.iter().map(|f| f.spec()).collect()
    }

    /// Number of configured blocking levels.
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.fns.len()
    }

    /// Per-level digest invocation counts, trailing zeros trimmed.
    ///
    /// An object's key at level L is computed exactly when its block sits
    /// deeper than L, so the counts fall out of the block list without any
    /// bookkeeping during ingestion.
    #[must_use]
    pub fn count_keys_computed(&self) -> Vec<u64> {
        let mut counts = vec![0u64; self.fns.len()];
        for block in &self.blocks {
            for count in counts.iter_mut().take(block.num_keys()) {
                *count += block.num_objects() as u64;
            }
        }
        while counts.last() == Some(&0) {
            counts.pop();
        }
        counts
    }

    /// Per-level collision counts.
    ///
    /// A collision at level L is a distinct terminal block reachable
    /// through a level-L key beyond that key's first, i.e. each dispatch
    /// table contributes its reachable terminals minus its occupied keys.
    /// Levels below the deepest table are omitted; the deepest reported
    /// level of a fully-digested tree is always zero.
    #[must_use]
    pub fn count_collisions(&self) -> Vec<u64> {
        let mut collisions = Vec::new();
        tally_collisions(&self.root, 0, &mut collisions);
        collisions
    }
}

fn compute<O>(
    fns: &[Box<dyn BlockingFn<O>>],
    level: usize,
    object: &O,
) -> Result<Key, EngineError> {
    fns[level].key(object).map_err(|source| EngineError::Key {
        digest: fns[level].spec().id,
        source,
    })
}

/// Post-order walk; returns the number of terminal blocks in the subtree.
fn tally_collisions(slot: &Slot, depth: usize, collisions: &mut Vec<u64>) -> u64 {
    match slot {
        Slot::Empty => 0,
        Slot::Leaf(_) => 1,
        Slot::Node(store) => {
            let mut terminals = 0u64;
            let mut occupied = 0u64;
            for child in store.slots() {
                let reachable = tally_collisions(child, depth + 1, collisions);
                if reachable > 0 {
                    occupied += 1;
                }
                terminals += reachable;
            }
            if collisions.len() <= depth {
                collisions.resize(depth + 1, 0);
            }
            collisions[depth] += terminals.saturating_sub(occupied);
            terminals
        }
    }
}
