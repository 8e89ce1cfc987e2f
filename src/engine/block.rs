//! Terminal nodes of the partition tree.

use super::blocking::Key;

/// A set of objects indistinguishable under a computed key prefix.
///
/// A block holds the ordered keys computed for it so far (one per blocking
/// level it has descended through) and the objects that share that prefix.
/// Blocks only ever grow: keys are appended when the block is pushed one
/// level deeper, objects are appended when a new arrival matches the full
/// chain. Nothing is removed or reordered.
///
/// While a block still has fewer keys than the engine has blocking
/// functions it contains exactly one object; later digests simply have not
/// been needed yet.
#[derive(Debug)]
pub struct Block<O> {
    keys: Vec<Key>,
    objects: Vec<O>,
}

impl<O> Block<O> {
    /// Create a block from the key prefix accumulated during descent and
    /// its first object.
    pub(super) fn new(keys: Vec<Key>, object: O) -> Self {
        Self {
            keys,
            objects: vec![object],
        }
    }

    /// Append the key that pushes this block one level deeper.
    ///
    /// Callers must only invoke this while splitting the block's slot; the
    /// key count always equals the block's depth in the tree.
    pub(super) fn push_key(&mut self, key: Key) {
        self.keys.push(key);
    }

    /// Append another object indistinguishable from the existing ones.
    pub(super) fn push_object(&mut self, object: O) {
        self.objects.push(object);
    }

    /// Replace the object at `index`.
    ///
    /// This is the one sanctioned mutation after ingestion: hardlink
    /// resolution rewrites a bucket member to its canonical path.
    pub(crate) fn set_object(&mut self, index: usize, object: O) {
        self.objects[index] = object;
    }

    /// The computed key prefix, outermost level first.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// The key at blocking level `index`.
    #[must_use]
    pub fn key(&self, index: usize) -> &Key {
        &self.keys[index]
    }

    #[must_use]
    pub fn num_keys(&self) -> usize {
        self.keys.len()
    }

    /// The objects in this block, in insertion order.
    #[must_use]
    pub fn objects(&self) -> &[O] {
        &self.objects
    }

    /// The object at `index`, in insertion order.
    #[must_use]
    pub fn object(&self, index: usize) -> &O {
        &self.objects[index]
    }

    #[must_use]
    pub fn num_objects(&self) -> usize {
        self.objects.len()
    }
}
