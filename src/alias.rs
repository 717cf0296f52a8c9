//! Alias bookkeeping: which original entries a merged row stands in for.
//!
//! Merging keymasks is lossy: the merged keymask matches keys that none
//! of its members matched. Later merges must check coverage conflicts
//! against the *original* fine-grained keymasks, not against an already
//! widened row that over-claims key-space. The alias table preserves that
//! information: one list of original (keymask, source) pairs per merged
//! row, joined by concatenation when a merge subsumes an already-aliased
//! row, so a lookup always yields the complete flattened set.

use std::collections::BTreeMap;

use crate::keymask::KeyMask;

/// One original entry recorded under a merged keymask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AliasEntry {
    /// The original entry's keymask.
    pub keymask: KeyMask,
    /// The original entry's input-direction bitmask.
    pub source: u32,
}

/// Map from a post-merge keymask to the original entries it represents.
///
/// Owned by a single compression run; created empty and grown by one
/// mapping per applied merge.
#[derive(Clone, Debug, Default)]
pub struct AliasTable {
    map: BTreeMap<KeyMask, Vec<AliasEntry>>,
}

impl AliasTable {
    /// Create an empty alias table.
    pub fn new() -> AliasTable {
        AliasTable::default()
    }

    /// Record that `keymask` stands in for `originals`.
    ///
    /// An existing mapping for the same keymask is replaced.
    pub fn insert(&mut self, keymask: KeyMask, originals: Vec<AliasEntry>) {
        self.map.insert(keymask, originals);
    }

    /// Whether the table has a mapping for `keymask`.
    pub fn contains(&self, keymask: KeyMask) -> bool {
        self.map.contains_key(&keymask)
    }

    /// The original entries recorded under `keymask`, if any.
    ///
    /// Joins performed by earlier merges are already flattened, so the
    /// returned slice is the complete set of fine-grained originals.
    pub fn find(&self, keymask: KeyMask) -> Option<&[AliasEntry]> {
        self.map.get(&keymask).map(Vec::as_slice)
    }

    /// Remove and return the mapping for `keymask`.
    pub fn remove(&mut self, keymask: KeyMask) -> Option<Vec<AliasEntry>> {
        self.map.remove(&keymask)
    }

    /// Number of merged keymasks currently tracked.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no merges have been recorded.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
