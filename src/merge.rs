//! A candidate merge: a group of same-route entries and the single entry
//! that would replace them.
//!
//! Built and mutated during the best-merge search, then either discarded
//! or committed by merge application. The keymask is folded incrementally
//! on `add`; `remove` must recompute everything from scratch because
//! keymask merging is lossy and cannot be inverted.

use crate::bitset::BitSet;
use crate::error::CompressionError;
use crate::keymask::KeyMask;
use crate::table::RoutingTable;

/// A candidate group of routing entries plus their replacement fields.
#[derive(Clone, Debug)]
pub struct Merge {
    members: BitSet,
    keymask: KeyMask,
    route: u32,
    source: u32,
}

impl Merge {
    /// Create an empty merge able to reference entries of a table with
    /// `n_entries` rows.
    pub fn new(n_entries: usize) -> Result<Merge, CompressionError> {
        Ok(Merge {
            members: BitSet::new(n_entries)?,
            keymask: KeyMask::MATCH_NOTHING,
            route: 0,
            source: 0,
        })
    }

    /// Empty the membership and reset the folded fields.
    pub fn clear(&mut self) {
        self.members.clear();
        self.keymask = KeyMask::MATCH_NOTHING;
        self.route = 0;
        self.source = 0;
    }

    /// Add table entry `index` to the merge.
    ///
    /// The first member copies its keymask verbatim; subsequent members
    /// are folded in with [`KeyMask::merge`]. Route and source are ORed.
    pub fn add(&mut self, table: &RoutingTable, index: usize) {
        if !self.members.add(index) {
            return;
        }
        let entry = table.entry(index);
        self.keymask = if self.keymask.is_match_nothing() {
            entry.keymask
        } else {
            self.keymask.merge(entry.keymask)
        };
        self.route |= entry.route;
        self.source |= entry.source;
    }

    /// Remove table entry `index`, recomputing the folded fields over the
    /// remaining members.
    pub fn remove(&mut self, table: &RoutingTable, index: usize) {
        if !self.members.remove(index) {
            return;
        }
        self.keymask = KeyMask::MATCH_NOTHING;
        self.route = 0;
        self.source = 0;
        for i in 0..table.len() {
            if !self.members.contains(i) {
                continue;
            }
            let entry = table.entry(i);
            self.keymask = if self.keymask.is_match_nothing() {
                entry.keymask
            } else {
                self.keymask.merge(entry.keymask)
            };
            self.route |= entry.route;
            self.source |= entry.source;
        }
    }

    /// Whether table entry `index` is a member.
    pub fn contains(&self, index: usize) -> bool {
        self.members.contains(index)
    }

    /// Number of member entries.
    pub fn len(&self) -> usize {
        self.members.count()
    }

    /// Whether the merge has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of table rows saved if this merge is committed.
    ///
    /// A merge with goodness <= 0 is worthless.
    pub fn goodness(&self) -> i32 {
        self.members.count() as i32 - 1
    }

    /// The keymask of the replacement entry.
    pub fn keymask(&self) -> KeyMask {
        self.keymask
    }

    /// The route of the replacement entry.
    pub fn route(&self) -> u32 {
        self.route
    }

    /// The collective source of the replacement entry.
    pub fn source(&self) -> u32 {
        self.source
    }

    /// Member table indices in ascending order.
    pub fn member_indices(&self, table: &RoutingTable) -> Vec<usize> {
        (0..table.len()).filter(|&i| self.members.contains(i)).collect()
    }
}
