//! Routing table storage: an ordered sequence of entries.
//!
//! A packet with key `k` is routed by the *first* entry whose keymask
//! matches `k`; entry order is therefore load-bearing. The ordered
//! covering compressor requires the table to be sorted by ascending
//! generality so that specific entries shadow the general entries that
//! would otherwise swallow their traffic.
//!
//! The table is a plain owned vector. Mutation during compression always
//! builds a fresh vector and swaps it in, rather than shifting entries
//! in place.

use crate::error::CompressionError;
use crate::keymask::KeyMask;

/// One row of a multicast routing table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoutingEntry {
    /// Which packet keys this entry matches.
    pub keymask: KeyMask,
    /// Output-direction bitmask taken by matching packets.
    pub route: u32,
    /// Input-direction bitmask of links that can legitimately produce
    /// packets matching this entry. Used only to test default-routability.
    pub source: u32,
}

impl RoutingEntry {
    /// Build an entry from raw key/mask/route/source words.
    pub fn new(key: u32, mask: u32, route: u32, source: u32) -> RoutingEntry {
        RoutingEntry {
            keymask: KeyMask::new(key, mask),
            route,
            source,
        }
    }
}

/// An ordered multicast routing table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoutingTable {
    entries: Vec<RoutingEntry>,
}

impl RoutingTable {
    /// Create an empty table.
    pub fn new() -> RoutingTable {
        RoutingTable::default()
    }

    /// Take ownership of a sequence of entries.
    pub fn from_entries(entries: Vec<RoutingEntry>) -> RoutingTable {
        RoutingTable { entries }
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in table order.
    pub fn entries(&self) -> &[RoutingEntry] {
        &self.entries
    }

    /// The entry at `index`.
    pub fn entry(&self, index: usize) -> &RoutingEntry {
        &self.entries[index]
    }

    /// Sort entries by ascending generality.
    ///
    /// Stable, so entries of equal generality keep their relative order.
    /// This is the precondition of the ordered covering compressor.
    pub fn sort_by_generality(&mut self) {
        self.entries
            .sort_by_key(|entry| entry.keymask.generality());
    }

    /// Whether the ascending-generality invariant currently holds.
    pub fn is_sorted_by_generality(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[0].keymask.generality() <= pair[1].keymask.generality())
    }

    /// Route a key: the first entry whose keymask matches it.
    ///
    /// Returns `None` when no entry matches and the packet would fall
    /// through to hardware default routing.
    pub fn first_match(&self, key: u32) -> Option<&RoutingEntry> {
        self.entries.iter().find(|entry| entry.keymask.matches(key))
    }

    /// Keep only the entries whose index satisfies the predicate,
    /// preserving order.
    pub fn retain_indices<F>(&mut self, mut keep: F)
    where
        F: FnMut(usize) -> bool,
    {
        let mut index = 0;
        self.entries.retain(|_| {
            let keep_this = keep(index);
            index += 1;
            keep_this
        });
    }

    /// Replace the entire contents of the table.
    ///
    /// Used by merge application, which computes the successor table as a
    /// fresh vector.
    pub fn replace(&mut self, entries: Vec<RoutingEntry>) {
        self.entries = entries;
    }

    /// Allocate a vector able to hold a successor table of `capacity`
    /// entries, failing cleanly if memory is exhausted.
    pub fn try_successor_buffer(
        capacity: usize,
    ) -> Result<Vec<RoutingEntry>, CompressionError> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(capacity)
            .map_err(|_| CompressionError::AllocationFailure)?;
        Ok(buffer)
    }
}
