//! Fixed-capacity bit vector with a running member count.
//!
//! Used to mark which table entries belong to a candidate merge and which
//! entries have already been considered by the search. All operations are
//! O(1) except construction.

use crate::error::CompressionError;

const BITS_PER_WORD: usize = 32;

/// A set over `0..capacity` backed by packed words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<u32>,
    capacity: usize,
    count: usize,
}

impl BitSet {
    /// Create an empty set able to hold elements `0..capacity`.
    ///
    /// Fails with [`CompressionError::AllocationFailure`] if backing
    /// storage cannot be obtained.
    pub fn new(capacity: usize) -> Result<BitSet, CompressionError> {
        let n_words = capacity.div_ceil(BITS_PER_WORD);
        let mut words = Vec::new();
        words
            .try_reserve_exact(n_words)
            .map_err(|_| CompressionError::AllocationFailure)?;
        words.resize(n_words, 0);
        Ok(BitSet {
            words,
            capacity,
            count: 0,
        })
    }

    /// Remove every member.
    pub fn clear(&mut self) {
        self.words.fill(0);
        self.count = 0;
    }

    /// Number of members currently in the set.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Maximum element count this set was sized for.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add `i` to the set.
    ///
    /// Returns false if `i` is out of range or already a member; members
    /// are counted once.
    pub fn add(&mut self, i: usize) -> bool {
        if i >= self.capacity || self.contains(i) {
            return false;
        }
        self.words[i / BITS_PER_WORD] |= 1 << (i % BITS_PER_WORD);
        self.count += 1;
        true
    }

    /// Remove `i` from the set; returns false if it was not a member.
    pub fn remove(&mut self, i: usize) -> bool {
        if !self.contains(i) {
            return false;
        }
        self.words[i / BITS_PER_WORD] &= !(1 << (i % BITS_PER_WORD));
        self.count -= 1;
        true
    }

    /// Whether `i` is a member.
    pub fn contains(&self, i: usize) -> bool {
        if i >= self.capacity {
            return false;
        }
        self.words[i / BITS_PER_WORD] & (1 << (i % BITS_PER_WORD)) != 0
    }
}
