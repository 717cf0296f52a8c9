//! Key/mask pairs: the match predicate of a routing table entry.
//!
//! A `KeyMask` describes the set of 32-bit packet keys matched by one
//! routing entry. A bit position is either *fixed* (mask bit set, key bit
//! gives the required value) or a *wildcard* (mask bit clear). The number
//! of wildcard positions is the keymask's *generality*: the more Xs, the
//! more keys it matches.
//!
//! All operations here are pure and total; the algebraic laws
//! (`merge` commutative and idempotent, `intersects` symmetric) are what
//! the rest of the compressor leans on.

/// A (key, mask) pair describing a set of 32-bit values.
///
/// Invariant: `key & !mask == 0`, i.e. key bits outside the mask are zero.
/// The one deliberate exception is [`KeyMask::MATCH_NOTHING`], the sentinel
/// used to mark an empty merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyMask {
    /// Required values at the fixed bit positions.
    pub key: u32,
    /// Which bit positions are fixed; zero bits are wildcards.
    pub mask: u32,
}

impl KeyMask {
    /// Sentinel keymask that matches no key at all.
    ///
    /// Every real key fails the comparison at some bit because the key is
    /// all-ones while the mask is empty.
    pub const MATCH_NOTHING: KeyMask = KeyMask {
        key: 0xffff_ffff,
        mask: 0x0000_0000,
    };

    /// Build a keymask, normalising the key to the invariant.
    pub fn new(key: u32, mask: u32) -> KeyMask {
        KeyMask {
            key: key & mask,
            mask,
        }
    }

    /// Bit positions which are wildcards ("Xs").
    #[inline]
    pub fn xs(self) -> u32 {
        !self.key & !self.mask
    }

    /// Number of wildcard positions.
    ///
    /// A generality of 0 is maximally specific; 32 matches every key.
    #[inline]
    pub fn generality(self) -> u32 {
        self.xs().count_ones()
    }

    /// Whether a concrete key is matched by this keymask.
    #[inline]
    pub fn matches(self, key: u32) -> bool {
        key & self.mask == self.key
    }

    /// Whether some 32-bit value is matched by both keymasks.
    #[inline]
    pub fn intersects(self, other: KeyMask) -> bool {
        self.key & other.mask == other.key & self.mask
    }

    /// The smallest keymask matching a superset of both inputs' keys.
    ///
    /// Any bit where the two disagree, or where either is already a
    /// wildcard, becomes a wildcard. Lossy: the result generally matches
    /// keys that neither input matched, which is why [`crate::AliasTable`]
    /// exists.
    #[inline]
    pub fn merge(self, other: KeyMask) -> KeyMask {
        let agreed = !(self.key ^ other.key);
        let mask = self.mask & other.mask & agreed;
        KeyMask {
            key: (self.key | other.key) & mask,
            mask,
        }
    }

    /// Whether this is the [`KeyMask::MATCH_NOTHING`] sentinel.
    #[inline]
    pub fn is_match_nothing(self) -> bool {
        self == KeyMask::MATCH_NOTHING
    }
}
