//! Ordered covering: the core table minimisation algorithm.
//!
//! The table is kept sorted by ascending generality so that specific
//! entries shadow the general ones. Each step searches for the best
//! *merge*, a group of same-route entries replaceable by a single wider
//! entry, and validates it with two independent checks before applying:
//!
//! - the **up-check** rejects members that would be shadowed by a more
//!   specific entry sitting between the member's current position and the
//!   merged entry's insertion point;
//! - the **down-check** rejects (or repairs) merges whose widened keymask
//!   would incorrectly cover a more general entry after the insertion
//!   point, using the alias table to test against the original
//!   fine-grained keymasks rather than already-widened rows.
//!
//! The outer loop applies best merges until the table fits the target
//! length or no merge saves at least one row. The result is locally
//! minimal, not globally minimal; that is intended behaviour.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::alias::{AliasEntry, AliasTable};
use crate::bitset::BitSet;
use crate::error::CompressionError;
use crate::keymask::KeyMask;
use crate::merge::Merge;
use crate::table::{RoutingEntry, RoutingTable};
use crate::traits::{MinimiseStatus, TableMinimiser};

/// The ordered covering minimisation strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderedCovering;

impl OrderedCovering {
    /// Create the strategy.
    pub fn new() -> OrderedCovering {
        OrderedCovering
    }

    /// Minimise `table` towards `target_length`, recording merge
    /// provenance in `aliases`.
    ///
    /// The table must already be sorted by ascending generality. The
    /// cancellation flag is polled once per applied merge; on
    /// cancellation the table is left in the last fully-consistent state.
    pub fn minimise_with_aliases(
        &self,
        table: &mut RoutingTable,
        target_length: usize,
        aliases: &mut AliasTable,
        stop: &AtomicBool,
    ) -> Result<MinimiseStatus, CompressionError> {
        let mut applied = 0u32;

        while table.len() > target_length {
            if stop.load(Ordering::Relaxed) {
                info!(
                    entries = table.len(),
                    merges = applied,
                    "ordered covering cancelled"
                );
                return Ok(MinimiseStatus::Cancelled);
            }

            let mut merge = best_merge(table, aliases)?;
            if merge.goodness() < 1 {
                // Local fixpoint: no remaining merge saves a row.
                break;
            }
            apply_merge(table, &mut merge, aliases)?;
            applied += 1;
            debug!(entries = table.len(), "applied merge");
        }

        info!(
            entries = table.len(),
            target_length,
            merges = applied,
            "ordered covering finished"
        );
        Ok(MinimiseStatus::Converged)
    }
}

impl TableMinimiser for OrderedCovering {
    fn minimise(
        &self,
        table: &mut RoutingTable,
        target_length: usize,
        stop: &AtomicBool,
    ) -> Result<MinimiseStatus, CompressionError> {
        let mut aliases = AliasTable::new();
        self.minimise_with_aliases(table, target_length, &mut aliases, stop)
    }
}

/// The index at which an entry of the given generality must be inserted
/// to preserve the ascending-generality order: after every entry of
/// strictly lower generality.
fn insertion_point(table: &RoutingTable, generality: u32) -> usize {
    table
        .entries()
        .partition_point(|entry| entry.keymask.generality() < generality)
}

/// Remove from the merge any member that, left at its current position,
/// would be shadowed by a more specific entry lying between it and the
/// merged entry's insertion point.
///
/// Returns whether the merge was changed. Walks members from the
/// high-index end and stops refining once goodness can no longer beat
/// `min_goodness`; a merge that drops to the minimum is emptied entirely.
fn up_check(table: &RoutingTable, merge: &mut Merge, min_goodness: i32) -> bool {
    let min_goodness = min_goodness.max(0);
    let mut changed = false;
    let mut insertion = insertion_point(table, merge.keymask().generality());

    for i in (0..table.len()).rev() {
        if merge.goodness() <= min_goodness {
            break;
        }
        if !merge.contains(i) {
            continue;
        }
        let keymask = table.entry(i).keymask;
        let between = (i + 1)..insertion.max(i + 1);
        let shadowed = table.entries()[between]
            .iter()
            .any(|other| keymask.intersects(other.keymask));
        if shadowed {
            changed = true;
            merge.remove(table, i);
            insertion = insertion_point(table, merge.keymask().generality());
        }
    }

    if merge.goodness() <= min_goodness {
        changed = true;
        merge.clear();
    }
    changed
}

/// Fold one coverage conflict into the settable-bit analysis.
///
/// A bit is settable when the merge has a wildcard there but the covered
/// keymask does not; forcing it to the value the covered entry rejects
/// avoids the conflict. The stringency is the number of such bits (lower
/// is cheaper) and only the bits of the lowest stringency seen so far
/// are retained.
fn fold_settable(
    merge_km: KeyMask,
    covered_km: KeyMask,
    stringency: &mut u32,
    set_to_zero: &mut u32,
    set_to_one: &mut u32,
) {
    let settable = !covered_km.xs() & merge_km.xs();
    let new_stringency = settable.count_ones();
    let this_set_to_zero = settable & covered_km.key;
    let this_set_to_one = settable & !covered_km.key;

    if new_stringency < *stringency {
        *stringency = new_stringency;
        *set_to_zero = this_set_to_zero;
        *set_to_one = this_set_to_one;
    } else if new_stringency == *stringency {
        *set_to_zero |= this_set_to_zero;
        *set_to_one |= this_set_to_one;
    }
}

/// For each candidate settable bit, collect the members that would have
/// to be excluded for the bit to be safely fixed (to one when `to_one`,
/// otherwise to zero), keeping the globally smallest exclusion set in
/// `best`. Sets are indexed by position within the member list.
fn fold_removables(
    table: &RoutingTable,
    members: &[usize],
    settable: u32,
    to_one: bool,
    best: &mut BitSet,
    working: &mut BitSet,
) {
    for bit_position in (0..32).rev() {
        if best.count() == 1 {
            break;
        }
        let bit = 1u32 << bit_position;
        if settable & bit == 0 {
            continue;
        }

        // A member blocks the bit if it has a wildcard there, or a fixed
        // value disagreeing with the one we want to force.
        for (position, &index) in members.iter().enumerate() {
            let keymask = table.entry(index).keymask;
            let wildcard = bit & !keymask.mask != 0;
            let disagrees = if to_one {
                bit & !keymask.key != 0
            } else {
                bit & keymask.key != 0
            };
            if wildcard || disagrees {
                working.add(position);
            }
        }

        if best.is_empty() || working.count() < best.count() {
            std::mem::swap(best, working);
        }
        working.clear();
    }
}

/// Remove members from the merge until its keymask, inserted at its
/// insertion point, no longer covers any entry positioned after that
/// point which it was never meant to match.
///
/// Conflicts are tested against the alias table's original keymasks where
/// one exists. If no bit can avoid some conflict (stringency 0) the merge
/// is cleared entirely; otherwise the smallest exclusion subset is
/// removed and the whole check repeats until no conflict remains or
/// goodness drops to `min_goodness`.
fn down_check(
    table: &RoutingTable,
    merge: &mut Merge,
    min_goodness: i32,
    aliases: &AliasTable,
) -> Result<(), CompressionError> {
    let min_goodness = min_goodness.max(0);

    while merge.goodness() > min_goodness {
        let mut covered_entries = false;
        let mut stringency = 33u32;
        let mut set_to_zero = 0u32;
        let mut set_to_one = 0u32;

        let insertion = insertion_point(table, merge.keymask().generality());
        for i in insertion..table.len() {
            if stringency == 0 {
                break;
            }
            let keymask = table.entry(i).keymask;
            if !keymask.intersects(merge.keymask()) {
                continue;
            }
            if let Some(originals) = aliases.find(keymask) {
                // Test against the real fine-grained entries this row
                // stands in for; the widened row over-claims key-space.
                for original in originals {
                    if original.keymask.intersects(merge.keymask()) {
                        covered_entries = true;
                        fold_settable(
                            merge.keymask(),
                            original.keymask,
                            &mut stringency,
                            &mut set_to_zero,
                            &mut set_to_one,
                        );
                    }
                }
            } else {
                covered_entries = true;
                fold_settable(
                    merge.keymask(),
                    keymask,
                    &mut stringency,
                    &mut set_to_zero,
                    &mut set_to_one,
                );
            }
        }

        if !covered_entries {
            return Ok(());
        }
        if stringency == 0 {
            // No bit can avoid every conflict; the merge cannot be saved.
            merge.clear();
            return Ok(());
        }

        // Pick the cheapest repair: the smallest set of members whose
        // exclusion lets one candidate bit be fixed.
        let members = merge.member_indices(table);
        let mut best = BitSet::new(members.len())?;
        let mut working = BitSet::new(members.len())?;
        fold_removables(table, &members, set_to_zero, false, &mut best, &mut working);
        fold_removables(table, &members, set_to_one, true, &mut best, &mut working);

        for (position, &index) in members.iter().enumerate() {
            if best.contains(position) {
                merge.remove(table, index);
            }
        }

        if merge.len() == 1 {
            merge.clear();
        }
    }
    Ok(())
}

/// Scan the table once for the merge with the highest goodness.
///
/// Every entry seeds at most one working merge together with all later
/// entries sharing its route; each candidate is validated with the
/// down-check, then the up-check, re-running the down-check whenever the
/// up-check changed the merge. Returns a merge of goodness 0 when no
/// useful merge exists.
fn best_merge(
    table: &RoutingTable,
    aliases: &AliasTable,
) -> Result<Merge, CompressionError> {
    let mut considered = BitSet::new(table.len())?;
    let mut best = Merge::new(table.len())?;
    let mut working = Merge::new(table.len())?;

    for i in 0..table.len() {
        if considered.contains(i) {
            continue;
        }

        working.clear();
        working.add(table, i);
        considered.add(i);

        let route = table.entry(i).route;
        for j in (i + 1)..table.len() {
            if table.entry(j).route == route {
                working.add(table, j);
                considered.add(j);
            }
        }

        if working.goodness() <= best.goodness() {
            continue;
        }

        down_check(table, &mut working, best.goodness(), aliases)?;
        if working.goodness() <= best.goodness() {
            continue;
        }

        // A down-check change needs no further up-check, but an up-check
        // change can reintroduce downward conflicts.
        let changed = up_check(table, &mut working, best.goodness());
        if changed {
            if working.goodness() <= best.goodness() {
                continue;
            }
            down_check(table, &mut working, best.goodness(), aliases)?;
        }

        if best.goodness() < working.goodness() {
            std::mem::swap(&mut best, &mut working);
        }
    }

    Ok(best)
}

/// Commit a validated merge: rebuild the table as a fresh vector with the
/// members removed and the replacement entry at its insertion point, and
/// update the alias table so the new row records every original entry it
/// stands in for.
fn apply_merge(
    table: &mut RoutingTable,
    merge: &mut Merge,
    aliases: &mut AliasTable,
) -> Result<(), CompressionError> {
    let insertion = insertion_point(table, merge.keymask().generality());
    let replacement = RoutingEntry {
        keymask: merge.keymask(),
        route: merge.route(),
        source: merge.source(),
    };

    let mut new_aliases: Vec<AliasEntry> = Vec::new();
    new_aliases
        .try_reserve(merge.len())
        .map_err(|_| CompressionError::AllocationFailure)?;
    let mut successor =
        RoutingTable::try_successor_buffer(table.len() - merge.len() + 1)?;

    for (i, entry) in table.entries().iter().enumerate() {
        if i == insertion {
            successor.push(replacement);
        }
        if merge.contains(i) {
            if let Some(mut joined) = aliases.remove(entry.keymask) {
                // The member was itself a merged row: move its originals
                // into the new list.
                new_aliases.append(&mut joined);
            } else {
                new_aliases.push(AliasEntry {
                    keymask: entry.keymask,
                    source: entry.source,
                });
            }
        } else {
            successor.push(*entry);
        }
    }
    if insertion == table.len() {
        successor.push(replacement);
    }

    aliases.insert(replacement.keymask, new_aliases);
    table.replace(successor);
    Ok(())
}
