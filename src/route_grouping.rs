//! Route grouping: the simpler minimisation strategy for tables whose
//! entries of distinct routes do not overlap.
//!
//! Entries are bucketed by route and merged pairwise within each bucket;
//! a pair may be merged only when the widened keymask intersects no entry
//! outside the bucket. The output is emitted bucket by bucket, which
//! reorders the table, so the pass requires that no two entries with
//! different routes intersect: on such tables no reordering can change a
//! first match. Tables violating the precondition are detected up front
//! and left unchanged. Buckets are processed in ascending frequency
//! order, so the big buckets (the ones with the most merging opportunity)
//! see the fewest remaining outside entries.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::error::CompressionError;
use crate::table::{RoutingEntry, RoutingTable};
use crate::traits::{MinimiseStatus, TableMinimiser};

/// The route grouping minimisation strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct RouteGrouping;

impl RouteGrouping {
    /// Create the strategy.
    pub fn new() -> RouteGrouping {
        RouteGrouping
    }
}

impl TableMinimiser for RouteGrouping {
    fn minimise(
        &self,
        table: &mut RoutingTable,
        target_length: usize,
        stop: &AtomicBool,
    ) -> Result<MinimiseStatus, CompressionError> {
        if table.len() <= target_length {
            return Ok(MinimiseStatus::Converged);
        }

        // Bucket-ordered emission reorders the table; that only preserves
        // first-match behaviour when entries of distinct routes never
        // overlap. Same-route overlap is harmless, the route is equal
        // either way.
        let entries = table.entries();
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                if entries[i].route != entries[j].route
                    && entries[i].keymask.intersects(entries[j].keymask)
                {
                    info!(
                        entries = table.len(),
                        "overlapping entries with distinct routes; table left unchanged"
                    );
                    return Ok(MinimiseStatus::Converged);
                }
            }
        }

        // Route frequency index, built up front; every entry's route must
        // be found here again below.
        let mut frequency: BTreeMap<u32, usize> = BTreeMap::new();
        for entry in table.entries() {
            *frequency.entry(entry.route).or_insert(0) += 1;
        }

        let mut buckets: BTreeMap<u32, Vec<RoutingEntry>> = BTreeMap::new();
        for entry in table.entries() {
            buckets.entry(entry.route).or_default().push(*entry);
        }

        let mut order = Vec::new();
        for &route in buckets.keys() {
            let count = *frequency.get(&route).ok_or_else(|| {
                CompressionError::InternalInconsistency(format!(
                    "route {route:#x} missing from frequency index"
                ))
            })?;
            order.push((count, route));
        }
        order.sort_unstable();

        let mut output = RoutingTable::try_successor_buffer(table.len())?;
        for (_, route) in order {
            if stop.load(Ordering::Relaxed) {
                info!(entries = table.len(), "route grouping cancelled");
                return Ok(MinimiseStatus::Cancelled);
            }

            let mut bucket = buckets.remove(&route).ok_or_else(|| {
                CompressionError::InternalInconsistency(format!(
                    "route {route:#x} missing from bucket index"
                ))
            })?;
            let before = bucket.len();

            compress_bucket(&mut bucket, |candidate| {
                output
                    .iter()
                    .chain(buckets.values().flatten())
                    .all(|other| !candidate.intersects(other.keymask))
            });

            debug!(route, before, after = bucket.len(), "compressed bucket");
            output.append(&mut bucket);
        }

        info!(
            entries_before = table.len(),
            entries_after = output.len(),
            "route grouping finished"
        );
        table.replace(output);
        Ok(MinimiseStatus::Converged)
    }
}

/// Greedily merge pairs within one same-route bucket.
///
/// `is_safe` judges whether a widened keymask collides with anything
/// outside the bucket. Merged sources are kept only when both members
/// agree; otherwise the merged entry is no longer attributable to a
/// single input and can never be default-routed.
fn compress_bucket<F>(bucket: &mut Vec<RoutingEntry>, is_safe: F)
where
    F: Fn(crate::keymask::KeyMask) -> bool,
{
    let mut left = 0;
    while left < bucket.len() {
        let mut merged_one = false;
        for i in (left + 1)..bucket.len() {
            let candidate = bucket[left].keymask.merge(bucket[i].keymask);
            if is_safe(candidate) {
                bucket[left] = RoutingEntry {
                    keymask: candidate,
                    route: bucket[left].route,
                    source: if bucket[left].source == bucket[i].source {
                        bucket[left].source
                    } else {
                        0
                    },
                };
                bucket.swap_remove(i);
                merged_one = true;
                break;
            }
        }
        if !merged_one {
            left += 1;
        }
    }
}
