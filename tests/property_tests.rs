//! Property-based tests for routing table minimisation.
//!
//! These tests verify behavioural invariants that must hold for all
//! inputs, using proptest to generate random tables over a small key
//! universe so that routing behaviour can be checked exhaustively.

use std::sync::atomic::AtomicBool;

use proptest::prelude::*;
use rtmin::{
    elide_default_routes, is_default_routable, KeyMask, MinimiseStatus, OrderedCovering,
    RouteGrouping, RoutingEntry, RoutingTable, TableMinimiser,
};

/// Keys live in a 6-bit universe so every key can be checked.
const UNIVERSE: u32 = 64;

/// Generate one entry with a small route alphabet, so that same-route
/// merges actually occur in random tables.
fn arb_entry() -> impl Strategy<Value = RoutingEntry> {
    (0..UNIVERSE, 0..UNIVERSE, 1u32..=4).prop_map(|(key, mask, route)| {
        // Key bits outside the mask are normalised away on construction.
        RoutingEntry::new(key, mask, route, 0)
    })
}

/// Generate a table sorted by ascending generality, the precondition of
/// the ordered covering pass.
fn arb_sorted_table(max_len: usize) -> impl Strategy<Value = RoutingTable> {
    proptest::collection::vec(arb_entry(), 1..=max_len).prop_map(|entries| {
        let mut table = RoutingTable::from_entries(entries);
        table.sort_by_generality();
        table
    })
}

/// Generate a table of pairwise-disjoint entries (distinct keys under a
/// full 6-bit mask), the precondition of the route grouping pass.
fn arb_disjoint_table(max_len: usize) -> impl Strategy<Value = RoutingTable> {
    proptest::collection::btree_map(0..UNIVERSE, 1u32..=4, 1..=max_len).prop_map(|keys| {
        let entries = keys
            .into_iter()
            .map(|(key, route)| RoutingEntry::new(key, UNIVERSE - 1, route, 0))
            .collect();
        RoutingTable::from_entries(entries)
    })
}

/// Generate an entry with single-link route and source words, so that a
/// useful fraction of entries is default-routable.
fn arb_link_entry() -> impl Strategy<Value = RoutingEntry> {
    (0..UNIVERSE, 0..UNIVERSE, 0u32..6, 0u32..6).prop_map(|(key, mask, out, src)| {
        RoutingEntry::new(key, mask, 1 << out, 1 << src)
    })
}

/// Every key the original table matched must take the same route in the
/// compressed table. Keys the original did not match carry no guarantee.
fn routes_preserved(before: &RoutingTable, after: &RoutingTable) -> Result<(), TestCaseError> {
    for key in 0..UNIVERSE {
        if let Some(entry) = before.first_match(key) {
            let hit = after.first_match(key);
            prop_assert!(hit.is_some(), "key {:#x} lost its match", key);
            prop_assert_eq!(
                hit.unwrap().route,
                entry.route,
                "key {:#x} changed route",
                key
            );
        }
    }
    Ok(())
}

/// Full 32-bit keymasks for the algebraic laws.
fn arb_keymask() -> impl Strategy<Value = KeyMask> {
    (any::<u32>(), any::<u32>()).prop_map(|(key, mask)| KeyMask::new(key, mask))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // =======================================================================
    // KEYMASK ALGEBRA
    // =======================================================================

    #[test]
    fn keymask_merge_is_commutative((a, b) in (arb_keymask(), arb_keymask())) {
        prop_assert_eq!(a.merge(b), b.merge(a));
    }

    #[test]
    fn keymask_merge_is_idempotent(a in arb_keymask()) {
        prop_assert_eq!(a.merge(a), a);
    }

    #[test]
    fn keymask_intersects_is_symmetric((a, b) in (arb_keymask(), arb_keymask())) {
        prop_assert_eq!(a.intersects(b), b.intersects(a));
    }

    #[test]
    fn keymask_merge_covers_both_inputs(
        (a, b, key) in (arb_keymask(), arb_keymask(), any::<u32>())
    ) {
        let merged = a.merge(b);
        if a.matches(key) || b.matches(key) {
            prop_assert!(merged.matches(key), "merge lost key {:#x}", key);
        }
    }

    // =======================================================================
    // BEHAVIOUR PRESERVATION: matched keys keep their routes
    // =======================================================================

    #[test]
    fn ordered_covering_preserves_matched_routes(table in arb_sorted_table(16)) {
        let stop = AtomicBool::new(false);
        let before = table.clone();
        let mut table = table;

        OrderedCovering::new().minimise(&mut table, 0, &stop)
            .expect("minimisation should succeed for valid input");

        routes_preserved(&before, &table)?;
    }

    #[test]
    fn route_grouping_preserves_matched_routes(table in arb_disjoint_table(16)) {
        let stop = AtomicBool::new(false);
        let before = table.clone();
        let mut table = table;

        RouteGrouping::new().minimise(&mut table, 0, &stop)?;

        routes_preserved(&before, &table)?;
    }

    #[test]
    fn route_grouping_never_reroutes_overlapping_tables(table in arb_sorted_table(16)) {
        // Outside its non-overlap precondition the pass must refuse to
        // reorder rather than change any first match.
        let stop = AtomicBool::new(false);
        let before = table.clone();
        let mut table = table;

        RouteGrouping::new().minimise(&mut table, 0, &stop)?;

        routes_preserved(&before, &table)?;
    }

    #[test]
    fn elision_preserves_or_defaults(
        entries in proptest::collection::vec(arb_link_entry(), 1..=16)
    ) {
        let before = RoutingTable::from_entries(entries);
        let mut table = before.clone();

        elide_default_routes(&mut table)?;

        for key in 0..UNIVERSE {
            if let Some(entry) = before.first_match(key) {
                match table.first_match(key) {
                    // The entry survived and is still the first match.
                    Some(hit) => prop_assert_eq!(hit.route, entry.route),
                    // Only a default-routable entry may be dropped, and
                    // then only when the key falls through to hardware
                    // default routing.
                    None => prop_assert!(is_default_routable(entry)),
                }
            }
        }
    }

    // =======================================================================
    // SIZE AND ORDER
    // =======================================================================

    #[test]
    fn minimisation_never_grows_the_table(table in arb_sorted_table(16)) {
        let stop = AtomicBool::new(false);
        let before = table.len();
        let mut table = table;

        OrderedCovering::new().minimise(&mut table, 0, &stop)?;

        prop_assert!(table.len() <= before);
    }

    #[test]
    fn result_stays_sorted_by_generality(table in arb_sorted_table(16)) {
        let stop = AtomicBool::new(false);
        let mut table = table;

        OrderedCovering::new().minimise(&mut table, 0, &stop)?;

        prop_assert!(table.is_sorted_by_generality());
    }

    #[test]
    fn full_minimisation_reaches_a_fixpoint(table in arb_sorted_table(12)) {
        let stop = AtomicBool::new(false);
        let mut table = table;

        // Target 0 runs until no profitable merge remains, so a second
        // pass must find nothing.
        OrderedCovering::new().minimise(&mut table, 0, &stop)?;
        let settled = table.clone();
        OrderedCovering::new().minimise(&mut table, 0, &stop)?;

        prop_assert_eq!(table, settled);
    }

    // =======================================================================
    // DETERMINISM
    // =======================================================================

    #[test]
    fn minimisation_is_deterministic(table in arb_sorted_table(16)) {
        let stop = AtomicBool::new(false);
        let mut first = table.clone();
        let mut second = table;

        OrderedCovering::new().minimise(&mut first, 0, &stop)?;
        OrderedCovering::new().minimise(&mut second, 0, &stop)?;

        prop_assert_eq!(first, second);
    }

    // =======================================================================
    // CANCELLATION
    // =======================================================================

    #[test]
    fn cancelled_run_leaves_consistent_table(table in arb_sorted_table(16)) {
        let stop = AtomicBool::new(true);
        let before = table.clone();
        let mut table = table;

        let status = OrderedCovering::new().minimise(&mut table, 0, &stop)?;

        prop_assert_eq!(status, MinimiseStatus::Cancelled);
        prop_assert!(table.len() <= before.len());
        // Never mid-merge: behaviour holds even when stopped early.
        routes_preserved(&before, &table)?;
    }

    // =======================================================================
    // EDGE CASES
    // =======================================================================

    #[test]
    fn single_entry_table_is_untouched(entry in arb_entry()) {
        let stop = AtomicBool::new(false);
        let mut table = RoutingTable::from_entries(vec![entry]);
        let before = table.clone();

        OrderedCovering::new().minimise(&mut table, 0, &stop)?;

        prop_assert_eq!(table, before);
    }
}

#[test]
fn empty_table_minimises_to_empty() {
    let stop = AtomicBool::new(false);
    let mut table = RoutingTable::new();
    let status = OrderedCovering::new()
        .minimise(&mut table, 0, &stop)
        .unwrap();
    assert_eq!(status, MinimiseStatus::Converged);
    assert!(table.is_empty());
}

// =======================================================================
// STRUCTURED TABLES (not proptest, but important)
// =======================================================================

#[test]
fn uniform_route_table_collapses_to_one_entry() {
    let stop = AtomicBool::new(false);
    let entries: Vec<RoutingEntry> = (0..UNIVERSE)
        .map(|key| RoutingEntry::new(key, UNIVERSE - 1, 0b1000, 0))
        .collect();
    let mut table = RoutingTable::from_entries(entries);

    OrderedCovering::new().minimise(&mut table, 0, &stop).unwrap();

    assert_eq!(table.len(), 1);
    for key in 0..UNIVERSE {
        assert_eq!(table.first_match(key).unwrap().route, 0b1000);
    }
}

#[test]
fn striped_routes_compress_to_one_entry_per_route() {
    // Route determined by the low two key bits: each route's sixteen
    // entries share those bits and differ only in wildcardable bits.
    let stop = AtomicBool::new(false);
    let entries: Vec<RoutingEntry> = (0..UNIVERSE)
        .map(|key| RoutingEntry::new(key, UNIVERSE - 1, 1 << (key & 0b11), 0))
        .collect();
    let before = RoutingTable::from_entries(entries);
    let mut table = before.clone();

    OrderedCovering::new().minimise(&mut table, 0, &stop).unwrap();

    assert_eq!(table.len(), 4, "one entry per route stripe");
    for key in 0..UNIVERSE {
        assert_eq!(
            table.first_match(key).unwrap().route,
            before.first_match(key).unwrap().route
        );
    }
}
