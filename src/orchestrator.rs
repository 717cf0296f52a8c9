//! End-to-end compression flow and outcome classification.
//!
//! The orchestrator decides whether default-route elision alone lets the
//! table fit, and otherwise re-obtains the original table, sorts it by
//! ascending generality and runs the configured minimisation strategy to
//! the target length. Whether a table "fits" is always answered by the
//! router collaborator, never guessed here, and partial state is never
//! committed: the final install is skipped outright when the compressed
//! table still exceeds the router's capacity.

use std::sync::atomic::AtomicBool;

use tracing::{info, warn};

use crate::default_routes::elide_default_routes;
use crate::error::CompressionError;
use crate::table::RoutingTable;
use crate::traits::MinimiseStatus;
use crate::MinimisationMethod;

/// Access to the router hardware holding the installed table.
///
/// A thin seam over the real device: the engine only ever asks how many
/// entries fit and whether a concrete table could be committed.
pub trait RouterAccess {
    /// Number of table entries the router can hold.
    fn max_capacity(&self) -> u32;

    /// Attempt to commit a table to the router; returns whether it fit.
    fn try_install(&mut self, table: &RoutingTable) -> bool;
}

/// Flags steering the orchestration flow.
#[derive(Clone, Copy, Debug)]
pub struct CompressorConfig {
    /// Skip compression when the table already fits: try installing the
    /// raw table (and then the elided table) before minimising.
    pub compress_only_when_needed: bool,
    /// Minimise to a local fixpoint instead of stopping at the router's
    /// capacity.
    pub compress_as_much_as_possible: bool,
    /// Which minimisation strategy to run.
    pub method: MinimisationMethod,
}

impl Default for CompressorConfig {
    fn default() -> CompressorConfig {
        CompressorConfig {
            compress_only_when_needed: false,
            compress_as_much_as_possible: false,
            method: MinimisationMethod::OrderedCovering,
        }
    }
}

/// How a compression run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The final table was committed to the router.
    Success(RoutingTable),
    /// The strategy converged to a local fixpoint still larger than the
    /// router can hold. Carries the full size history; nothing was
    /// installed. Not retried automatically: the caller decides whether
    /// to fall back to a larger capacity or accept the uncompressed
    /// table.
    TargetUnreachable {
        /// Entries in the input table.
        original: usize,
        /// Entries after default-route elision.
        after_elision: usize,
        /// Entries after the minimisation strategy ran.
        after_compression: usize,
        /// The target length that was attempted.
        target: usize,
    },
    /// The cancellation signal was observed mid-run; carries the last
    /// fully-consistent table, which was not installed.
    Cancelled(RoutingTable),
}

/// The compression orchestrator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Orchestrator {
    config: CompressorConfig,
}

impl Orchestrator {
    /// Create an orchestrator with the given configuration.
    pub fn new(config: CompressorConfig) -> Orchestrator {
        Orchestrator { config }
    }

    /// Run the full flow over an owned copy of the input table.
    ///
    /// `Err` is reserved for fatal conditions (allocation failure,
    /// internal inconsistency); failing to fit is an [`Outcome`].
    pub fn run(
        &self,
        original: RoutingTable,
        router: &mut dyn RouterAccess,
        stop: &AtomicBool,
    ) -> Result<Outcome, CompressionError> {
        let original_size = original.len();

        if self.config.compress_only_when_needed && router.try_install(&original) {
            info!(entries = original_size, "table fits uncompressed");
            return Ok(Outcome::Success(original));
        }

        // Cheap pre-pass: elision may make compression unnecessary.
        let mut elided = original.clone();
        elide_default_routes(&mut elided)?;
        let after_elision = elided.len();

        if self.config.compress_only_when_needed && router.try_install(&elided) {
            info!(entries = after_elision, "table fits after elision");
            return Ok(Outcome::Success(elided));
        }

        // Full compression starts over from the original table; the
        // strategies need every entry present, defaultable ones included.
        let mut table = original;
        table.sort_by_generality();

        let capacity = router.max_capacity() as usize;
        let target = if self.config.compress_as_much_as_possible {
            0
        } else {
            capacity
        };

        let status = self
            .config
            .method
            .minimiser()
            .minimise(&mut table, target, stop)?;
        let after_compression = table.len();

        if status == MinimiseStatus::Cancelled {
            return Ok(Outcome::Cancelled(table));
        }

        if after_compression > capacity {
            // Converged above capacity: never offer the oversized table
            // to the router.
            warn!(
                original = original_size,
                after_elision,
                after_compression,
                capacity,
                "failed to minimise routing table to fit"
            );
            return Ok(Outcome::TargetUnreachable {
                original: original_size,
                after_elision,
                after_compression,
                target,
            });
        }

        if router.try_install(&table) {
            info!(entries = after_compression, "compressed table installed");
            Ok(Outcome::Success(table))
        } else {
            warn!(
                original = original_size,
                after_elision,
                after_compression,
                "router rejected table within nominal capacity"
            );
            Ok(Outcome::TargetUnreachable {
                original: original_size,
                after_elision,
                after_compression,
                target,
            })
        }
    }
}
