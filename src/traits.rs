//! The shared contract implemented by every minimisation strategy.

use std::sync::atomic::AtomicBool;

use crate::error::CompressionError;
use crate::table::RoutingTable;

/// How a minimisation pass ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MinimiseStatus {
    /// The pass ran to its natural end: either the target length was
    /// reached or no further safe merge exists (a local fixpoint).
    Converged,
    /// The cancellation signal was observed; the table is in the last
    /// fully-consistent state, never mid-merge.
    Cancelled,
}

/// A routing-table minimisation strategy.
///
/// Implementations rewrite the table in place into a smaller,
/// behaviourally equivalent table. None of them guarantees a globally
/// minimal result; they stop at `target_length` or at a local fixpoint,
/// whichever comes first.
pub trait TableMinimiser {
    /// Minimise `table` towards `target_length` entries.
    ///
    /// `stop` is polled at safe points (once per applied merge); when it
    /// becomes true the pass returns [`MinimiseStatus::Cancelled`] with
    /// the table in a consistent state.
    fn minimise(
        &self,
        table: &mut RoutingTable,
        target_length: usize,
        stop: &AtomicBool,
    ) -> Result<MinimiseStatus, CompressionError>;
}
