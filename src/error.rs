//! Error taxonomy for the compression engine.

/// Fatal errors raised during a compression run.
///
/// Nothing here is recovered and continued: every variant stops the run.
/// Failing to reach the target length is not an error; it is reported as
/// [`crate::Outcome::TargetUnreachable`] with the full size history so the
/// caller can decide what to do.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CompressionError {
    /// Backing storage for an auxiliary structure could not be obtained.
    ///
    /// The target environment has no memory reclamation path, so this is
    /// terminal: no partial cleanup-and-retry is attempted.
    #[error("allocation failure: out of memory for auxiliary structures")]
    AllocationFailure,

    /// An internal invariant was violated. Always a programming error.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}
