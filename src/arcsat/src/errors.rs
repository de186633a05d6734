//! Error types of the solver's public interface.
//!
//! Conflicts found during search are ordinary results, never errors. The
//! two recoverable error conditions are a constraint that is already
//! false when added (the caller must drop or reset the solver) and an
//! expired solve deadline (the caller may simply call again). Misuse of
//! the interface (zero literals, queries before a verdict) panics.

use thiserror::Error;

/// The constraint being added is empty or forces an immediate conflict
/// at the root level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("constraint is trivially unsatisfiable at the root level")]
pub struct ContradictionError;

/// The solve call gave up before reaching a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeoutError {
    #[error("timeout ({0} ms) exceeded")]
    WallClock(u64),
    #[error("timeout ({0} conflicts) exceeded")]
    Conflicts(u64),
    /// The decision heuristic ran out of candidates without refuting the
    /// formula, so the last root-level conflict proves nothing.
    #[error("cannot decide the satisfiability")]
    Undecided,
    /// `stop()` was called from another thread.
    #[error("search stopped on request")]
    Stopped,
}
