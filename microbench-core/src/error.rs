//! Error types
//!
//! Usage errors ([`BenchError`]) are returned synchronously to the caller.
//! Runtime errors ([`RunError`]) are contained per benchmark and only show up
//! in a [`BenchOutcome`](crate::BenchOutcome) and in the log.

use thiserror::Error;

/// Errors raised directly by [`BenchRunner`](crate::BenchRunner) operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BenchError {
    /// Zero repeat count or malformed identifier
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Identifier is not currently registered
    #[error("Benchmark not registered: {0}")]
    NotFound(String),
}

/// Failure to map an identifier onto an invocable target
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ResolutionError {
    /// Identifier has no `location.member` split
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// No type registered under the location
    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    /// Location exists but has no member with this name
    #[error("Unknown member `{member}` in {location}")]
    UnknownMember {
        /// Location that was searched
        location: String,
        /// Member that was requested
        member: String,
    },

    /// Member exists but no overload accepts the argument kinds
    #[error("No overload of {location}.{member} accepts {given} (accepted: {accepted})")]
    ShapeMismatch {
        /// Location of the member
        location: String,
        /// Member name
        member: String,
        /// Shape of the registered arguments
        given: String,
        /// Shapes the member accepts, comma separated
        accepted: String,
    },

    /// Resolver panicked, for example in the host's `Default`
    #[error("Resolution panicked: {0}")]
    Panicked(String),
}

/// Failure raised by the benchmarked callable itself
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    /// Callable returned an error
    #[error("{0}")]
    Failed(String),

    /// Callable panicked
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Per-benchmark failure, contained by the runner
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    /// Target could not be resolved
    #[error("Resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    /// Target failed during one of its repeats
    #[error("Invocation {iteration} failed: {source}")]
    Invocation {
        /// Zero-based repeat index that failed
        iteration: u32,
        /// Underlying failure
        source: InvocationError,
    },
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
