#![warn(missing_docs)]
//! microbench Core - Runner Runtime
//!
//! This crate provides the engine behind microbench:
//! - `BenchRunner` for registering, executing and reading benchmarks
//! - `Registry`, a name-based resolver built from typed closures
//! - `ArgValue`/`FromArg` for argument lists fixed at registration time
//! - Wall-clock timing with per-benchmark failure isolation

mod error;
mod measure;
mod resolver;
mod runner;
mod value;

pub use error::{BenchError, InvocationError, ResolutionError, RunError};
pub use measure::{Timer, average_millis, whole_millis};
pub use resolver::{
    Bound, Invocable, LocationBuilder, LocationDef, Member, Outcome, Registry, Resolver,
};
pub use runner::{
    BenchOutcome, BenchRunner, DEFAULT_REPEAT_COUNT, Measurement, RepeatCount, SEPARATOR,
    split_identifier,
};
pub use value::{ArgKind, ArgValue, FromArg, format_shape, shape_of};

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<LocationDef> {}
};
