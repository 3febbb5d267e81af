#![warn(missing_docs)]
//! # microbench
//!
//! Micro-benchmarking harness: register callables by name with fixed
//! arguments, invoke each a configurable number of times, and read back the
//! average wall-clock time per invocation in milliseconds.
//!
//! - **Name-based registration**: benchmarks are `location.member` strings,
//!   resolved at execution time through a [`Registry`] of typed closures
//! - **Failure isolation**: a benchmark that cannot be resolved, returns an
//!   error or panics is logged and skipped; the rest of the batch still runs
//! - **Stable results**: averages persist across executions until overwritten
//!
//! ## Quick Start
//!
//! ```ignore
//! use microbench::prelude::*;
//!
//! #[derive(Default)]
//! struct Sleeper;
//!
//! let mut registry = Registry::new();
//! registry
//!     .location::<Sleeper>("demo.Sleeper")
//!     .member("nap", |_: &mut Sleeper, ms: u64| std::thread::sleep(Duration::from_millis(ms)));
//!
//! let mut runner = BenchRunner::with_repeat_count(registry, 4)?;
//! runner.register("demo.Sleeper.nap", args![50])?;
//! runner.execute();
//! assert!(runner.result("demo.Sleeper.nap").is_some());
//! ```
//!
//! ## Link-Time Registration
//!
//! ```ignore
//! fn install(registry: &mut Registry) {
//!     registry.location::<Sleeper>("demo.Sleeper").member("nap", |_: &mut Sleeper| ());
//! }
//!
//! microbench::submit! { LocationDef::new("demo.Sleeper", install) }
//!
//! fn main() -> anyhow::Result<()> {
//!     microbench::run(Suite::discover().bench("demo.Sleeper.nap", args![]))
//! }
//! ```

// Re-export core types
pub use microbench_core::{
    ArgKind, ArgValue, BenchError, BenchOutcome, BenchRunner, DEFAULT_REPEAT_COUNT, FromArg,
    InvocationError, LocationDef, Measurement, Member, Outcome, Registry, RepeatCount,
    ResolutionError, Resolver, RunError, args, split_identifier,
};

// Re-export driver types
pub use microbench_cli::{BenchConfig, Cli, Commands, Report, Suite, run_with_cli};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Submit a [`LocationDef`] for [`Registry::discover`]
#[macro_export]
macro_rules! submit {
    ($def:expr) => {
        $crate::internal::inventory::submit! { $def }
    };
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{ArgValue, BenchRunner, LocationDef, Registry, Resolver, Suite, args};
    pub use std::time::Duration;
}

/// Run the microbench CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     microbench::run(suite)
/// }
/// ```
pub use microbench_cli::run;
