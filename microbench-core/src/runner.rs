//! BenchRunner - Registration, Execution and Results
//!
//! Benchmarks are registered under a `location.member` identifier together
//! with the arguments to replay. Execution resolves each identifier, times
//! `repeat` sequential invocations and stores the truncated average in
//! milliseconds. A failing benchmark never stops the batch: its error is
//! logged, returned in its [`BenchOutcome`], and any previous result is kept.

use crate::error::{BenchError, InvocationError, ResolutionError, RunError, panic_message};
use crate::measure::{Timer, average_millis, whole_millis};
use crate::resolver::Resolver;
use crate::value::ArgValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Repeat count used when none is given
pub const DEFAULT_REPEAT_COUNT: u32 = 1;

/// Separates the location from the member name in an identifier
pub const SEPARATOR: char = '.';

/// Number of sequential invocations averaged into one measurement (>= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RepeatCount(NonZeroU32);

impl RepeatCount {
    /// Validate a repeat count
    pub fn new(count: u32) -> Result<Self, BenchError> {
        NonZeroU32::new(count).map(Self).ok_or_else(|| {
            BenchError::InvalidArgument(format!("repeat count must be at least 1, got {}", count))
        })
    }

    /// The count as a plain integer
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for RepeatCount {
    fn default() -> Self {
        Self(NonZeroU32::MIN)
    }
}

impl TryFrom<u32> for RepeatCount {
    type Error = BenchError;

    fn try_from(count: u32) -> Result<Self, Self::Error> {
        Self::new(count)
    }
}

impl From<RepeatCount> for u32 {
    fn from(count: RepeatCount) -> Self {
        count.get()
    }
}

/// Timing of one successful benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Average per invocation, whole milliseconds rounded down
    pub average_ms: u64,
    /// Wall-clock time of all invocations together
    pub total: Duration,
    /// Number of invocations timed
    pub iterations: u32,
}

/// Result of running one registered benchmark
#[derive(Debug, Clone)]
pub struct BenchOutcome {
    /// Benchmark identifier
    pub id: String,
    /// Measurement, or the contained failure
    pub result: Result<Measurement, RunError>,
}

impl BenchOutcome {
    /// Whether a result was recorded
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Recorded average, if the run succeeded
    pub fn average_ms(&self) -> Option<u64> {
        self.result.as_ref().ok().map(|m| m.average_ms)
    }

    /// Failure cause, if the run failed
    pub fn error(&self) -> Option<&RunError> {
        self.result.as_ref().err()
    }
}

/// Split `location.member` at the last separator.
///
/// Both halves must be non-empty.
pub fn split_identifier(id: &str) -> Option<(&str, &str)> {
    let (location, member) = id.rsplit_once(SEPARATOR)?;
    if location.is_empty() || member.is_empty() {
        return None;
    }
    Some((location, member))
}

/// Registers benchmarks by identifier, runs them and keeps their averages.
///
/// Single-threaded: every mutating call takes `&mut self` and blocks until
/// done.
pub struct BenchRunner<R> {
    resolver: R,
    benchmarks: BTreeMap<String, Vec<ArgValue>>,
    results: BTreeMap<String, u64>,
    repeat: RepeatCount,
}

impl<R: Resolver> BenchRunner<R> {
    /// Create a runner with the default repeat count ([`DEFAULT_REPEAT_COUNT`])
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            benchmarks: BTreeMap::new(),
            results: BTreeMap::new(),
            repeat: RepeatCount::default(),
        }
    }

    /// Create a runner whose [`execute`](Self::execute) repeats each benchmark `count` times
    pub fn with_repeat_count(resolver: R, count: u32) -> Result<Self, BenchError> {
        let repeat = RepeatCount::new(count)?;
        Ok(Self {
            repeat,
            ..Self::new(resolver)
        })
    }

    /// Default repeat count
    pub fn repeat_count(&self) -> u32 {
        self.repeat.get()
    }

    /// The resolver used to look up targets
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Register (or replace) a benchmark.
    ///
    /// The identifier must read `location.member`. Resolution happens only
    /// at execution time.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        args: impl IntoIterator<Item = ArgValue>,
    ) -> Result<(), BenchError> {
        let id = id.into();
        if split_identifier(&id).is_none() {
            return Err(BenchError::InvalidArgument(format!(
                "identifier `{}` is not of the form location{}member",
                id, SEPARATOR
            )));
        }

        let args: Vec<ArgValue> = args.into_iter().collect();
        if self.benchmarks.insert(id.clone(), args).is_some() {
            tracing::debug!(benchmark = %id, "replaced registration");
        }
        Ok(())
    }

    /// Remove a benchmark and its stored result
    pub fn unregister(&mut self, id: &str) -> Result<(), BenchError> {
        if self.benchmarks.remove(id).is_none() {
            return Err(BenchError::NotFound(id.to_string()));
        }
        self.results.remove(id);
        Ok(())
    }

    /// Whether `id` is currently registered
    pub fn is_registered(&self, id: &str) -> bool {
        self.benchmarks.contains_key(id)
    }

    /// Registered identifiers, sorted
    pub fn benchmarks(&self) -> Vec<String> {
        self.benchmarks.keys().cloned().collect()
    }

    /// Arguments stored for `id`
    pub fn arguments(&self, id: &str) -> Option<Vec<ArgValue>> {
        self.benchmarks.get(id).cloned()
    }

    /// Run every registered benchmark with the default repeat count
    pub fn execute(&mut self) -> Vec<BenchOutcome> {
        self.execute_repeat(self.repeat, |_| {})
    }

    /// Run every registered benchmark `repeat` times each
    pub fn execute_with(&mut self, repeat: u32) -> Result<Vec<BenchOutcome>, BenchError> {
        let repeat = RepeatCount::new(repeat)?;
        Ok(self.execute_repeat(repeat, |_| {}))
    }

    /// Like [`execute_with`](Self::execute_with), calling `observer` after each benchmark
    pub fn execute_observed<F>(
        &mut self,
        repeat: u32,
        observer: F,
    ) -> Result<Vec<BenchOutcome>, BenchError>
    where
        F: FnMut(&BenchOutcome),
    {
        let repeat = RepeatCount::new(repeat)?;
        Ok(self.execute_repeat(repeat, observer))
    }

    /// Run a single registered benchmark `repeat` times
    pub fn execute_one(&mut self, id: &str, repeat: u32) -> Result<BenchOutcome, BenchError> {
        let repeat = RepeatCount::new(repeat)?;
        let args = self
            .benchmarks
            .get(id)
            .ok_or_else(|| BenchError::NotFound(id.to_string()))?;

        let result = run_single(&self.resolver, id, args, repeat);
        Ok(self.record(id, result))
    }

    /// Copy of all stored averages (milliseconds), keyed by identifier
    pub fn results(&self) -> BTreeMap<String, u64> {
        self.results.clone()
    }

    /// Stored average for `id`; `None` until a run has succeeded
    pub fn result(&self, id: &str) -> Option<u64> {
        self.results.get(id).copied()
    }

    fn execute_repeat<F>(&mut self, repeat: RepeatCount, mut observer: F) -> Vec<BenchOutcome>
    where
        F: FnMut(&BenchOutcome),
    {
        tracing::info!(
            benchmarks = self.benchmarks.len(),
            repeat = repeat.get(),
            "executing benchmarks"
        );

        let ids: Vec<String> = self.benchmarks.keys().cloned().collect();
        let mut outcomes = Vec::with_capacity(ids.len());

        for id in ids {
            let result = match self.benchmarks.get(&id) {
                Some(args) => run_single(&self.resolver, &id, args, repeat),
                None => continue,
            };
            let outcome = self.record(&id, result);
            observer(&outcome);
            outcomes.push(outcome);
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        tracing::info!(
            succeeded = outcomes.len() - failed,
            failed,
            "execution complete"
        );
        outcomes
    }

    /// Store a successful average and log the outcome
    fn record(&mut self, id: &str, result: Result<Measurement, RunError>) -> BenchOutcome {
        match &result {
            Ok(m) => {
                tracing::debug!(
                    benchmark = %id,
                    average_ms = m.average_ms,
                    total_ms = whole_millis(m.total),
                    iterations = m.iterations,
                    "benchmark measured"
                );
                self.results.insert(id.to_string(), m.average_ms);
            }
            Err(e) => {
                tracing::warn!(benchmark = %id, error = %e, "benchmark failed");
            }
        }

        BenchOutcome {
            id: id.to_string(),
            result,
        }
    }
}

/// Resolve and time one benchmark
fn run_single<R: Resolver>(
    resolver: &R,
    id: &str,
    args: &[ArgValue],
    repeat: RepeatCount,
) -> Result<Measurement, RunError> {
    let (location, member) =
        split_identifier(id).ok_or_else(|| ResolutionError::InvalidIdentifier(id.to_string()))?;
    let mut target = panic::catch_unwind(AssertUnwindSafe(|| {
        resolver.resolve(location, member, args)
    }))
    .map_err(|payload| ResolutionError::Panicked(panic_message(&*payload)))??;

    let iterations = repeat.get();
    let mut completed = 0u32;

    let timer = Timer::start();
    let run = panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), InvocationError> {
        for _ in 0..iterations {
            std::hint::black_box(target())?;
            completed += 1;
        }
        Ok(())
    }));
    let total = timer.stop();

    let source = match run {
        Ok(Ok(())) => {
            return Ok(Measurement {
                average_ms: average_millis(total, repeat.0),
                total,
                iterations,
            });
        }
        Ok(Err(e)) => e,
        Err(payload) => InvocationError::Panicked(panic_message(&*payload)),
    };

    Err(RunError::Invocation {
        iteration: completed,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::resolver::Registry;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Host;

    fn counting_registry(calls: Rc<Cell<u32>>) -> Registry {
        let mut registry = Registry::new();
        registry
            .location::<Host>("t.Host")
            .member("count", move |_: &mut Host| calls.set(calls.get() + 1))
            .member("noop", |_: &mut Host, _n: i64| ())
            .member("panics", |_: &mut Host| -> () { panic!("exploded") });
        registry
    }

    #[test]
    fn test_split_identifier() {
        assert_eq!(split_identifier("pkg.Cls.method"), Some(("pkg.Cls", "method")));
        assert_eq!(split_identifier("a.b"), Some(("a", "b")));
        assert_eq!(split_identifier("nodot"), None);
        assert_eq!(split_identifier(".member"), None);
        assert_eq!(split_identifier("location."), None);
    }

    #[test]
    fn test_repeat_count_rejects_zero() {
        assert!(matches!(RepeatCount::new(0), Err(BenchError::InvalidArgument(_))));
        assert_eq!(RepeatCount::new(3).unwrap().get(), 3);
        assert_eq!(RepeatCount::default().get(), DEFAULT_REPEAT_COUNT);
    }

    #[test]
    fn test_default_repeat_count_is_used() {
        let calls = Rc::new(Cell::new(0));
        let mut runner =
            BenchRunner::with_repeat_count(counting_registry(calls.clone()), 7).unwrap();
        runner.register("t.Host.count", args![]).unwrap();

        let outcomes = runner.execute();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(calls.get(), 7);
        assert_eq!(outcomes[0].result.as_ref().unwrap().iterations, 7);
    }

    #[test]
    fn test_execute_one() {
        let calls = Rc::new(Cell::new(0));
        let mut runner = BenchRunner::new(counting_registry(calls.clone()));
        runner.register("t.Host.count", args![]).unwrap();
        runner.register("t.Host.noop", args![1]).unwrap();

        let outcome = runner.execute_one("t.Host.count", 3).unwrap();
        assert!(outcome.is_success());
        assert_eq!(calls.get(), 3);
        assert_eq!(runner.result("t.Host.noop"), None);

        assert!(matches!(
            runner.execute_one("t.Host.missing", 1),
            Err(BenchError::NotFound(_))
        ));
        assert!(matches!(
            runner.execute_one("t.Host.count", 0),
            Err(BenchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_panic_is_contained() {
        let calls = Rc::new(Cell::new(0));
        let mut runner = BenchRunner::new(counting_registry(calls.clone()));
        runner.register("t.Host.panics", args![]).unwrap();
        runner.register("t.Host.count", args![]).unwrap();

        let outcomes = runner.execute_with(2).unwrap();
        let failed = outcomes.iter().find(|o| o.id == "t.Host.panics").unwrap();
        match failed.error() {
            Some(RunError::Invocation {
                iteration: 0,
                source: InvocationError::Panicked(msg),
            }) => assert!(msg.contains("exploded")),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(runner.result("t.Host.panics"), None);
        assert!(runner.result("t.Host.count").is_some());
        assert_eq!(calls.get(), 2);
    }

    struct Fragile;

    impl Default for Fragile {
        fn default() -> Self {
            panic!("no fixture")
        }
    }

    #[test]
    fn test_panicking_host_construction_is_contained() {
        let calls = Rc::new(Cell::new(0));
        let mut registry = counting_registry(calls.clone());
        registry
            .location::<Fragile>("a.Fragile")
            .member("run", |_: &mut Fragile| ());

        let mut runner = BenchRunner::new(registry);
        runner.register("a.Fragile.run", args![]).unwrap();
        runner.register("t.Host.count", args![]).unwrap();

        let outcomes = runner.execute();
        assert_eq!(outcomes.len(), 2);
        match outcomes[0].error() {
            Some(RunError::Resolution(ResolutionError::Panicked(msg))) => {
                assert!(msg.contains("no fixture"))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(runner.result("a.Fragile.run"), None);
        assert!(runner.result("t.Host.count").is_some());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_observer_sees_every_outcome() {
        let calls = Rc::new(Cell::new(0));
        let mut runner = BenchRunner::new(counting_registry(calls));
        runner.register("t.Host.count", args![]).unwrap();
        runner.register("t.Host.noop", args![4]).unwrap();
        runner.register("t.Nowhere.count", args![]).unwrap();

        let mut seen = Vec::new();
        runner
            .execute_observed(1, |o| seen.push((o.id.clone(), o.is_success())))
            .unwrap();

        assert_eq!(
            seen,
            vec![
                ("t.Host.count".to_string(), true),
                ("t.Host.noop".to_string(), true),
                ("t.Nowhere.count".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_arguments_are_copies() {
        let mut runner = BenchRunner::new(Registry::new());
        runner.register("t.Host.noop", args![1]).unwrap();

        let mut args = runner.arguments("t.Host.noop").unwrap();
        args.push(ArgValue::Int(2));
        assert_eq!(runner.arguments("t.Host.noop").unwrap(), args![1]);
        assert_eq!(runner.benchmarks(), vec!["t.Host.noop".to_string()]);
    }
}
