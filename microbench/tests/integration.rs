//! Integration tests for microbench
//!
//! These tests verify the end-to-end behavior of the runner: registration,
//! execution, failure isolation and result bookkeeping.

use microbench::{
    ArgValue, BenchError, BenchRunner, InvocationError, Registry, ResolutionError, RunError, args,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[derive(Default)]
struct Workloads;

/// Registry with a counting member, a sleeper, a fallible and a no-op member
fn registry(calls: Arc<AtomicU32>) -> Registry {
    let mut registry = Registry::new();
    registry
        .location::<Workloads>("pkg.Cls")
        .member("count", move |_: &mut Workloads| {
            calls.fetch_add(1, Ordering::SeqCst);
        })
        .member("sleep", |_: &mut Workloads, ms: u64| {
            std::thread::sleep(Duration::from_millis(ms))
        })
        .member("method", |_: &mut Workloads| ())
        .member("fails", |_: &mut Workloads, reason: String| -> Result<(), String> {
            Err(reason)
        })
        .member("fast", |_: &mut Workloads| ());
    registry
}

fn runner() -> BenchRunner<Registry> {
    BenchRunner::new(registry(Arc::new(AtomicU32::new(0))))
}

/// Test that the construction-time repeat count is what `execute()` uses
#[test]
fn test_default_repeat_count_drives_execute() {
    for n in [1u32, 3, 12] {
        let calls = Arc::new(AtomicU32::new(0));
        let mut runner = BenchRunner::with_repeat_count(registry(calls.clone()), n).unwrap();
        runner.register("pkg.Cls.count", args![]).unwrap();

        runner.execute();
        assert_eq!(calls.load(Ordering::SeqCst), n);
        assert_eq!(runner.repeat_count(), n);
    }
}

/// Test that the no-argument constructor uses a single run
#[test]
fn test_default_constructor_runs_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut runner = BenchRunner::new(registry(calls.clone()));
    runner.register("pkg.Cls.count", args![]).unwrap();

    runner.execute();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// Test that a zero repeat count is rejected everywhere
#[test]
fn test_zero_repeat_count_rejected() {
    assert!(matches!(
        BenchRunner::with_repeat_count(Registry::new(), 0),
        Err(BenchError::InvalidArgument(_))
    ));

    let mut runner = runner();
    runner.register("pkg.Cls.method", args![]).unwrap();
    assert!(matches!(
        runner.execute_with(0),
        Err(BenchError::InvalidArgument(_))
    ));
    // Nothing ran
    assert_eq!(runner.result("pkg.Cls.method"), None);
}

/// Test registration validation and overwrite
#[test]
fn test_register_validates_and_overwrites() {
    let mut runner = runner();

    assert!(matches!(
        runner.register("nodots", args![]),
        Err(BenchError::InvalidArgument(_))
    ));
    assert!(!runner.is_registered("nodots"));

    runner.register("pkg.Cls.method", args![1]).unwrap();
    runner.register("pkg.Cls.method", args![]).unwrap();
    assert_eq!(runner.benchmarks(), vec!["pkg.Cls.method".to_string()]);
    assert_eq!(runner.arguments("pkg.Cls.method"), Some(Vec::<ArgValue>::new()));

    // The replacement's (empty) argument list is what gets resolved
    let outcomes = runner.execute();
    assert!(outcomes[0].is_success());
}

/// Test unregister semantics
#[test]
fn test_unregister() {
    let calls = Arc::new(AtomicU32::new(0));
    let mut runner = BenchRunner::new(registry(calls.clone()));

    assert!(matches!(
        runner.unregister("pkg.Cls.count"),
        Err(BenchError::NotFound(_))
    ));

    runner.register("pkg.Cls.count", args![]).unwrap();
    runner.execute();
    assert!(runner.result("pkg.Cls.count").is_some());

    runner.unregister("pkg.Cls.count").unwrap();
    assert!(matches!(
        runner.unregister("pkg.Cls.count"),
        Err(BenchError::NotFound(_))
    ));

    let outcomes = runner.execute();
    assert!(outcomes.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(runner.result("pkg.Cls.count"), None);
}

/// Test that the average reflects all repeats, not their sum or a single call
#[test]
fn test_average_of_repeated_sleeps() {
    let mut runner = runner();
    runner.register("pkg.Cls.sleep", args![50]).unwrap();

    let outcomes = runner.execute_with(4).unwrap();
    let measurement = outcomes[0].result.as_ref().unwrap();
    assert_eq!(measurement.iterations, 4);
    assert!(measurement.total >= Duration::from_millis(200));

    let avg = runner.result("pkg.Cls.sleep").unwrap();
    assert!(avg >= 50, "average {}ms below the sleep time", avg);
    assert!(avg < 150, "average {}ms looks like a sum", avg);
}

/// Test that an unresolvable benchmark does not stop a valid one
#[test]
fn test_resolution_failure_is_isolated() {
    let mut runner = runner();
    runner.register("nowhere.Missing.run", args![]).unwrap();
    runner.register("pkg.Cls.method", args![]).unwrap();
    runner.register("pkg.Cls.nope", args![]).unwrap();
    runner.register("pkg.Cls.sleep", args!["fifty"]).unwrap();

    let outcomes = runner.execute();
    assert_eq!(outcomes.len(), 4);

    let error_of = |id: &str| {
        outcomes
            .iter()
            .find(|o| o.id == id)
            .and_then(|o| o.error().cloned())
    };

    assert!(matches!(
        error_of("nowhere.Missing.run"),
        Some(RunError::Resolution(ResolutionError::UnknownLocation(_)))
    ));
    assert!(matches!(
        error_of("pkg.Cls.nope"),
        Some(RunError::Resolution(ResolutionError::UnknownMember { .. }))
    ));
    assert!(matches!(
        error_of("pkg.Cls.sleep"),
        Some(RunError::Resolution(ResolutionError::ShapeMismatch { .. }))
    ));
    assert!(error_of("pkg.Cls.method").is_none());

    let results = runner.results();
    assert_eq!(results.len(), 1);
    assert!(results.contains_key("pkg.Cls.method"));
}

/// Test that a callable returning an error aborts only its own run
#[test]
fn test_invocation_failure_is_isolated() {
    let mut runner = runner();
    runner.register("pkg.Cls.fails", args!["disk full"]).unwrap();
    runner.register("pkg.Cls.method", args![]).unwrap();

    let outcomes = runner.execute_with(5).unwrap();
    let failed = outcomes.iter().find(|o| o.id == "pkg.Cls.fails").unwrap();

    assert_eq!(
        failed.error(),
        Some(&RunError::Invocation {
            iteration: 0,
            source: InvocationError::Failed("disk full".to_string()),
        })
    );
    assert_eq!(runner.result("pkg.Cls.fails"), None);
    assert!(runner.result("pkg.Cls.method").is_some());
}

/// Test that results accumulate across executions instead of being cleared
#[test]
fn test_results_persist_between_executions() {
    let mut runner = runner();
    runner.register("pkg.Cls.sleep", args![20]).unwrap();
    runner.register("pkg.Cls.fast", args![]).unwrap();
    runner.execute();

    let first_sleep = runner.result("pkg.Cls.sleep").unwrap();
    assert!(first_sleep >= 20);

    // Second run only covers `fast`; the sleep result stays as it was
    runner.execute_one("pkg.Cls.fast", 3).unwrap();
    let results = runner.results();
    assert_eq!(results.len(), 2);
    assert_eq!(results["pkg.Cls.sleep"], first_sleep);

    // A failing re-run keeps the stale value
    runner.register("pkg.Cls.fast", args![1]).unwrap();
    let outcomes = runner.execute();
    assert!(!outcomes.iter().find(|o| o.id == "pkg.Cls.fast").unwrap().is_success());
    assert!(runner.result("pkg.Cls.fast").is_some());
}

/// Test that a second execution stores the latest average, not the first one
#[test]
fn test_rerun_overwrites_latest_average() {
    let mut runner = runner();
    runner.register("pkg.Cls.sleep", args![10]).unwrap();
    runner.register("pkg.Cls.fast", args![]).unwrap();
    runner.execute();
    assert!(runner.result("pkg.Cls.sleep").unwrap() >= 10);
    let fast = runner.result("pkg.Cls.fast").unwrap();

    // Only the sleep runs again, with a longer argument
    runner.register("pkg.Cls.sleep", args![40]).unwrap();
    runner.execute_one("pkg.Cls.sleep", 1).unwrap();

    let results = runner.results();
    assert!(
        results["pkg.Cls.sleep"] >= 40,
        "average {}ms is the stale first run",
        results["pkg.Cls.sleep"]
    );
    assert_eq!(results["pkg.Cls.fast"], fast);

    // A full second execution overwrites again
    runner.register("pkg.Cls.sleep", args![60]).unwrap();
    runner.execute();
    assert!(runner.result("pkg.Cls.sleep").unwrap() >= 60);
}

/// Test that a host whose construction panics does not stop the batch
#[test]
fn test_panicking_host_is_isolated() {
    struct Fragile;

    impl Default for Fragile {
        fn default() -> Self {
            panic!("fixture unavailable")
        }
    }

    let mut registry = registry(Arc::new(AtomicU32::new(0)));
    registry
        .location::<Fragile>("a.Fragile")
        .member("run", |_: &mut Fragile| ());

    let mut runner = BenchRunner::new(registry);
    runner.register("a.Fragile.run", args![]).unwrap();
    runner.register("pkg.Cls.method", args![]).unwrap();

    let outcomes = runner.execute();
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcomes[0].error(),
        Some(RunError::Resolution(ResolutionError::Panicked(_)))
    ));
    assert_eq!(runner.result("a.Fragile.run"), None);
    assert_eq!(runner.result("pkg.Cls.method"), Some(0));
}

/// Test that "absent" is distinguishable from a recorded zero
#[test]
fn test_absent_differs_from_zero() {
    let mut runner = runner();
    runner.register("pkg.Cls.fast", args![]).unwrap();

    assert_eq!(runner.result("pkg.Cls.fast"), None);
    runner.execute_with(10).unwrap();
    assert_eq!(runner.result("pkg.Cls.fast"), Some(0));
    assert_eq!(runner.result("pkg.Cls.never"), None);
}

/// Test that the returned result map is a copy
#[test]
fn test_results_are_independent_copies() {
    let mut runner = runner();
    runner.register("pkg.Cls.fast", args![]).unwrap();
    runner.execute();

    let mut results = runner.results();
    results.insert("pkg.Cls.fake".to_string(), 42);
    results.clear();

    assert_eq!(runner.results().len(), 1);
    assert_eq!(runner.result("pkg.Cls.fake"), None);
}
