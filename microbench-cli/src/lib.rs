#![warn(missing_docs)]
//! microbench CLI Library
//!
//! Command-line driver for benchmark binaries. Build a [`Suite`] (a resolver
//! plus the benchmarks to register) and hand it to [`run`] from `main`.
//!
//! # Example
//!
//! ```ignore
//! use microbench::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let suite = Suite::discover()
//!         .bench("demo.Strings.calibrated", args![])
//!         .bench("demo.Strings.concatenation", args![10_000, 5]);
//!     microbench::run(suite)
//! }
//! ```

mod config;
mod report;

pub use config::*;
pub use report::*;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use microbench_core::{ArgValue, BenchRunner, Registry, RepeatCount, Resolver};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// microbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "microbench")]
#[command(author, version, about = "microbench - average wall-clock time of named callables")]
pub struct Cli {
    /// Optional subcommand (List, Run); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter benchmarks by regex pattern on the identifier
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Output format: human, json (defaults to bench.toml or human)
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Invocations averaged per benchmark (defaults to bench.toml or 1)
    #[arg(long, short = 'n')]
    pub repeat: Option<u32>,

    /// Exit with an error if any benchmark fails
    #[arg(long)]
    pub fail_on_error: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the suite's benchmarks
    List,
    /// Run benchmarks (default)
    Run,
}

/// Benchmarks a binary offers, together with the resolver that serves them
pub struct Suite<R = Registry> {
    resolver: R,
    entries: Vec<(String, Vec<ArgValue>)>,
}

impl Suite<Registry> {
    /// Suite over every location submitted with `inventory::submit!`
    pub fn discover() -> Self {
        Self::new(Registry::discover())
    }
}

impl<R: Resolver> Suite<R> {
    /// Empty suite over `resolver`
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            entries: Vec::new(),
        }
    }

    /// Add a benchmark; validated when the suite is run
    pub fn bench(mut self, id: impl Into<String>, args: Vec<ArgValue>) -> Self {
        self.entries.push((id.into(), args));
        self
    }

    /// Benchmarks added so far, in insertion order
    pub fn entries(&self) -> &[(String, Vec<ArgValue>)] {
        &self.entries
    }

    /// Register the entries matching `filter` on a runner
    fn into_runner(self, filter: &Regex) -> anyhow::Result<BenchRunner<R>> {
        let mut runner = BenchRunner::new(self.resolver);
        for (id, args) in self.entries {
            if filter.is_match(&id) {
                runner.register(id, args)?;
            }
        }
        Ok(runner)
    }
}

/// Run the microbench CLI with the given suite.
/// This is the main entry point for benchmark binaries.
pub fn run<R: Resolver>(suite: Suite<R>) -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli, suite)
}

/// Run the microbench CLI with pre-parsed arguments.
pub fn run_with_cli<R: Resolver>(cli: Cli, suite: Suite<R>) -> anyhow::Result<()> {
    init_logging(cli.verbose);

    // Discover bench.toml configuration (CLI flags override)
    let config = BenchConfig::discover().unwrap_or_default();

    let filter =
        Regex::new(&cli.filter).map_err(|e| anyhow::anyhow!("Invalid filter pattern: {}", e))?;
    let runner = suite.into_runner(&filter)?;

    match cli.command {
        Some(Commands::List) => list_benchmarks(&runner),
        Some(Commands::Run) | None => run_benchmarks(&cli, &config, runner),
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over the defaults
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "microbench=debug"
    } else {
        "microbench=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Logs go to stderr so reports on stdout stay machine-readable
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn list_benchmarks<R: Resolver>(runner: &BenchRunner<R>) -> anyhow::Result<()> {
    println!("microbench Plan:");

    let benchmarks = runner.benchmarks();
    for id in &benchmarks {
        let args = runner
            .arguments(id)
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("├── {}({})", id, args);
    }
    println!("{} benchmarks found.", benchmarks.len());

    let locations = runner.resolver().known_locations();
    if !locations.is_empty() {
        println!("Locations: {}", locations.join(", "));
    }

    Ok(())
}

fn run_benchmarks<R: Resolver>(
    cli: &Cli,
    config: &BenchConfig,
    mut runner: BenchRunner<R>,
) -> anyhow::Result<()> {
    let format: OutputFormat = cli
        .format
        .as_deref()
        .unwrap_or(config.output.format.as_str())
        .parse()
        .map_err(anyhow::Error::msg)?;

    let repeat = RepeatCount::new(cli.repeat.unwrap_or(config.runner.repeat))?.get();

    let count = runner.benchmarks().len();
    if count == 0 {
        println!("No benchmarks found.");
        return Ok(());
    }

    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let outcomes = runner.execute_observed(repeat, |outcome| {
        pb.set_message(outcome.id.clone());
        pb.inc(1);
    })?;
    pb.finish_with_message("Complete");

    let report = build_report(&outcomes, repeat);
    let rendered = match format {
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Human => format_human_output(&report),
    };
    write_output(cli.output.as_deref(), &rendered)?;

    if (cli.fail_on_error || config.runner.fail_on_error) && report.summary.has_failures() {
        anyhow::bail!(
            "{} of {} benchmarks failed",
            report.summary.failed,
            report.summary.total
        );
    }

    Ok(())
}

fn write_output(path: Option<&Path>, content: &str) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
