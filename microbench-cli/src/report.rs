//! Report Data Structures and Output
//!
//! Turns the outcomes of one execution into a serializable [`Report`] and
//! renders it for the terminal or as JSON.

use chrono::{DateTime, Utc};
use microbench_core::{BenchOutcome, InvocationError, ResolutionError, RunError, whole_millis};
use serde::{Deserialize, Serialize};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON with full schema
    Json,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run metadata
    pub meta: ReportMeta,
    /// One entry per executed benchmark
    pub results: Vec<ReportEntry>,
    /// Totals
    pub summary: ReportSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// microbench version
    pub version: String,
    /// UTC time the report was built
    pub timestamp: DateTime<Utc>,
    /// Invocations averaged per benchmark
    pub repeat: u32,
}

/// Benchmark execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    /// Measured
    Passed,
    /// Not resolvable, or the callable returned an error
    Failed,
    /// The callable panicked
    Crashed,
}

/// Individual benchmark result in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Benchmark identifier
    pub id: String,
    /// Outcome
    pub status: BenchmarkStatus,
    /// Average per invocation (ms, truncated)
    pub average_ms: Option<u64>,
    /// Time for all invocations (ms)
    pub total_ms: Option<u64>,
    /// Invocations completed
    pub iterations: u32,
    /// Failure cause
    pub error: Option<String>,
}

/// Totals over a report
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Benchmarks executed
    pub total: usize,
    /// Benchmarks measured
    pub passed: usize,
    /// Benchmarks that failed or crashed
    pub failed: usize,
}

impl ReportSummary {
    /// Whether any benchmark did not produce a result
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Build a report from execution outcomes
pub fn build_report(outcomes: &[BenchOutcome], repeat: u32) -> Report {
    let results: Vec<ReportEntry> = outcomes.iter().map(report_entry).collect();

    let passed = results
        .iter()
        .filter(|r| r.status == BenchmarkStatus::Passed)
        .count();

    Report {
        meta: ReportMeta {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            repeat,
        },
        summary: ReportSummary {
            total: results.len(),
            passed,
            failed: results.len() - passed,
        },
        results,
    }
}

fn report_entry(outcome: &BenchOutcome) -> ReportEntry {
    match &outcome.result {
        Ok(m) => ReportEntry {
            id: outcome.id.clone(),
            status: BenchmarkStatus::Passed,
            average_ms: Some(m.average_ms),
            total_ms: Some(whole_millis(m.total)),
            iterations: m.iterations,
            error: None,
        },
        Err(e) => {
            let (status, iterations) = match e {
                RunError::Invocation {
                    iteration,
                    source: InvocationError::Panicked(_),
                } => (BenchmarkStatus::Crashed, *iteration),
                RunError::Invocation { iteration, .. } => (BenchmarkStatus::Failed, *iteration),
                RunError::Resolution(ResolutionError::Panicked(_)) => {
                    (BenchmarkStatus::Crashed, 0)
                }
                RunError::Resolution(_) => (BenchmarkStatus::Failed, 0),
            };
            ReportEntry {
                id: outcome.id.clone(),
                status,
                average_ms: None,
                total_ms: None,
                iterations,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("microbench Results\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!("repeat: {}\n\n", report.meta.repeat));

    for result in &report.results {
        let status_icon = match result.status {
            BenchmarkStatus::Passed => "✓",
            BenchmarkStatus::Failed => "✗",
            BenchmarkStatus::Crashed => "💥",
        };

        match (result.average_ms, &result.error) {
            (Some(avg), _) => output.push_str(&format!(
                "  {} {} took in average {}ms to execute\n",
                status_icon, result.id, avg
            )),
            (None, Some(error)) => {
                output.push_str(&format!("  {} {}\n", status_icon, result.id));
                output.push_str(&format!("      {}\n", error));
            }
            (None, None) => output.push_str(&format!("  {} {}\n", status_icon, result.id)),
        }
    }

    output.push('\n');
    output.push_str(&format!(
        "{} benchmarks: {} passed, {} failed\n",
        report.summary.total, report.summary.passed, report.summary.failed
    ));
    output
}
