//! Configuration loading from bench.toml
//!
//! microbench configuration can be specified in a `bench.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up by [`BenchConfig::discover`]
pub const CONFIG_FILE: &str = "bench.toml";

/// microbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BenchConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Invocations averaged per benchmark
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Exit with an error if any benchmark failed
    #[serde(default)]
    pub fail_on_error: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            repeat: default_repeat(),
            fail_on_error: false,
        }
    }
}

fn default_repeat() -> u32 {
    microbench_core::DEFAULT_REPEAT_COUNT
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl BenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Walk up from `start` and load the first `bench.toml` found.
    ///
    /// A file that fails to parse is reported and treated as absent.
    pub fn discover_from(start: &Path) -> Option<Self> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), error = %e, "ignoring invalid config");
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# microbench configuration

[runner]
# Invocations averaged per benchmark (at least 1)
repeat = 1
# Exit with an error when a benchmark fails to resolve or run
fail_on_error = false

[output]
# Output format: human, json
format = "human"
"#
        .to_string()
    }
}
