//! Diagnostics configuration for the combinators.
//!
//! Configuration can be loaded from:
//! 1. TOML file (`.relay-config.toml`)
//! 2. Environment variables (with `RELAY_` prefix)
//!
//! Environment variables override TOML configuration. None of these settings
//! change combinator semantics; they only decide what gets logged.
//!
//! # Example TOML Configuration
//!
//! ```toml
//! [relay]
//! trace_invocations = true
//! warn_on_late_report = true
//! warn_on_surplus_args = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = ".relay-config.toml";

/// Logging behavior shared by chain, combine and parallel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Open a `debug` span around every outer invocation.
    pub trace_invocations: bool,

    /// Log reports that arrive after the final callback fired at `warn`
    /// instead of `trace`.
    pub warn_on_late_report: bool,

    /// Warn when combine or parallel receive more argument sets than tasks.
    pub warn_on_surplus_args: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            trace_invocations: true,
            warn_on_late_report: false,
            warn_on_surplus_args: true,
        }
    }
}

impl RelayConfig {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. `.relay-config.toml` in the working directory
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
    }

    fn load_with(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Ok(contents) = std::fs::read_to_string(path) {
            Self::from_toml(&contents)?
        } else {
            Self::default()
        };

        config.apply_overrides(lookup);

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        let mut config = Self::from_toml(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct FullConfig {
            #[serde(default)]
            relay: RelayConfig,
        }

        let full: FullConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        Ok(full.relay)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let flag = |key: &str| lookup(key).and_then(|v| v.parse::<bool>().ok());

        if let Some(v) = flag("RELAY_TRACE_INVOCATIONS") {
            self.trace_invocations = v;
        }
        if let Some(v) = flag("RELAY_WARN_ON_LATE_REPORT") {
            self.warn_on_late_report = v;
        }
        if let Some(v) = flag("RELAY_WARN_ON_SURPLUS_ARGS") {
            self.warn_on_surplus_args = v;
        }
    }

    /// Configuration that emits no spans and no warnings.
    pub fn quiet() -> Self {
        Self {
            trace_invocations: false,
            warn_on_late_report: false,
            warn_on_surplus_args: false,
        }
    }
}

// Diagnostics emitted by the combinators, gated by the configuration.
impl RelayConfig {
    pub(crate) fn invocation_span(
        &self,
        combinator: &'static str,
        name: &str,
        tasks: usize,
    ) -> Option<tracing::span::EnteredSpan> {
        self.trace_invocations
            .then(|| tracing::debug_span!("relay", combinator, name, tasks).entered())
    }

    pub(crate) fn late_report(&self, combinator: &'static str, name: &str, task: usize) {
        if self.warn_on_late_report {
            tracing::warn!(
                combinator,
                name,
                task,
                "task reported after the final callback fired; report ignored"
            );
        } else {
            tracing::trace!(combinator, name, task, "ignoring late report");
        }
    }

    pub(crate) fn surplus_args(
        &self,
        combinator: &'static str,
        name: &str,
        tasks: usize,
        arg_sets: usize,
    ) {
        if self.warn_on_surplus_args {
            tracing::warn!(
                combinator,
                name,
                tasks,
                arg_sets,
                "more argument sets than tasks; surplus sets are ignored"
            );
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading configuration file.
    #[error("failed to read config file '{path}': {error}")]
    Io {
        /// Path to the configuration file.
        path: String,
        /// Error message.
        error: String,
    },
    /// Parse error in configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),
}
