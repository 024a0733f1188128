use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::TriggerError;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trigger: TriggerConfig,
    pub timeouts: TimeoutConfig,
    pub gate: GateConfig,
    pub executor: ExecutorConfig,
}

/// Trigger-mode selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Wait for every check suite on the revision to settle
    pub wait_for_all_checks: bool,
    /// Only used when `wait_for_all_checks` is false: trigger on this
    /// system's completed suite alone
    pub trigger_system_name: Option<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            wait_for_all_checks: true,
            trigger_system_name: None,
        }
    }
}

/// How one configured instance decides a revision is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerMode {
    /// Evaluate across every check suite for the revision
    WaitForAll,
    /// Trigger only when the named system's suite completes
    NamedWorkflow(String),
}

/// Debounce and staleness thresholds, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub debounce_delay_ms: u64,
    /// A suite in progress longer than this is treated as abandoned
    pub max_wait_ms: u64,
    /// A queued suite older than this is assumed never scheduled
    pub conditional_job_timeout_ms: u64,
    /// Grace period before a queued suite with zero runs is written off
    pub empty_suite_grace_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: 5_000,
            max_wait_ms: 1_800_000,
            conditional_job_timeout_ms: 300_000,
            empty_suite_grace_ms: 60_000,
        }
    }
}

/// Deduplication gate tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub ttl_ms: u64,
    pub sweep_interval_ms: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            sweep_interval_ms: 60_000,
        }
    }
}

/// External review agent invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            command: "ai-review-agent".to_string(),
            args: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Load configuration from the default location (.check-trigger/config.yml)
    pub fn load_default() -> Result<Self> {
        Self::load(".check-trigger/config.yml")
    }

    /// Apply environment-variable overrides on top of the file values
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("WAIT_FOR_ALL_CHECKS") {
            self.trigger.wait_for_all_checks = v
                .parse::<bool>()
                .with_context(|| format!("WAIT_FOR_ALL_CHECKS must be a bool, got: {}", v))?;
        }
        if let Ok(v) = std::env::var("TRIGGER_SYSTEM_NAME") {
            if !v.is_empty() {
                self.trigger.trigger_system_name = Some(v);
            }
        }

        for (var, target) in [
            ("DEBOUNCE_DELAY_MS", &mut self.timeouts.debounce_delay_ms),
            ("MAX_WAIT_MS", &mut self.timeouts.max_wait_ms),
            (
                "CONDITIONAL_JOB_TIMEOUT_MS",
                &mut self.timeouts.conditional_job_timeout_ms,
            ),
            ("GATE_TTL_MS", &mut self.gate.ttl_ms),
        ] {
            if let Ok(v) = std::env::var(var) {
                *target = v
                    .parse::<u64>()
                    .with_context(|| format!("{} must be an integer, got: {}", var, v))?;
            }
        }

        Ok(())
    }

    /// Resolve the trigger mode, failing fast on inconsistent settings
    pub fn trigger_mode(&self) -> Result<TriggerMode, TriggerError> {
        if self.trigger.wait_for_all_checks {
            return Ok(TriggerMode::WaitForAll);
        }

        match self.trigger.trigger_system_name.as_deref() {
            Some(name) if !name.trim().is_empty() => {
                Ok(TriggerMode::NamedWorkflow(name.to_string()))
            }
            _ => Err(TriggerError::Configuration(
                "TRIGGER_SYSTEM_NAME is required when WAIT_FOR_ALL_CHECKS is false".to_string(),
            )),
        }
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.timeouts.debounce_delay_ms)
    }

    pub fn stale_in_progress_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.timeouts.max_wait_ms as i64)
    }

    pub fn conditional_job_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.timeouts.conditional_job_timeout_ms as i64)
    }

    pub fn empty_suite_grace(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.timeouts.empty_suite_grace_ms as i64)
    }

    pub fn gate_ttl(&self) -> Duration {
        Duration::from_millis(self.gate.ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.gate.sweep_interval_ms)
    }
}
