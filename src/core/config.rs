//! Configuration system: TOML file + env var overrides + defaults.
//!
//! Every component receives plain config values through its constructor;
//! there is no ambient global configuration state inside the harness.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{HarnessError, Result};

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "trial-harness.toml";

/// Full harness configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct HarnessConfig {
    pub runner: RunnerConfig,
    pub mocks: MockConfig,
    pub format: FormatConfig,
}

/// Statistical runner defaults and cost controls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Default number of trials per statistical run.
    pub trial_count: usize,
    /// Required pass rate in `[0, 1]`.
    pub threshold: f64,
    /// Upper bound on concurrently executing trials.
    pub max_workers: usize,
    /// Monetary ceiling in dollars for one statistical run.
    pub cost_budget: f64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            trial_count: 10,
            threshold: 0.95,
            max_workers: 5,
            cost_budget: 5.00,
        }
    }
}

/// Mock dispatch behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MockConfig {
    /// When true, invoking a tool with no registered responder is an error.
    pub strict: bool,
    /// Per-trial execution deadline handed to the adapter.
    pub timeout_seconds: f64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            strict: true,
            timeout_seconds: 60.0,
        }
    }
}

/// Trace rendering knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatConfig {
    /// Truncate rendered argument/result values beyond this many characters.
    pub value_limit: usize,
    /// Traces longer than this are elided around the highlighted window.
    pub max_events: usize,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            value_limit: 100,
            max_events: 20,
        }
    }
}

impl HarnessConfig {
    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// path falls back to `Self::default()`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|error| HarnessError::ConfigParse {
                context: "fs",
                details: format!("{}: {error}", path_buf.display()),
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(HarnessError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `TRIAL_HARNESS_*` environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_usize("TRIAL_HARNESS_TRIAL_COUNT", &mut self.runner.trial_count)?;
        set_env_f64("TRIAL_HARNESS_THRESHOLD", &mut self.runner.threshold)?;
        set_env_usize("TRIAL_HARNESS_MAX_WORKERS", &mut self.runner.max_workers)?;
        set_env_f64("TRIAL_HARNESS_COST_BUDGET", &mut self.runner.cost_budget)?;
        set_env_bool("TRIAL_HARNESS_STRICT_MOCKS", &mut self.mocks.strict)?;
        set_env_f64(
            "TRIAL_HARNESS_TIMEOUT_SECONDS",
            &mut self.mocks.timeout_seconds,
        )?;
        set_env_usize("TRIAL_HARNESS_VALUE_LIMIT", &mut self.format.value_limit)?;
        set_env_usize("TRIAL_HARNESS_MAX_EVENTS", &mut self.format.max_events)?;
        Ok(())
    }

    /// Validate cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        if self.runner.trial_count == 0 {
            return Err(HarnessError::InvalidConfig {
                details: "runner.trial_count must be >= 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.runner.threshold) {
            return Err(HarnessError::InvalidConfig {
                details: format!(
                    "runner.threshold must be in [0, 1], got {}",
                    self.runner.threshold
                ),
            });
        }
        if self.runner.max_workers == 0 {
            return Err(HarnessError::InvalidConfig {
                details: "runner.max_workers must be >= 1".to_string(),
            });
        }
        if !self.runner.cost_budget.is_finite() || self.runner.cost_budget < 0.0 {
            return Err(HarnessError::InvalidConfig {
                details: format!(
                    "runner.cost_budget must be a finite value >= 0, got {}",
                    self.runner.cost_budget
                ),
            });
        }
        if !self.mocks.timeout_seconds.is_finite() || self.mocks.timeout_seconds <= 0.0 {
            return Err(HarnessError::InvalidConfig {
                details: format!(
                    "mocks.timeout_seconds must be > 0, got {}",
                    self.mocks.timeout_seconds
                ),
            });
        }
        if self.format.value_limit < 8 {
            return Err(HarnessError::InvalidConfig {
                details: "format.value_limit must be >= 8".to_string(),
            });
        }
        if self.format.max_events < 4 {
            return Err(HarnessError::InvalidConfig {
                details: "format.max_events must be >= 4".to_string(),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.is_empty())
}

fn set_env_f64(name: &str, slot: &mut f64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw
            .parse::<f64>()
            .map_err(|error| HarnessError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}

fn set_env_usize(name: &str, slot: &mut usize) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw
            .parse::<usize>()
            .map_err(|error| HarnessError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}

fn set_env_bool(name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw
            .parse::<bool>()
            .map_err(|error| HarnessError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}
