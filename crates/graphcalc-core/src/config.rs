//! Engine configuration.
//!
//! Plain data with defaults for every field, so a partial file fills in the
//! rest. Loading it from disk and the environment is the binary's job.

use graphcalc_eval::{AngleUnit, EvalOptions};
use graphcalc_symbolic::SolverConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sample grid configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Samples per curve when a request does not say
    #[serde(default = "default_resolution")]
    pub resolution: usize,
    /// Smallest coordinate a log axis samples
    #[serde(default = "default_log_floor")]
    pub log_floor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Report complex samples instead of NaN
    #[serde(default = "default_true")]
    pub complex_results: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

// Default value functions
fn default_resolution() -> usize {
    1000
}
fn default_log_floor() -> f64 {
    graphcalc_scale::LOG_FLOOR
}
fn default_true() -> bool {
    true
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            log_floor: default_log_floor(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            complex_results: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
        }
    }
}

impl EngineConfig {
    pub fn eval_options(&self, angle_unit: AngleUnit) -> EvalOptions {
        EvalOptions {
            angle_unit,
            complex_results: self.evaluation.complex_results,
        }
    }

    pub fn solver_config(&self, angle_unit: AngleUnit) -> SolverConfig {
        SolverConfig {
            angle_unit,
            ..self.solver.clone()
        }
    }
}
