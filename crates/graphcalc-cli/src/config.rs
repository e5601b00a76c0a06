//! Configuration loading for the graphcalc binary
//!
//! Sources, highest priority first:
//! 1. Command-line flags on the individual subcommands
//! 2. `GRAPHCALC_*` environment variables
//! 3. The first configuration file found (`.graphcalc.yaml`, `.graphcalc.json`, ...)
//! 4. Built-in defaults

use anyhow::{Context, Result};
use graphcalc_core::{EngineConfig, LogLevel};
use log::{debug, info, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "GRAPHCALC_CONFIG";

/// Configuration loader with multiple source support
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<EngineConfig> {
        let mut config = Self::load_from_files()?;
        Self::apply_environment_variables(&mut config);
        Ok(config)
    }

    /// Load one explicit file, then apply the environment on top
    pub fn load_with_file(path: &Path) -> Result<EngineConfig> {
        let mut config = Self::load_from_file(path)?;
        Self::apply_environment_variables(&mut config);
        Ok(config)
    }

    fn load_from_files() -> Result<EngineConfig> {
        for path in Self::find_config_files() {
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::load_from_file(&path);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(EngineConfig::default())
    }

    /// Candidate configuration paths, in search order
    pub fn find_config_files() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(config_path) = env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(config_path));
        }

        if let Ok(current_dir) = env::current_dir() {
            for name in [
                ".graphcalc.yaml",
                ".graphcalc.yml",
                ".graphcalc.json",
                ".graphcalc.toml",
            ] {
                paths.push(current_dir.join(name));
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".graphcalc.yaml"));
            paths.push(home_dir.join(".config/graphcalc/config.yaml"));
        }

        paths
    }

    /// Load configuration from a specific file, picking the format by extension
    pub fn load_from_file(path: &Path) -> Result<EngineConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            Some("toml") => toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            _ => {
                if let Ok(config) = serde_yaml::from_str(&content) {
                    config
                } else if let Ok(config) = serde_json::from_str(&content) {
                    config
                } else {
                    return Err(anyhow::anyhow!(
                        "Could not parse config file {} (tried YAML, JSON)",
                        path.display()
                    ));
                }
            }
        };

        Ok(config)
    }

    fn apply_environment_variables(config: &mut EngineConfig) {
        apply_overrides(config, |key| env::var(key).ok());
    }

    /// Save configuration to a file, picking the format by extension
    pub fn save_to_file(config: &EngineConfig, path: &Path) -> Result<()> {
        let content = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(config)
                .context("Failed to serialize config to JSON")?,
            Some("toml") => {
                toml::to_string_pretty(config).context("Failed to serialize config to TOML")?
            }
            _ => serde_yaml::to_string(config).context("Failed to serialize config to YAML")?,
        };

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        info!("Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> String {
        let config = EngineConfig::default();
        serde_yaml::to_string(&config).unwrap_or_else(|_| "# Failed to generate config".to_string())
    }
}

/// Apply `GRAPHCALC_*` overrides read through `lookup`. Unparsable values are
/// ignored with a warning.
pub fn apply_overrides<F>(config: &mut EngineConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("GRAPHCALC_RESOLUTION") {
        match v.parse() {
            Ok(n) => config.sampling.resolution = n,
            Err(_) => warn!("Ignoring GRAPHCALC_RESOLUTION={v}"),
        }
    }

    if let Some(v) = lookup("GRAPHCALC_LOG_FLOOR") {
        match v.parse() {
            Ok(f) => config.sampling.log_floor = f,
            Err(_) => warn!("Ignoring GRAPHCALC_LOG_FLOOR={v}"),
        }
    }

    if let Some(v) = lookup("GRAPHCALC_COMPLEX") {
        config.evaluation.complex_results = parse_bool(&v).unwrap_or(true);
    }

    if let Some(v) = lookup("GRAPHCALC_SOLVER_TIMEOUT_MS") {
        match v.parse() {
            Ok(ms) => config.solver.timeout_ms = ms,
            Err(_) => warn!("Ignoring GRAPHCALC_SOLVER_TIMEOUT_MS={v}"),
        }
    }

    if let Some(v) = lookup("GRAPHCALC_SOLVER_MAX_STEPS") {
        match v.parse() {
            Ok(n) => config.solver.max_steps = n,
            Err(_) => warn!("Ignoring GRAPHCALC_SOLVER_MAX_STEPS={v}"),
        }
    }

    if let Some(v) = lookup("GRAPHCALC_NUMERIC_FALLBACK") {
        config.solver.numeric_fallback = parse_bool(&v).unwrap_or(true);
    }

    if let Some(v) = lookup("GRAPHCALC_LOG_LEVEL") {
        config.logging.level = v.parse::<LogLevel>().unwrap_or(config.logging.level);
    }
}

/// Parse a boolean value from string with various formats
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enable" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disable" | "disabled" => Some(false),
        "" => Some(false),
        _ => None,
    }
}
