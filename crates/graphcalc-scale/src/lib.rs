//! Scale modes: which x-coordinates get sampled and what the axis means.

use graphcalc_eval::AngleUnit;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest start coordinate a log axis will sample.
pub const LOG_FLOOR: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    #[default]
    Linear,
    Degrees,
    #[serde(alias = "logarithmic")]
    Log,
    Polar,
    #[serde(alias = "time")]
    Parametric,
}

impl ScaleMode {
    pub const ALL: [ScaleMode; 5] = [
        ScaleMode::Linear,
        ScaleMode::Degrees,
        ScaleMode::Log,
        ScaleMode::Polar,
        ScaleMode::Parametric,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScaleMode::Linear => "linear",
            ScaleMode::Degrees => "degrees",
            ScaleMode::Log => "log",
            ScaleMode::Polar => "polar",
            ScaleMode::Parametric => "parametric",
        }
    }

    /// Angle unit the evaluator must apply to forward trig functions.
    pub fn angle_unit(&self) -> AngleUnit {
        match self {
            ScaleMode::Degrees => AngleUnit::Degrees,
            _ => AngleUnit::Radians,
        }
    }

    /// Modes that require `start < end`.
    pub fn requires_ordered_domain(&self) -> bool {
        matches!(self, ScaleMode::Linear | ScaleMode::Log | ScaleMode::Degrees)
    }

    pub fn axis_label(&self, variable: &str) -> String {
        match self {
            ScaleMode::Linear => variable.to_string(),
            ScaleMode::Log => format!("{variable} (log)"),
            ScaleMode::Degrees => format!("{variable} (degrees)"),
            ScaleMode::Parametric => TIME_LABEL.to_string(),
            ScaleMode::Polar => "θ".to_string(),
        }
    }
}

const TIME_LABEL: &str = "t (ms)";

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScaleMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(ScaleMode::Linear),
            "degrees" | "degree" => Ok(ScaleMode::Degrees),
            "log" | "logarithmic" => Ok(ScaleMode::Log),
            "polar" => Ok(ScaleMode::Polar),
            "parametric" | "time" => Ok(ScaleMode::Parametric),
            _ => Err(ConfigurationError::UnknownScaleMode(s.to_string())),
        }
    }
}

/// Closed interval of the independent variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub start: f64,
    pub end: f64,
}

impl Domain {
    pub fn new(start: f64, end: f64) -> Self {
        Domain { start, end }
    }

    pub fn contains(&self, x: f64) -> bool {
        let (lo, hi) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        x >= lo && x <= hi
    }

    pub fn width(&self) -> f64 {
        (self.end - self.start).abs()
    }
}

impl Default for Domain {
    fn default() -> Self {
        Domain::new(-10.0, 10.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown scale mode '{0}' (expected linear, degrees, log, polar or parametric)")]
    UnknownScaleMode(String),

    #[error("resolution must be at least 1")]
    ZeroResolution,

    #[error("domain bounds must be finite, got [{start}, {end}]")]
    NonFiniteBounds { start: f64, end: f64 },

    #[error("{mode} scale requires start < end, got [{start}, {end}]")]
    EmptyDomain { mode: ScaleMode, start: f64, end: f64 },

    #[error("log scale requires end above {floor}, got {end}")]
    LogRangeBelowFloor { end: f64, floor: f64 },
}

/// Sampled axis: coordinates plus what they mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleAxis {
    pub mode: ScaleMode,
    pub label: String,
    pub angle_unit: AngleUnit,
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleTransform {
    pub mode: ScaleMode,
    pub log_floor: f64,
    pub millisecond_mode: bool,
}

impl ScaleTransform {
    pub fn new(mode: ScaleMode) -> Self {
        ScaleTransform {
            mode,
            log_floor: LOG_FLOOR,
            millisecond_mode: false,
        }
    }

    pub fn with_log_floor(mut self, floor: f64) -> Self {
        self.log_floor = floor;
        self
    }

    pub fn with_millisecond_mode(mut self, on: bool) -> Self {
        self.millisecond_mode = on;
        self
    }

    pub fn label(&self, variable: &str) -> String {
        if self.millisecond_mode {
            TIME_LABEL.to_string()
        } else {
            self.mode.axis_label(variable)
        }
    }

    pub fn coordinates(
        &self,
        start: f64,
        end: f64,
        resolution: usize,
    ) -> Result<Vec<f64>, ConfigurationError> {
        if resolution == 0 {
            return Err(ConfigurationError::ZeroResolution);
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(ConfigurationError::NonFiniteBounds { start, end });
        }
        if self.mode.requires_ordered_domain() && start >= end {
            return Err(ConfigurationError::EmptyDomain {
                mode: self.mode,
                start,
                end,
            });
        }
        let coords = match self.mode {
            ScaleMode::Log => {
                if end <= self.log_floor {
                    return Err(ConfigurationError::LogRangeBelowFloor {
                        end,
                        floor: self.log_floor,
                    });
                }
                let clamped = start.max(self.log_floor);
                if clamped != start {
                    tracing::debug!(start, clamped, "clamped log axis start");
                }
                logspace(clamped, end, resolution)
            }
            _ => linspace(start, end, resolution),
        };
        Ok(coords)
    }

    pub fn sample(
        &self,
        variable: &str,
        start: f64,
        end: f64,
        resolution: usize,
    ) -> Result<SampleAxis, ConfigurationError> {
        Ok(SampleAxis {
            mode: self.mode,
            label: self.label(variable),
            angle_unit: self.mode.angle_unit(),
            coordinates: self.coordinates(start, end, resolution)?,
        })
    }
}

/// Sample coordinates for `mode` over `[start, end]` with the default log floor.
pub fn sample_coordinates(
    mode: ScaleMode,
    start: f64,
    end: f64,
    resolution: usize,
) -> Result<Vec<f64>, ConfigurationError> {
    ScaleTransform::new(mode).coordinates(start, end, resolution)
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let step = (end - start) / (n - 1) as f64;
    let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
    out[n - 1] = end;
    out
}

fn logspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![start];
    }
    let (ls, le) = (start.ln(), end.ln());
    let step = (le - ls) / (n - 1) as f64;
    let mut out: Vec<f64> = (0..n).map(|i| (ls + step * i as f64).exp()).collect();
    out[0] = start;
    out[n - 1] = end;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_hits_both_endpoints() {
        let xs = linspace(-1.0, 1.0, 5);
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn logspace_is_geometric() {
        let xs = logspace(1.0, 1000.0, 4);
        assert_eq!(xs[0], 1.0);
        assert_eq!(xs[3], 1000.0);
        assert!((xs[1] - 10.0).abs() < 1e-9);
        assert!((xs[2] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn mode_names_parse_back() {
        for mode in ScaleMode::ALL {
            assert_eq!(mode.name().parse::<ScaleMode>().unwrap(), mode);
        }
        assert_eq!("Logarithmic".parse::<ScaleMode>().unwrap(), ScaleMode::Log);
        assert_eq!("time".parse::<ScaleMode>().unwrap(), ScaleMode::Parametric);
    }

    #[test]
    fn domain_membership_ignores_orientation() {
        assert!(Domain::new(0.0, 1.0).contains(1.0));
        assert!(Domain::new(1.0, 0.0).contains(0.5));
        assert!(!Domain::new(0.0, 1.0).contains(1.5));
    }
}
