//! Temperature providers.
//!
//! Exactly one resolved provider drives a run; the engine queries it once
//! per step (and once per sub-step when sub-dividing). Providers are pure
//! functions of time.

use cinder_core::{ConfigError, StepError};

/// Tabulated temperature over time, linearly interpolated and clamped at
/// both ends.
#[derive(Clone, Debug, PartialEq)]
pub struct TemperatureTable {
    times_s: Vec<f64>,
    temps_k: Vec<f64>,
}

impl TemperatureTable {
    /// Build a table, validating the axis and temperature values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTable`] for a defective time axis or
    /// non-positive temperatures.
    pub fn new(times_s: Vec<f64>, temps_k: Vec<f64>) -> Result<Self, ConfigError> {
        if times_s.len() < 2 {
            return Err(ConfigError::InvalidTable {
                what: "temperature",
                reason: format!("time axis needs at least 2 knots, got {}", times_s.len()),
            });
        }
        if times_s.windows(2).any(|w| !(w[1] > w[0])) || times_s.iter().any(|t| !t.is_finite()) {
            return Err(ConfigError::InvalidTable {
                what: "temperature",
                reason: "time axis must be finite and strictly ascending".to_string(),
            });
        }
        if temps_k.len() != times_s.len() {
            return Err(ConfigError::InvalidTable {
                what: "temperature",
                reason: format!("expected {} temperatures, got {}", times_s.len(), temps_k.len()),
            });
        }
        if temps_k.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(ConfigError::InvalidTable {
                what: "temperature",
                reason: "temperatures must be finite and positive".to_string(),
            });
        }
        Ok(Self { times_s, temps_k })
    }

    fn at(&self, t: f64) -> f64 {
        let ts = &self.times_s;
        if t <= ts[0] {
            return self.temps_k[0];
        }
        if t >= ts[ts.len() - 1] {
            return self.temps_k[self.temps_k.len() - 1];
        }
        let i = (ts.partition_point(|&v| v <= t) - 1).min(ts.len() - 2);
        let w = (t - ts[i]) / (ts[i + 1] - ts[i]);
        self.temps_k[i] * (1.0 - w) + self.temps_k[i + 1] * w
    }
}

/// The resolved temperature source for a run.
#[derive(Clone, Debug, PartialEq)]
pub enum TemperatureDriver {
    /// Fixed temperature for the whole run (K).
    Constant(f64),
    /// Tabulated cooling history.
    Table(TemperatureTable),
    /// Exponential relaxation toward a floor:
    /// T(t) = floor + (T₀ − floor)·exp(−t/τ).
    CoolingCurve {
        /// Temperature at t = 0 (K).
        t_initial_k: f64,
        /// Asymptotic floor (K).
        t_floor_k: f64,
        /// Cooling e-folding time (s).
        tau_cool_s: f64,
    },
}

impl TemperatureDriver {
    /// Structural validation at configuration time.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveParameter`] for non-positive
    /// temperatures or cooling times.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Constant(t) => {
                if !t.is_finite() || *t <= 0.0 {
                    return Err(ConfigError::NonPositiveParameter {
                        name: "temperature",
                        value: *t,
                    });
                }
            }
            Self::Table(_) => {}
            Self::CoolingCurve {
                t_initial_k,
                t_floor_k,
                tau_cool_s,
            } => {
                for (name, value) in [
                    ("t_initial_k", *t_initial_k),
                    ("t_floor_k", *t_floor_k),
                    ("tau_cool_s", *tau_cool_s),
                ] {
                    if !value.is_finite() || value <= 0.0 {
                        return Err(ConfigError::NonPositiveParameter { name, value });
                    }
                }
                if t_floor_k > t_initial_k {
                    return Err(ConfigError::NonPositiveParameter {
                        name: "t_initial_k - t_floor_k",
                        value: t_initial_k - t_floor_k,
                    });
                }
            }
        }
        Ok(())
    }

    /// Temperature at `time_s` (K).
    ///
    /// # Errors
    ///
    /// Returns [`StepError::InvalidTemperature`] if the provider produces
    /// a non-finite or non-positive value.
    pub fn at(&self, time_s: f64) -> Result<f64, StepError> {
        let t = match self {
            Self::Constant(t) => *t,
            Self::Table(table) => table.at(time_s),
            Self::CoolingCurve {
                t_initial_k,
                t_floor_k,
                tau_cool_s,
            } => t_floor_k + (t_initial_k - t_floor_k) * (-time_s / tau_cool_s).exp(),
        };
        if !t.is_finite() || t <= 0.0 {
            return Err(StepError::InvalidTemperature { value: t });
        }
        Ok(t)
    }

    /// Short provenance tag for the summary.
    pub fn source_description(&self) -> &'static str {
        match self {
            Self::Constant(_) => "temperature:constant",
            Self::Table(_) => "temperature:table",
            Self::CoolingCurve { .. } => "temperature:cooling-curve",
        }
    }
}
