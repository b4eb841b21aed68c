//! External supply of sub-blow-out material into the surface layer.
//!
//! The supply rate is an areal production rate (kg m⁻² s⁻¹) selected from
//! one of several functional forms, scaled by a transport/mixing
//! efficiency, and clamped to be non-negative. Evaluation is pure: the
//! same time always yields the same rate.

use cinder_core::ConfigError;

/// Softening added to the elapsed time of the power-law form so the rate
/// stays finite at the onset instant for negative indices.
const POWERLAW_EPS: f64 = 1.0e-12;

// ── Table ──────────────────────────────────────────────────────────

/// Tabulated supply rate over time, linearly interpolated and clamped at
/// both ends.
#[derive(Clone, Debug, PartialEq)]
pub struct SupplyTable {
    times_s: Vec<f64>,
    rates: Vec<f64>,
}

impl SupplyTable {
    /// Build a table, validating the time axis and rates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTable`] for a short or unsorted time
    /// axis, mismatched lengths, or negative/non-finite rates.
    pub fn new(times_s: Vec<f64>, rates: Vec<f64>) -> Result<Self, ConfigError> {
        if times_s.len() < 2 {
            return Err(ConfigError::InvalidTable {
                what: "supply",
                reason: format!("time axis needs at least 2 knots, got {}", times_s.len()),
            });
        }
        if times_s.windows(2).any(|w| !(w[1] > w[0])) || times_s.iter().any(|t| !t.is_finite()) {
            return Err(ConfigError::InvalidTable {
                what: "supply",
                reason: "time axis must be finite and strictly ascending".to_string(),
            });
        }
        if rates.len() != times_s.len() {
            return Err(ConfigError::InvalidTable {
                what: "supply",
                reason: format!("expected {} rates, got {}", times_s.len(), rates.len()),
            });
        }
        if rates.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(ConfigError::InvalidTable {
                what: "supply",
                reason: "rates must be finite and non-negative".to_string(),
            });
        }
        Ok(Self { times_s, rates })
    }

    fn rate_at(&self, t: f64) -> f64 {
        let ts = &self.times_s;
        if t <= ts[0] {
            return self.rates[0];
        }
        if t >= ts[ts.len() - 1] {
            return self.rates[self.rates.len() - 1];
        }
        let i = ts.partition_point(|&v| v <= t) - 1;
        let i = i.min(ts.len() - 2);
        let w = (t - ts[i]) / (ts[i + 1] - ts[i]);
        self.rates[i] * (1.0 - w) + self.rates[i + 1] * w
    }
}

// ── Model ──────────────────────────────────────────────────────────

/// One window of a piecewise supply composition.
#[derive(Clone, Debug, PartialEq)]
pub struct SupplyPiece {
    /// Window start (inclusive, s).
    pub t_start_s: f64,
    /// Window end (exclusive, s).
    pub t_end_s: f64,
    /// Model active inside the window. Pieces may nest further piecewise
    /// models.
    pub model: SupplyModel,
}

/// Functional form of the raw (pre-mixing) supply rate.
#[derive(Clone, Debug, PartialEq)]
pub enum SupplyModel {
    /// Time-independent rate (kg m⁻² s⁻¹).
    Constant {
        /// The rate.
        rate: f64,
    },
    /// Power law in elapsed time: A·((t − t0) + ε)^index.
    PowerLaw {
        /// Amplitude A (kg m⁻² s⁻¹ at unit elapsed time).
        amplitude: f64,
        /// Onset time t0 (s).
        t0_s: f64,
        /// Exponent.
        index: f64,
    },
    /// Tabulated rate over time.
    Table(SupplyTable),
    /// First matching window wins; zero outside all windows.
    Piecewise(Vec<SupplyPiece>),
}

impl SupplyModel {
    fn raw_rate(&self, time_s: f64) -> f64 {
        match self {
            Self::Constant { rate } => *rate,
            Self::PowerLaw {
                amplitude,
                t0_s,
                index,
            } => {
                let elapsed = time_s - t0_s;
                if elapsed < 0.0 {
                    return 0.0;
                }
                amplitude * (elapsed + POWERLAW_EPS).powf(*index)
            }
            Self::Table(table) => table.rate_at(time_s),
            Self::Piecewise(pieces) => pieces
                .iter()
                .find(|p| p.t_start_s <= time_s && time_s < p.t_end_s)
                .map_or(0.0, |p| p.model.raw_rate(time_s)),
        }
    }
}

// ── Spec ───────────────────────────────────────────────────────────

/// A supply model plus the transport/mixing efficiency applied to it.
#[derive(Clone, Debug, PartialEq)]
pub struct SupplySpec {
    /// Functional form of the raw rate.
    pub model: SupplyModel,
    /// Fraction of produced material actually mixed into the optically
    /// thin surface layer, in [0, 1].
    pub mixing_efficiency: f64,
}

impl SupplySpec {
    /// A spec that injects nothing.
    pub fn none() -> Self {
        Self {
            model: SupplyModel::Constant { rate: 0.0 },
            mixing_efficiency: 1.0,
        }
    }

    /// Mixed production rate at `time_s`, clamped to ≥ 0 (kg m⁻² s⁻¹).
    pub fn rate_at(&self, time_s: f64) -> f64 {
        let raw = self.model.raw_rate(time_s) * self.mixing_efficiency;
        if raw.is_finite() {
            raw.max(0.0)
        } else {
            0.0
        }
    }

    /// Validate the efficiency range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonPositiveParameter`] when the mixing
    /// efficiency is outside [0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.mixing_efficiency.is_finite()
            || self.mixing_efficiency < 0.0
            || self.mixing_efficiency > 1.0
        {
            return Err(ConfigError::NonPositiveParameter {
                name: "mixing_efficiency",
                value: self.mixing_efficiency,
            });
        }
        Ok(())
    }
}
