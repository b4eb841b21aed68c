//! Planck-mean radiation-pressure efficiency ⟨Q_pr⟩(s, T).
//!
//! The efficiency source is selected once at configuration time: either a
//! bilinear table over (grain size, temperature), optionally backed by the
//! analytic fallback for out-of-domain queries, or the fallback alone.

use cinder_core::constants::WIEN_B;
use cinder_core::{ConfigError, TableError};

use crate::interp::{cell_fraction, cell_index, check_axis};

// ── AnalyticQpr ────────────────────────────────────────────────────

/// Closed-form ⟨Q_pr⟩ approximation: a smooth Rayleigh-to-geometric
/// transition in the size parameter x = 2πs/λ_peak(T),
///
/// ```text
/// Q = x⁴ / (1 + x⁴)
/// ```
///
/// with λ_peak from Wien's displacement law. Valid for any positive size
/// and temperature, which is what makes it usable as a fallback.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnalyticQpr;

impl AnalyticQpr {
    /// Evaluate the approximation at grain size `s` (m), temperature `t_k` (K).
    pub fn evaluate(&self, s: f64, t_k: f64) -> f64 {
        let lambda = WIEN_B / t_k.max(1.0);
        let x = 2.0 * std::f64::consts::PI * s / lambda;
        let x4 = x.powi(4);
        x4 / (1.0 + x4)
    }
}

// ── QprTable ───────────────────────────────────────────────────────

/// Bilinear ⟨Q_pr⟩ table over a (size, temperature) grid.
///
/// Values are stored row-major with temperature as the slow axis:
/// `values[j * s_axis.len() + i]` is the efficiency at `(s_axis[i],
/// t_axis[j])`.
#[derive(Clone, Debug, PartialEq)]
pub struct QprTable {
    s_axis: Vec<f64>,
    t_axis: Vec<f64>,
    values: Vec<f64>,
}

impl QprTable {
    /// Build a table, validating axes and value shape.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTable`] if either axis is too short,
    /// unsorted, or non-finite, if the value count does not match the grid,
    /// or if any value is negative or non-finite.
    pub fn new(s_axis: Vec<f64>, t_axis: Vec<f64>, values: Vec<f64>) -> Result<Self, ConfigError> {
        check_axis("Q_pr", "size", &s_axis)?;
        check_axis("Q_pr", "temperature", &t_axis)?;
        if values.len() != s_axis.len() * t_axis.len() {
            return Err(ConfigError::InvalidTable {
                what: "Q_pr",
                reason: format!(
                    "expected {} values for a {}x{} grid, got {}",
                    s_axis.len() * t_axis.len(),
                    t_axis.len(),
                    s_axis.len(),
                    values.len()
                ),
            });
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::InvalidTable {
                what: "Q_pr",
                reason: "values must be finite and non-negative".to_string(),
            });
        }
        Ok(Self {
            s_axis,
            t_axis,
            values,
        })
    }

    /// Whether `(s, t_k)` lies inside the tabulated domain.
    pub fn contains(&self, s: f64, t_k: f64) -> bool {
        s >= self.s_axis[0]
            && s <= *self.s_axis.last().expect("validated axis")
            && t_k >= self.t_axis[0]
            && t_k <= *self.t_axis.last().expect("validated axis")
    }

    /// Bilinear interpolation at `(s, t_k)`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::OutOfDomain`] when the query point falls
    /// outside the grid.
    pub fn evaluate(&self, s: f64, t_k: f64) -> Result<f64, TableError> {
        if s < self.s_axis[0] || s > *self.s_axis.last().expect("validated axis") {
            return Err(TableError::OutOfDomain {
                what: "Q_pr size",
                value: s,
                min: self.s_axis[0],
                max: *self.s_axis.last().expect("validated axis"),
            });
        }
        if t_k < self.t_axis[0] || t_k > *self.t_axis.last().expect("validated axis") {
            return Err(TableError::OutOfDomain {
                what: "Q_pr temperature",
                value: t_k,
                min: self.t_axis[0],
                max: *self.t_axis.last().expect("validated axis"),
            });
        }
        let i = cell_index(&self.s_axis, s);
        let j = cell_index(&self.t_axis, t_k);
        let ws = cell_fraction(&self.s_axis, i, s);
        let wt = cell_fraction(&self.t_axis, j, t_k);
        let cols = self.s_axis.len();
        let q00 = self.values[j * cols + i];
        let q01 = self.values[j * cols + i + 1];
        let q10 = self.values[(j + 1) * cols + i];
        let q11 = self.values[(j + 1) * cols + i + 1];
        let lo = q00 * (1.0 - ws) + q01 * ws;
        let hi = q10 * (1.0 - ws) + q11 * ws;
        Ok(lo * (1.0 - wt) + hi * wt)
    }
}

// ── Efficiency ─────────────────────────────────────────────────────

/// The resolved ⟨Q_pr⟩ source for a run.
#[derive(Clone, Debug)]
pub enum Efficiency {
    /// Tabulated values; out-of-domain queries use `fallback` when present,
    /// otherwise fail.
    Tabulated {
        /// The bilinear lookup table.
        table: QprTable,
        /// Analytic approximation for queries outside the table domain.
        fallback: Option<AnalyticQpr>,
    },
    /// Analytic approximation everywhere.
    Analytic(AnalyticQpr),
}

impl Efficiency {
    /// Evaluate ⟨Q_pr⟩ at `(s, t_k)`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::OutOfDomain`] only for the tabulated variant
    /// with no fallback.
    pub fn evaluate(&self, s: f64, t_k: f64) -> Result<f64, TableError> {
        match self {
            Self::Tabulated { table, fallback } => {
                if table.contains(s, t_k) {
                    table.evaluate(s, t_k)
                } else if let Some(approx) = fallback {
                    Ok(approx.evaluate(s, t_k))
                } else {
                    table.evaluate(s, t_k)
                }
            }
            Self::Analytic(approx) => Ok(approx.evaluate(s, t_k)),
        }
    }

    /// Short provenance tag for the summary.
    pub fn source_description(&self) -> &'static str {
        match self {
            Self::Tabulated {
                fallback: Some(_), ..
            } => "qpr:table+analytic-fallback",
            Self::Tabulated { fallback: None, .. } => "qpr:table",
            Self::Analytic(_) => "qpr:analytic",
        }
    }
}
