//! Self-shielding transmission Φ(τ, ω₀, g).
//!
//! Φ scales the surface opacity down to an effective opacity
//! κ_eff = Φ·κ once the layer starts shadowing itself. The source is a
//! trilinear table over (optical depth, single-scattering albedo, asymmetry
//! parameter) or an analytic fallback.

use cinder_core::{ConfigError, TableError};

use crate::interp::{cell_fraction, cell_index, check_axis};

// ── AnalyticPhi ────────────────────────────────────────────────────

/// Closed-form transmission approximation,
///
/// ```text
/// Φ = clip(exp(-τ (1 - ω₀)) · (1 - g), 0, 1)
/// ```
///
/// absorbed fraction attenuates exponentially; forward scattering (g → 1)
/// removes the shielding benefit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnalyticPhi;

impl AnalyticPhi {
    /// Evaluate the approximation.
    pub fn evaluate(&self, tau: f64, w0: f64, g: f64) -> f64 {
        let raw = (-tau * (1.0 - w0).max(0.0)).exp() * (1.0 - g);
        raw.clamp(0.0, 1.0)
    }
}

// ── PhiTable ───────────────────────────────────────────────────────

/// Trilinear Φ table over (τ, ω₀, g).
///
/// Values are stored with τ as the slowest axis and g as the fastest:
/// `values[(it * w_axis.len() + iw) * g_axis.len() + ig]`.
#[derive(Clone, Debug, PartialEq)]
pub struct PhiTable {
    tau_axis: Vec<f64>,
    w_axis: Vec<f64>,
    g_axis: Vec<f64>,
    values: Vec<f64>,
}

impl PhiTable {
    /// Build a table, validating axes, shape, and the Φ ∈ [0, 1] range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTable`] on any structural defect.
    pub fn new(
        tau_axis: Vec<f64>,
        w_axis: Vec<f64>,
        g_axis: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        check_axis("Phi", "tau", &tau_axis)?;
        check_axis("Phi", "albedo", &w_axis)?;
        check_axis("Phi", "asymmetry", &g_axis)?;
        let expected = tau_axis.len() * w_axis.len() * g_axis.len();
        if values.len() != expected {
            return Err(ConfigError::InvalidTable {
                what: "Phi",
                reason: format!("expected {expected} values, got {}", values.len()),
            });
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0) {
            return Err(ConfigError::InvalidTable {
                what: "Phi",
                reason: "values must lie in [0, 1]".to_string(),
            });
        }
        Ok(Self {
            tau_axis,
            w_axis,
            g_axis,
            values,
        })
    }

    fn at(&self, it: usize, iw: usize, ig: usize) -> f64 {
        self.values[(it * self.w_axis.len() + iw) * self.g_axis.len() + ig]
    }

    /// Whether `(tau, w0, g)` lies inside the tabulated domain.
    pub fn contains(&self, tau: f64, w0: f64, g: f64) -> bool {
        let inside = |axis: &[f64], x: f64| {
            x >= axis[0] && x <= *axis.last().expect("validated axis")
        };
        inside(&self.tau_axis, tau) && inside(&self.w_axis, w0) && inside(&self.g_axis, g)
    }

    /// Trilinear interpolation at `(tau, w0, g)`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::OutOfDomain`] when the query point falls
    /// outside the grid.
    pub fn evaluate(&self, tau: f64, w0: f64, g: f64) -> Result<f64, TableError> {
        let check = |what: &'static str, axis: &[f64], x: f64| -> Result<(), TableError> {
            let max = *axis.last().expect("validated axis");
            if x < axis[0] || x > max {
                Err(TableError::OutOfDomain {
                    what,
                    value: x,
                    min: axis[0],
                    max,
                })
            } else {
                Ok(())
            }
        };
        check("Phi tau", &self.tau_axis, tau)?;
        check("Phi albedo", &self.w_axis, w0)?;
        check("Phi asymmetry", &self.g_axis, g)?;

        let it = cell_index(&self.tau_axis, tau);
        let iw = cell_index(&self.w_axis, w0);
        let ig = cell_index(&self.g_axis, g);
        let xd = cell_fraction(&self.tau_axis, it, tau);
        let yd = cell_fraction(&self.w_axis, iw, w0);
        let zd = cell_fraction(&self.g_axis, ig, g);

        let c00 = self.at(it, iw, ig) * (1.0 - xd) + self.at(it + 1, iw, ig) * xd;
        let c01 = self.at(it, iw, ig + 1) * (1.0 - xd) + self.at(it + 1, iw, ig + 1) * xd;
        let c10 = self.at(it, iw + 1, ig) * (1.0 - xd) + self.at(it + 1, iw + 1, ig) * xd;
        let c11 =
            self.at(it, iw + 1, ig + 1) * (1.0 - xd) + self.at(it + 1, iw + 1, ig + 1) * xd;
        let c0 = c00 * (1.0 - yd) + c10 * yd;
        let c1 = c01 * (1.0 - yd) + c11 * yd;
        Ok(c0 * (1.0 - zd) + c1 * zd)
    }
}

// ── Transmission ───────────────────────────────────────────────────

/// The resolved Φ source for a run.
#[derive(Clone, Debug)]
pub enum Transmission {
    /// Tabulated values; out-of-domain queries use `fallback` when present.
    Tabulated {
        /// The trilinear lookup table.
        table: PhiTable,
        /// Analytic approximation for queries outside the table domain.
        fallback: Option<AnalyticPhi>,
    },
    /// Analytic approximation everywhere.
    Analytic(AnalyticPhi),
}

impl Transmission {
    /// Evaluate Φ at `(tau, w0, g)`, always within [0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`TableError::OutOfDomain`] only for the tabulated variant
    /// with no fallback.
    pub fn evaluate(&self, tau: f64, w0: f64, g: f64) -> Result<f64, TableError> {
        let phi = match self {
            Self::Tabulated { table, fallback } => {
                if table.contains(tau, w0, g) {
                    table.evaluate(tau, w0, g)?
                } else if let Some(approx) = fallback {
                    approx.evaluate(tau, w0, g)
                } else {
                    table.evaluate(tau, w0, g)?
                }
            }
            Self::Analytic(approx) => approx.evaluate(tau, w0, g),
        };
        Ok(phi.clamp(0.0, 1.0))
    }

    /// Short provenance tag for the summary.
    pub fn source_description(&self) -> &'static str {
        match self {
            Self::Tabulated {
                fallback: Some(_), ..
            } => "phi:table+analytic-fallback",
            Self::Tabulated { fallback: None, .. } => "phi:table",
            Self::Analytic(_) => "phi:analytic",
        }
    }
}
