//! Saturation vapor pressure P_sat(T).
//!
//! Either a Clausius-type two-parameter fit or a tabulated curve. The
//! tabulated variant clamps at its temperature edges rather than erroring:
//! saturation pressure outside the measured range is dominated by the
//! nearest endpoint in every regime this engine reaches.

use cinder_core::ConfigError;

use crate::interp::{check_axis, lerp_clamped};

/// 1D saturation-pressure table over temperature.
#[derive(Clone, Debug, PartialEq)]
pub struct PsatTable {
    t_axis: Vec<f64>,
    p_values: Vec<f64>,
}

impl PsatTable {
    /// Build a table, validating the axis and pressure values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTable`] if the axis is defective or
    /// any pressure is negative or non-finite.
    pub fn new(t_axis: Vec<f64>, p_values: Vec<f64>) -> Result<Self, ConfigError> {
        check_axis("P_sat", "temperature", &t_axis)?;
        if p_values.len() != t_axis.len() {
            return Err(ConfigError::InvalidTable {
                what: "P_sat",
                reason: format!(
                    "expected {} pressures, got {}",
                    t_axis.len(),
                    p_values.len()
                ),
            });
        }
        if p_values.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ConfigError::InvalidTable {
                what: "P_sat",
                reason: "pressures must be finite and non-negative".to_string(),
            });
        }
        Ok(Self { t_axis, p_values })
    }

    /// Linear interpolation in T, clamped at both ends (Pa).
    pub fn evaluate(&self, t_k: f64) -> f64 {
        lerp_clamped(&self.t_axis, &self.p_values, t_k)
    }
}

/// The resolved saturation-pressure source for a run.
#[derive(Clone, Debug, PartialEq)]
pub enum VaporPressure {
    /// Clausius-type fit: log10(P_sat / Pa) = a − b/T.
    Clausius {
        /// Intercept coefficient a.
        a: f64,
        /// Slope coefficient b (K).
        b: f64,
    },
    /// Tabulated curve, clamped at the temperature edges.
    Tabulated(PsatTable),
}

impl VaporPressure {
    /// Saturation pressure at `t_k` (Pa).
    pub fn evaluate(&self, t_k: f64) -> f64 {
        match self {
            Self::Clausius { a, b } => 10.0_f64.powf(a - b / t_k.max(1.0)),
            Self::Tabulated(table) => table.evaluate(t_k),
        }
    }

    /// Short provenance tag for the summary.
    pub fn source_description(&self) -> &'static str {
        match self {
            Self::Clausius { .. } => "psat:clausius-fit",
            Self::Tabulated(_) => "psat:table",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clausius_is_monotone_increasing() {
        let v = VaporPressure::Clausius { a: 13.0, b: 2.5e4 };
        let p1 = v.evaluate(1500.0);
        let p2 = v.evaluate(2000.0);
        assert!(p2 > p1);
        assert!(p1 > 0.0);
    }

    #[test]
    fn table_clamps_at_edges() {
        let t = PsatTable::new(vec![1000.0, 2000.0], vec![1.0, 100.0]).unwrap();
        let v = VaporPressure::Tabulated(t);
        assert_eq!(v.evaluate(500.0), 1.0);
        assert_eq!(v.evaluate(3000.0), 100.0);
        assert!((v.evaluate(1500.0) - 50.5).abs() < 1e-12);
    }

    #[test]
    fn table_rejects_negative_pressure() {
        assert!(PsatTable::new(vec![1000.0, 2000.0], vec![-1.0, 1.0]).is_err());
    }

    #[test]
    fn lookup_is_idempotent() {
        let v = VaporPressure::Clausius { a: 13.0, b: 2.5e4 };
        assert_eq!(v.evaluate(1777.0), v.evaluate(1777.0));
    }
}
