//! Error types for the Cinder engine.
//!
//! Three layers, matching how failures surface at runtime:
//!
//! - [`ConfigError`] — structural problems detected at startup. Fatal,
//!   never retried.
//! - [`TableError`] — a lookup table could not answer a query. Wrapped
//!   into [`StepError::Table`] by callers that have no fallback.
//! - [`StepError`] — a physics computation failed mid-run. Fatal for the
//!   run; the driver attaches the step index and simulation time.

use std::error::Error;
use std::fmt;

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during configuration validation, before any stepping.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// A required physical parameter is missing or non-positive.
    NonPositiveParameter {
        /// Parameter name as exposed in the configuration.
        name: &'static str,
        /// The offending value.
        value: f64,
    },
    /// The timestep is NaN, infinite, zero, or negative.
    InvalidDt {
        /// The invalid value.
        value: f64,
    },
    /// The requested step count is zero.
    ZeroSteps,
    /// The mass-budget tolerance is not a finite positive fraction.
    InvalidTolerance {
        /// The invalid value.
        value: f64,
    },
    /// The sub-step trigger ratio is not finite and positive.
    InvalidSubstepThreshold {
        /// The invalid value.
        value: f64,
    },
    /// No radiation-efficiency source is available (no table, no fallback).
    NoEfficiencySource,
    /// A lookup table failed structural validation.
    InvalidTable {
        /// Which table.
        what: &'static str,
        /// Description of the defect.
        reason: String,
    },
    /// The selected mode combination can never produce a meaningful run.
    InvalidModeCombination {
        /// Description of the conflict.
        reason: String,
    },
    /// The initial state is unusable (negative density, empty bins, ...).
    InvalidInitialState {
        /// Description of the defect.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveParameter { name, value } => {
                write!(f, "parameter '{name}' must be positive, got {value}")
            }
            Self::InvalidDt { value } => {
                write!(f, "dt must be finite and positive, got {value}")
            }
            Self::ZeroSteps => write!(f, "step count must be at least 1"),
            Self::InvalidTolerance { value } => {
                write!(
                    f,
                    "mass-budget tolerance must be a finite positive fraction, got {value}"
                )
            }
            Self::InvalidSubstepThreshold { value } => {
                write!(
                    f,
                    "sub-step trigger ratio must be finite and positive, got {value}"
                )
            }
            Self::NoEfficiencySource => {
                write!(f, "no radiation-efficiency table or analytic fallback configured")
            }
            Self::InvalidTable { what, reason } => {
                write!(f, "invalid {what} table: {reason}")
            }
            Self::InvalidModeCombination { reason } => {
                write!(f, "invalid mode combination: {reason}")
            }
            Self::InvalidInitialState { reason } => {
                write!(f, "invalid initial state: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

// ── TableError ─────────────────────────────────────────────────────

/// Errors from pure lookup-table queries.
#[derive(Clone, Debug, PartialEq)]
pub enum TableError {
    /// The query point lies outside the table domain and no fallback exists.
    OutOfDomain {
        /// Which table.
        what: &'static str,
        /// The coordinate that fell outside.
        value: f64,
        /// Lower edge of the valid domain for that coordinate.
        min: f64,
        /// Upper edge of the valid domain for that coordinate.
        max: f64,
    },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfDomain {
                what,
                value,
                min,
                max,
            } => {
                write!(
                    f,
                    "{what} lookup at {value:e} outside valid domain [{min:e}, {max:e}]"
                )
            }
        }
    }
}

impl Error for TableError {}

// ── StepError ──────────────────────────────────────────────────────

/// Errors from a single physics step.
///
/// The run driver wraps these with the step index and simulation time
/// before surfacing them to the caller.
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// A lookup table could not answer and no fallback was configured.
    Table(TableError),
    /// The blow-out size root search could not bracket a threshold crossing.
    BracketFailed {
        /// The β threshold that was searched for.
        threshold: f64,
        /// Maximum β found over the search grid.
        beta_max: f64,
    },
    /// The temperature provider produced an unusable value.
    InvalidTemperature {
        /// The offending value.
        value: f64,
    },
    /// The coagulation mass audit found the kernel and fragment tensor
    /// inconsistent with the realized mass change.
    KernelInconsistency {
        /// Relative mass mismatch of the bin update.
        rel_err: f64,
        /// Tolerance that was exceeded.
        tolerance: f64,
    },
    /// Mass-budget discrepancy exceeded tolerance under strict enforcement.
    BudgetViolation {
        /// Relative discrepancy of the step.
        rel_err: f64,
        /// Configured tolerance.
        tolerance: f64,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(e) => write!(f, "table lookup failed: {e}"),
            Self::BracketFailed {
                threshold,
                beta_max,
            } => {
                write!(
                    f,
                    "blow-out search could not bracket the β={threshold} crossing \
                     (max β over grid: {beta_max:.4})"
                )
            }
            Self::InvalidTemperature { value } => {
                write!(f, "temperature provider returned unusable value {value}")
            }
            Self::KernelInconsistency { rel_err, tolerance } => {
                write!(
                    f,
                    "coagulation mass audit failed: relative error {rel_err:e} \
                     exceeds tolerance {tolerance:e}"
                )
            }
            Self::BudgetViolation { rel_err, tolerance } => {
                write!(
                    f,
                    "mass budget violated: relative error {rel_err:e} \
                     exceeds tolerance {tolerance:e}"
                )
            }
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Table(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TableError> for StepError {
    fn from(e: TableError) -> Self {
        Self::Table(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let e = ConfigError::NonPositiveParameter {
            name: "rho_grain",
            value: -1.0,
        };
        let msg = format!("{e}");
        assert!(msg.contains("rho_grain"));
        assert!(msg.contains("-1"));
    }

    #[test]
    fn table_error_wraps_into_step_error() {
        let t = TableError::OutOfDomain {
            what: "Q_pr",
            value: 1.0,
            min: 0.0,
            max: 0.5,
        };
        let s: StepError = t.clone().into();
        match &s {
            StepError::Table(inner) => assert_eq!(inner, &t),
            other => panic!("expected Table, got {other:?}"),
        }
        assert!(s.source().is_some());
    }

    #[test]
    fn bracket_failed_display_mentions_threshold() {
        let e = StepError::BracketFailed {
            threshold: 0.5,
            beta_max: 0.31,
        };
        let msg = format!("{e}");
        assert!(msg.contains("0.5"));
        assert!(msg.contains("0.31"));
    }
}
