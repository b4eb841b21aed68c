//! Per-step mass-budget accounting — the principal correctness oracle.
//!
//! After every accepted step the auditor compares
//! `initial + injected − lost` against the remaining mass. The relative
//! discrepancy must stay below the configured tolerance; a breach is
//! recorded and, under strict enforcement, fatal.

use cinder_core::StepError;

/// One appended entry of the mass-budget log.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MassBudgetRecord {
    /// Outer step index (0-based).
    pub step: usize,
    /// Simulation time at the end of the step (s).
    pub time_s: f64,
    /// Mass at the start of the run (kg m⁻²).
    pub mass_initial: f64,
    /// Cumulative mass injected by supply (kg m⁻²).
    pub injected: f64,
    /// Cumulative mass lost across all channels (kg m⁻²).
    pub lost: f64,
    /// Mass currently in the layer (kg m⁻²).
    pub remaining: f64,
    /// Absolute discrepancy |initial + injected − lost − remaining|.
    pub abs_err: f64,
    /// Discrepancy relative to the budget scale.
    pub rel_err: f64,
    /// Tolerance in force for this run.
    pub tolerance: f64,
    /// Whether the step passed.
    pub passed: bool,
}

/// Append-only auditor over a run's budget history.
#[derive(Clone, Debug)]
pub struct MassBudgetAuditor {
    tolerance: f64,
    strict: bool,
    log: Vec<MassBudgetRecord>,
    max_rel_err: f64,
    first_violation: Option<MassBudgetRecord>,
}

impl MassBudgetAuditor {
    /// New auditor with the given relative tolerance.
    pub fn new(tolerance: f64, strict: bool) -> Self {
        Self {
            tolerance,
            strict,
            log: Vec::new(),
            max_rel_err: 0.0,
            first_violation: None,
        }
    }

    /// Audit one accepted step.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::BudgetViolation`] only under strict
    /// enforcement; otherwise violations are recorded and the run
    /// continues.
    pub fn audit(
        &mut self,
        step: usize,
        time_s: f64,
        mass_initial: f64,
        injected: f64,
        lost: f64,
        remaining: f64,
    ) -> Result<&MassBudgetRecord, StepError> {
        let expected = mass_initial + injected - lost;
        let abs_err = (expected - remaining).abs();
        let scale = mass_initial.max(injected).max(f64::MIN_POSITIVE);
        let rel_err = abs_err / scale;
        let passed = rel_err <= self.tolerance;

        let record = MassBudgetRecord {
            step,
            time_s,
            mass_initial,
            injected,
            lost,
            remaining,
            abs_err,
            rel_err,
            tolerance: self.tolerance,
            passed,
        };
        self.max_rel_err = self.max_rel_err.max(rel_err);
        if !passed && self.first_violation.is_none() {
            self.first_violation = Some(record);
        }
        self.log.push(record);

        if !passed && self.strict {
            return Err(StepError::BudgetViolation {
                rel_err,
                tolerance: self.tolerance,
            });
        }
        Ok(self.log.last().expect("just pushed"))
    }

    /// The full append-only log, one record per accepted step.
    pub fn log(&self) -> &[MassBudgetRecord] {
        &self.log
    }

    /// Worst relative error seen so far.
    pub fn max_rel_err(&self) -> f64 {
        self.max_rel_err
    }

    /// The first violation, if any step breached tolerance.
    pub fn first_violation(&self) -> Option<&MassBudgetRecord> {
        self.first_violation.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_step_passes() {
        let mut a = MassBudgetAuditor::new(5.0e-3, true);
        let r = a.audit(0, 1.0e3, 10.0, 2.0, 3.0, 9.0).unwrap();
        assert!(r.passed);
        assert_eq!(r.abs_err, 0.0);
        assert_eq!(a.max_rel_err(), 0.0);
        assert!(a.first_violation().is_none());
    }

    #[test]
    fn lenient_mode_records_and_continues() {
        let mut a = MassBudgetAuditor::new(5.0e-3, false);
        // 10 + 0 − 0 = 10 expected, 9 remaining → 10% error.
        let r = a.audit(3, 5.0e2, 10.0, 0.0, 0.0, 9.0).unwrap();
        assert!(!r.passed);
        assert!(a.first_violation().is_some());
        assert_eq!(a.first_violation().unwrap().step, 3);
        assert!((a.max_rel_err() - 0.1).abs() < 1e-12);
        assert_eq!(a.log().len(), 1);
    }

    #[test]
    fn strict_mode_is_fatal() {
        let mut a = MassBudgetAuditor::new(5.0e-3, true);
        let err = a.audit(0, 0.0, 10.0, 0.0, 0.0, 9.0).unwrap_err();
        assert!(matches!(err, StepError::BudgetViolation { .. }));
        // The violation is still logged before the abort surfaces.
        assert_eq!(a.log().len(), 1);
    }

    #[test]
    fn first_violation_is_retained() {
        let mut a = MassBudgetAuditor::new(5.0e-3, false);
        a.audit(0, 0.0, 10.0, 0.0, 0.0, 9.0).unwrap();
        a.audit(1, 1.0, 10.0, 0.0, 0.0, 5.0).unwrap();
        assert_eq!(a.first_violation().unwrap().step, 0);
        assert!(a.max_rel_err() > 0.4);
    }

    #[test]
    fn zero_initial_mass_uses_injected_scale() {
        let mut a = MassBudgetAuditor::new(5.0e-3, false);
        let r = a.audit(0, 0.0, 0.0, 4.0, 1.0, 3.0).unwrap();
        assert!(r.passed);
        assert_eq!(r.rel_err, 0.0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn balanced_books_always_pass(
                initial in 1.0e-6f64..1.0e6,
                injected in 0.0f64..1.0e6,
                lost_fraction in 0.0f64..1.0,
            ) {
                let lost = (initial + injected) * lost_fraction;
                let remaining = initial + injected - lost;
                let mut a = MassBudgetAuditor::new(5.0e-3, true);
                let r = a.audit(0, 0.0, initial, injected, lost, remaining);
                prop_assert!(r.is_ok());
                prop_assert!(r.unwrap().passed);
            }

            #[test]
            fn discrepancy_above_tolerance_always_fails(
                initial in 1.0f64..1.0e6,
                excess in 0.011f64..10.0,
            ) {
                // Remaining is short by more than 1% of the initial mass.
                let remaining = initial * (1.0 - excess);
                let mut a = MassBudgetAuditor::new(1.0e-2, false);
                let r = a.audit(0, 0.0, initial, 0.0, 0.0, remaining).unwrap();
                prop_assert!(!r.passed);
            }
        }
    }
}
