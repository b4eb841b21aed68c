//! Adaptive response to under-resolved blow-out.
//!
//! When Δt/t_blow exceeds the configured ratio the coarse step would let
//! more than a few e-foldings of blow-out decay pass unresolved. The
//! policy either corrects the coarse step analytically or sub-divides it
//! so each sub-step stays under the ratio.

use crate::config::SubstepPolicy;

/// Resolved sub-stepping decision for one outer step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubstepPlan {
    /// Number of sub-steps the pipeline will run (≥ 1).
    pub n_substeps: usize,
    /// Duration of each sub-step (s).
    pub dt_sub: f64,
    /// The outer-step ratio Δt/t_blow that triggered the decision.
    pub ratio: f64,
    /// Whether the analytic exponential treatment replaces the implicit
    /// blow-out term on each (sub-)step.
    pub analytic_correction: bool,
}

/// Decide how to resolve one outer step of size `dt`.
///
/// `t_blow` is the blow-out timescale in force; an infinite or
/// non-positive timescale (blow-out inert) always yields a single plain
/// sub-step.
pub fn plan_substeps(dt: f64, t_blow: f64, policy: SubstepPolicy, threshold: f64) -> SubstepPlan {
    let ratio = if t_blow.is_finite() && t_blow > 0.0 {
        dt / t_blow
    } else {
        0.0
    };

    let plain = SubstepPlan {
        n_substeps: 1,
        dt_sub: dt,
        ratio,
        analytic_correction: false,
    };

    if ratio <= threshold {
        return plain;
    }
    match policy {
        SubstepPolicy::Off => plain,
        SubstepPolicy::AnalyticCorrection => SubstepPlan {
            analytic_correction: true,
            ..plain
        },
        SubstepPolicy::Subdivide => {
            let n = (ratio / threshold).ceil() as usize;
            let n = n.max(1);
            SubstepPlan {
                n_substeps: n,
                dt_sub: dt / n as f64,
                ratio,
                analytic_correction: false,
            }
        }
    }
}
