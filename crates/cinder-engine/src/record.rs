//! Per-step records and the final run summary.
//!
//! These are the engine's entire observable surface: external writers and
//! reporters consume [`StepRecord`]s (optionally streamed through a
//! channel as they are produced) and one [`RunSummary`] at the end.

use cinder_core::LossChannel;
use cinder_physics::phase::Phase;
use cinder_physics::radiation::BlowoutCase;

use crate::budget::MassBudgetRecord;

/// Everything an external writer needs about one accepted outer step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepRecord {
    /// Outer step index (0-based).
    pub step: usize,
    /// Simulation time at the end of the step (s).
    pub time_s: f64,
    /// Surface density after the step (kg m⁻²).
    pub sigma_surf: f64,
    /// Blow-out outflux at the end of the step (kg m⁻² s⁻¹).
    pub outflux: f64,
    /// Sink flux at the end of the step (kg m⁻² s⁻¹).
    pub sink_flux: f64,
    /// Cumulative losses by channel, in ledger order.
    pub losses: Vec<(LossChannel, f64)>,
    /// Phase state of the final sub-step.
    pub phase: Phase,
    /// Vapor fraction of the final sub-step.
    pub f_vap: f64,
    /// Vertical optical depth at the end of the step.
    pub tau: f64,
    /// β at the minimum grain size for this step's temperature.
    pub beta_at_s_min: f64,
    /// Blow-out gate factor applied this step, in [0, 1].
    pub gate_factor: f64,
    /// Ratio Δt/t_blow of the outer step.
    pub dt_over_t_blow: f64,
    /// Number of sub-steps the pipeline actually ran.
    pub n_substeps: usize,
    /// Whether the analytic fast-blow-out treatment was applied.
    pub fast_blowout_corrected: bool,
    /// Per-bin number densities when the coagulation path is active.
    pub bins: Option<Vec<f64>>,
}

/// Provenance of the resolved inputs, carried into the summary so a run
/// is reproducible from its outputs.
#[derive(Clone, Debug, PartialEq)]
pub struct Provenance {
    /// ⟨Q_pr⟩ source tag.
    pub efficiency: &'static str,
    /// Φ source tag.
    pub transmission: &'static str,
    /// P_sat source tag.
    pub vapor_pressure: &'static str,
    /// Temperature provider tag.
    pub temperature: &'static str,
    /// Resolved physical constants: `(name, value)`.
    pub constants: Vec<(&'static str, f64)>,
}

/// Final summary of a completed run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    /// Total mass lost per channel (kg m⁻²).
    pub losses: Vec<(LossChannel, f64)>,
    /// Sum over channels (kg m⁻²).
    pub total_lost: f64,
    /// Run-start blow-out classification at the minimum grain size.
    pub blowout_case_initial: BlowoutCase,
    /// β at the minimum size at run start.
    pub beta_at_s_min_initial: f64,
    /// First time at which cumulative loss reached 99% of the initial
    /// mass plus injection (s); `None` if never reached.
    pub time_to_99_loss_s: Option<f64>,
    /// Worst relative mass-budget error over the run.
    pub budget_max_rel_err: f64,
    /// First budget violation, if any.
    pub budget_violation: Option<MassBudgetRecord>,
    /// Provenance of resolved inputs.
    pub provenance: Provenance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_total_matches_channel_sum() {
        let summary = RunSummary {
            losses: vec![
                (LossChannel::Blowout, 3.0),
                (LossChannel::Sublimation, 1.0),
            ],
            total_lost: 4.0,
            blowout_case_initial: BlowoutCase::NoBlowout { beta_max: 0.1 },
            beta_at_s_min_initial: 0.1,
            time_to_99_loss_s: None,
            budget_max_rel_err: 0.0,
            budget_violation: None,
            provenance: Provenance {
                efficiency: "qpr:analytic",
                transmission: "phi:analytic",
                vapor_pressure: "psat:clausius-fit",
                temperature: "temperature:constant",
                constants: vec![],
            },
        };
        let sum: f64 = summary.losses.iter().map(|(_, v)| v).sum();
        assert_eq!(sum, summary.total_lost);
    }
}
