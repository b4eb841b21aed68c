//! The run driver: exclusive owner of the simulation state.
//!
//! [`Simulation`] validates its configuration once, then advances the
//! state one outer step at a time. Each step plans its sub-step schedule,
//! runs the physics pipeline per sub-step, accumulates losses into the
//! ledger, audits the mass budget, and emits one [`StepRecord`].
//!
//! The driver is strictly sequential; it never suspends mid-step and
//! nothing else holds a mutable reference to the state. Records can
//! optionally be streamed through a channel as they are produced — a
//! disconnected receiver never blocks or fails the run.

use cinder_core::constants::{C_LIGHT, G, R_GAS, SIGMA_SB};
use cinder_core::{ConfigError, SimulationState, StepError};
use cinder_physics::radiation::{resolve_radiation, RadiationResolution};
use crossbeam_channel::Sender;

use crate::budget::{MassBudgetAuditor, MassBudgetRecord};
use crate::config::{InitialState, RunError, SimConfig, SimInputs};
use crate::record::{Provenance, RunSummary, StepRecord};
use crate::step::advance_substep;
use crate::substep::plan_substeps;

/// Everything a completed run hands to external writers.
#[derive(Clone, Debug)]
pub struct RunOutput {
    /// One record per accepted outer step.
    pub records: Vec<StepRecord>,
    /// One mass-budget record per accepted outer step.
    pub budget_log: Vec<MassBudgetRecord>,
    /// Final summary.
    pub summary: RunSummary,
    /// Final simulation state.
    pub final_state: SimulationState,
}

/// A single run of the surface-layer model.
pub struct Simulation {
    config: SimConfig,
    inputs: SimInputs,
    state: SimulationState,
    auditor: MassBudgetAuditor,
    mass_initial: f64,
    injected_total: f64,
    step_index: usize,
    records: Vec<StepRecord>,
    sender: Option<Sender<StepRecord>>,
    time_to_99_loss: Option<f64>,
    initial_radiation: RadiationResolution,
}

impl Simulation {
    /// Validate configuration and inputs and build a ready-to-step run.
    ///
    /// # Errors
    ///
    /// Any structural defect — including an efficiency source that cannot
    /// answer at the initial temperature — is a fatal [`ConfigError`].
    pub fn new(config: SimConfig, inputs: SimInputs) -> Result<Self, ConfigError> {
        config.validate()?;
        inputs.validate(&config)?;

        let state = match &config.initial {
            InitialState::SurfaceDensity(sigma) => SimulationState::new(*sigma),
            InitialState::SizeDistribution(bins) => {
                let setup = inputs
                    .coagulation
                    .as_ref()
                    .expect("validated: distribution implies setup");
                let sigma = setup.sizes.total_mass(bins);
                SimulationState::with_bins(sigma, bins.clone())
            }
        };
        let mass_initial = state.sigma_surf;

        // Run-start blow-out classification. A provider that cannot answer
        // here can never answer, so surface it as a configuration error.
        let t0 = inputs.temperature.at(0.0).map_err(|e| match e {
            StepError::InvalidTemperature { value } => ConfigError::NonPositiveParameter {
                name: "temperature",
                value,
            },
            other => ConfigError::InvalidTable {
                what: "temperature",
                reason: other.to_string(),
            },
        })?;
        let initial_radiation =
            resolve_radiation(t0, &inputs.efficiency, &inputs.params, config.beta_threshold)
                .map_err(|e| ConfigError::InvalidTable {
                    what: "Q_pr",
                    reason: e.to_string(),
                })?;

        let auditor = MassBudgetAuditor::new(config.budget_tolerance, config.strict_budget);
        Ok(Self {
            config,
            inputs,
            state,
            auditor,
            mass_initial,
            injected_total: 0.0,
            step_index: 0,
            records: Vec::new(),
            sender: None,
            time_to_99_loss: None,
            initial_radiation,
        })
    }

    /// Stream every subsequent record through `sender` as it is produced.
    pub fn set_record_sender(&mut self, sender: Sender<StepRecord>) {
        self.sender = Some(sender);
    }

    /// The current state (read-only; the driver owns mutation).
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Records accepted so far.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// The mass-budget log so far.
    pub fn budget_log(&self) -> &[MassBudgetRecord] {
        self.auditor.log()
    }

    /// Advance one outer step.
    ///
    /// # Errors
    ///
    /// Returns a [`RunError`] carrying the step index and start time on
    /// any domain failure, or on a budget violation under strict
    /// enforcement. The run should be discarded after an error.
    pub fn step(&mut self) -> Result<&StepRecord, RunError> {
        let step = self.step_index;
        let t_start = self.state.time_s;
        let dt = self.config.dt;
        let fail = |source: StepError| RunError {
            step,
            time_s: t_start,
            source,
        };

        // Plan the sub-step schedule against the blow-out timescale.
        let omega = self.inputs.params.omega();
        let blowout_possible =
            self.config.blowout_enabled && self.config.physics_mode.blowout_allowed();
        let t_blow_plan = if blowout_possible {
            self.config.chi_blow / omega
        } else {
            f64::INFINITY
        };
        let plan = plan_substeps(
            dt,
            t_blow_plan,
            self.config.substep_policy,
            self.config.substep_threshold,
        );

        let mut sigma = self.state.sigma_surf;
        let mut bins = self.state.bins.clone();
        let mut time_sub = t_start;
        let mut last = None;
        let mut injected_step = 0.0;
        for _ in 0..plan.n_substeps {
            let outcome = advance_substep(
                &self.config,
                &self.inputs,
                sigma,
                bins.as_deref(),
                time_sub,
                plan.dt_sub,
                plan.analytic_correction,
            )
            .map_err(fail)?;
            sigma = outcome.sigma_surf;
            bins = outcome.bins.clone();
            injected_step += outcome.injected_mass;
            for &(channel, mass) in &outcome.losses {
                self.state.losses.add(channel, mass);
            }
            time_sub += plan.dt_sub;
            last = Some(outcome);
        }
        let last = last.expect("plan always has at least one sub-step");

        // Commit the step.
        self.state.sigma_surf = sigma;
        self.state.bins = bins;
        self.state.time_s = t_start + dt;
        self.injected_total += injected_step;

        // Audit the budget on the committed state.
        let lost = self.state.losses.total();
        self.auditor
            .audit(
                step,
                self.state.time_s,
                self.mass_initial,
                self.injected_total,
                lost,
                self.state.sigma_surf,
            )
            .map_err(fail)?;

        let supplied = self.mass_initial + self.injected_total;
        if self.time_to_99_loss.is_none() && supplied > 0.0 && lost >= 0.99 * supplied {
            self.time_to_99_loss = Some(self.state.time_s);
        }

        let record = StepRecord {
            step,
            time_s: self.state.time_s,
            sigma_surf: self.state.sigma_surf,
            outflux: last.outflux,
            sink_flux: last.sink_flux,
            losses: self.state.losses.iter().collect(),
            phase: last.phase.phase,
            f_vap: last.phase.f_vap,
            tau: last.rates.tau,
            beta_at_s_min: last.radiation.beta_at_s_min,
            gate_factor: last.rates.gate_factor,
            dt_over_t_blow: plan.ratio,
            n_substeps: plan.n_substeps,
            fast_blowout_corrected: last.corrected,
            bins: self.state.bins.clone(),
        };
        if let Some(sender) = &self.sender {
            // A gone receiver must not take the run down with it.
            let _ = sender.send(record.clone());
        }
        self.records.push(record);
        self.step_index += 1;
        Ok(self.records.last().expect("just pushed"))
    }

    /// Run all configured steps and produce the final output.
    ///
    /// # Errors
    ///
    /// Propagates the first [`RunError`]; in-progress state is discarded
    /// with the driver.
    pub fn run(mut self) -> Result<RunOutput, RunError> {
        for _ in 0..self.config.steps {
            self.step()?;
        }
        Ok(self.finish())
    }

    /// Build the final output from the current state without stepping
    /// further.
    pub fn finish(self) -> RunOutput {
        let losses: Vec<_> = self.state.losses.iter().collect();
        let total_lost = self.state.losses.total();
        let params = &self.inputs.params;
        let summary = RunSummary {
            losses,
            total_lost,
            blowout_case_initial: self.initial_radiation.case,
            beta_at_s_min_initial: self.initial_radiation.beta_at_s_min,
            time_to_99_loss_s: self.time_to_99_loss,
            budget_max_rel_err: self.auditor.max_rel_err(),
            budget_violation: self.auditor.first_violation().copied(),
            provenance: Provenance {
                efficiency: self.inputs.efficiency.source_description(),
                transmission: self.inputs.transmission.source_description(),
                vapor_pressure: self.inputs.sublimation.vapor_pressure.source_description(),
                temperature: self.inputs.temperature.source_description(),
                constants: vec![
                    ("G", G),
                    ("c", C_LIGHT),
                    ("sigma_sb", SIGMA_SB),
                    ("R_gas", R_GAS),
                    ("m_central", params.m_central),
                    ("r_central", params.r_central),
                    ("orbit_radius", params.orbit_radius),
                    ("rho_grain", params.rho_grain),
                ],
            },
        };
        RunOutput {
            records: self.records,
            budget_log: self.auditor.log().to_vec(),
            summary,
            final_state: self.state,
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("step", &self.step_index)
            .field("time_s", &self.state.time_s)
            .field("sigma_surf", &self.state.sigma_surf)
            .field("mass_initial", &self.mass_initial)
            .finish()
    }
}
