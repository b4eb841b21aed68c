//! Run configuration, resolved inputs, and validation.
//!
//! [`SimConfig`] carries the numerical and mode switches; [`SimInputs`]
//! carries the externally resolved providers (tables, temperature,
//! supply, phase policy). [`SimConfig::validate()`] and
//! [`SimInputs::validate()`] check every structural invariant at startup,
//! before the first step runs.

use std::error::Error;
use std::fmt;

use cinder_core::{ConfigError, PhysicalParameters, StepError};
use cinder_physics::collisions::{CollisionKernel, FragmentTensor, SizeBins};
use cinder_physics::phase::{HydroEscape, PhasePolicy};
use cinder_physics::shielding::ShieldingMode;
use cinder_physics::sinks::{GasDragParams, SinkMode};
use cinder_physics::sublimation::SublimationParams;
use cinder_physics::supply::SupplySpec;
use cinder_tables::{Efficiency, Transmission};

use crate::temperature::TemperatureDriver;

// ── Modes ──────────────────────────────────────────────────────────

/// Which families of loss physics participate in the run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicsMode {
    /// All channels: blow-out, collisions, sinks.
    Combined,
    /// Sink channels only; collisions and blow-out are inert.
    SublimationOnly,
    /// Collisions and blow-out only; sink channels are inert.
    CollisionsOnly,
}

impl PhysicsMode {
    /// Whether the collision term may participate.
    pub fn collisions_allowed(&self) -> bool {
        matches!(self, Self::Combined | Self::CollisionsOnly)
    }

    /// Whether sink channels may participate.
    pub fn sinks_allowed(&self) -> bool {
        matches!(self, Self::Combined | Self::SublimationOnly)
    }

    /// Whether blow-out may participate.
    pub fn blowout_allowed(&self) -> bool {
        matches!(self, Self::Combined | Self::CollisionsOnly)
    }
}

/// What to do when a step under-resolves the blow-out timescale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubstepPolicy {
    /// Keep the coarse step; under-resolution is only reported.
    Off,
    /// Keep the coarse step but treat the blow-out term by its exact
    /// exponential decay over the step.
    AnalyticCorrection,
    /// Sub-divide the step until each sub-step resolves the blow-out
    /// timescale, re-running the full pipeline per sub-step.
    Subdivide,
}

/// Initial condition of the layer.
#[derive(Clone, Debug, PartialEq)]
pub enum InitialState {
    /// Scalar path: initial Σ (kg m⁻²).
    SurfaceDensity(f64),
    /// Multi-bin path: initial number surface densities (m⁻²).
    SizeDistribution(Vec<f64>),
}

// ── SimConfig ──────────────────────────────────────────────────────

/// Numerical and mode configuration for one run.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Outer timestep (s).
    pub dt: f64,
    /// Number of outer steps.
    pub steps: usize,
    /// Which loss families participate.
    pub physics_mode: PhysicsMode,
    /// Which sink channels participate.
    pub sink_mode: SinkMode,
    /// Master blow-out switch.
    pub blowout_enabled: bool,
    /// Blow-out timescale calibration: t_blow = χ/Ω.
    pub chi_blow: f64,
    /// β threshold for the blow-out gate and size search.
    pub beta_threshold: f64,
    /// Shielding ceiling mode.
    pub shielding: ShieldingMode,
    /// Whether the τ-driven collision timescale feeds the surface update.
    pub use_collision_timescale: bool,
    /// Under-resolution response.
    pub substep_policy: SubstepPolicy,
    /// Δt/t_blow ratio above which the policy engages.
    pub substep_threshold: f64,
    /// Relative mass-budget tolerance (fraction, default 5e-3).
    pub budget_tolerance: f64,
    /// Whether a budget violation aborts the run.
    pub strict_budget: bool,
    /// Initial condition.
    pub initial: InitialState,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 1.0e3,
            steps: 100,
            physics_mode: PhysicsMode::Combined,
            sink_mode: SinkMode::Sublimation,
            blowout_enabled: true,
            chi_blow: 1.0,
            beta_threshold: cinder_physics::radiation::BLOWOUT_BETA_THRESHOLD,
            shielding: ShieldingMode::Off,
            use_collision_timescale: true,
            substep_policy: SubstepPolicy::Subdivide,
            substep_threshold: 3.0,
            budget_tolerance: 5.0e-3,
            strict_budget: false,
            initial: InitialState::SurfaceDensity(1.0),
        }
    }
}

impl SimConfig {
    /// Validate all structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; configuration errors are
    /// fatal and never retried.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidDt { value: self.dt });
        }
        if self.steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        if !self.chi_blow.is_finite() || self.chi_blow <= 0.0 {
            return Err(ConfigError::NonPositiveParameter {
                name: "chi_blow",
                value: self.chi_blow,
            });
        }
        if !self.beta_threshold.is_finite() || self.beta_threshold <= 0.0 {
            return Err(ConfigError::NonPositiveParameter {
                name: "beta_threshold",
                value: self.beta_threshold,
            });
        }
        if !self.budget_tolerance.is_finite()
            || self.budget_tolerance <= 0.0
            || self.budget_tolerance >= 1.0
        {
            return Err(ConfigError::InvalidTolerance {
                value: self.budget_tolerance,
            });
        }
        if !self.substep_threshold.is_finite() || self.substep_threshold <= 0.0 {
            return Err(ConfigError::InvalidSubstepThreshold {
                value: self.substep_threshold,
            });
        }
        if let ShieldingMode::FixedTau1 { sigma_tau1 } = self.shielding {
            if !sigma_tau1.is_finite() || sigma_tau1 <= 0.0 {
                return Err(ConfigError::NonPositiveParameter {
                    name: "sigma_tau1",
                    value: sigma_tau1,
                });
            }
        }
        match self.physics_mode {
            PhysicsMode::SublimationOnly => {
                if self.sink_mode == SinkMode::None {
                    return Err(ConfigError::InvalidModeCombination {
                        reason: "sublimation-only physics with sink mode 'none' leaves \
                                 no active loss channel"
                            .to_string(),
                    });
                }
            }
            PhysicsMode::CollisionsOnly => {
                if self.sink_mode != SinkMode::None {
                    return Err(ConfigError::InvalidModeCombination {
                        reason: "collisions-only physics excludes sink channels; \
                                 set sink mode to 'none'"
                            .to_string(),
                    });
                }
            }
            PhysicsMode::Combined => {}
        }
        match &self.initial {
            InitialState::SurfaceDensity(sigma) => {
                if !sigma.is_finite() || *sigma < 0.0 {
                    return Err(ConfigError::InvalidInitialState {
                        reason: format!("initial surface density must be finite and ≥ 0, got {sigma}"),
                    });
                }
            }
            InitialState::SizeDistribution(bins) => {
                if bins.is_empty() {
                    return Err(ConfigError::InvalidInitialState {
                        reason: "size distribution needs at least one bin".to_string(),
                    });
                }
                if bins.iter().any(|n| !n.is_finite() || *n < 0.0) {
                    return Err(ConfigError::InvalidInitialState {
                        reason: "bin densities must be finite and ≥ 0".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ── Coagulation setup ──────────────────────────────────────────────

/// Everything the multi-bin path needs, resolved at configuration time.
#[derive(Clone, Debug)]
pub struct CoagulationSetup {
    /// Per-bin particle masses.
    pub sizes: SizeBins,
    /// Collision rate kernel.
    pub kernel: CollisionKernel,
    /// Fragment redistribution tensor.
    pub fragments: FragmentTensor,
    /// Mass fraction of the supply injected into each bin; must sum to 1.
    pub supply_weights: Vec<f64>,
    /// Relative tolerance of the per-step mass audit.
    pub audit_tol: f64,
}

impl CoagulationSetup {
    fn validate(&self) -> Result<(), ConfigError> {
        let n = self.sizes.len();
        if self.supply_weights.len() != n {
            return Err(ConfigError::InvalidTable {
                what: "supply weights",
                reason: format!("expected {n} weights, got {}", self.supply_weights.len()),
            });
        }
        if self.supply_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::InvalidTable {
                what: "supply weights",
                reason: "weights must be finite and non-negative".to_string(),
            });
        }
        let total: f64 = self.supply_weights.iter().sum();
        if (total - 1.0).abs() > 1.0e-9 && total != 0.0 {
            return Err(ConfigError::InvalidTable {
                what: "supply weights",
                reason: format!("weights must sum to 1 (or all be zero), got {total}"),
            });
        }
        if !self.audit_tol.is_finite() || self.audit_tol <= 0.0 {
            return Err(ConfigError::InvalidTolerance {
                value: self.audit_tol,
            });
        }
        Ok(())
    }
}

// ── SimInputs ──────────────────────────────────────────────────────

/// Externally resolved providers consumed by the run.
///
/// Construction of tables, the temperature source, and the phase policy
/// happens outside the core; the engine only queries them.
pub struct SimInputs {
    /// Material and orbital parameters.
    pub params: PhysicalParameters,
    /// ⟨Q_pr⟩ source.
    pub efficiency: Efficiency,
    /// Φ source.
    pub transmission: Transmission,
    /// Temperature provider (exactly one per run).
    pub temperature: TemperatureDriver,
    /// External supply of sub-blow-out material.
    pub supply: SupplySpec,
    /// Sublimation model.
    pub sublimation: SublimationParams,
    /// Gas drag model (inert unless the sink mode includes drag).
    pub gas_drag: GasDragParams,
    /// Phase policy.
    pub phase: PhasePolicy,
    /// Hydrodynamic-escape sink for vapor-dominated steps.
    pub hydro_escape: Option<HydroEscape>,
    /// Multi-bin path setup; required when the initial state is a size
    /// distribution.
    pub coagulation: Option<CoagulationSetup>,
}

impl SimInputs {
    /// Validate providers against the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self, config: &SimConfig) -> Result<(), ConfigError> {
        self.params.validate()?;
        self.supply.validate()?;
        self.temperature.validate()?;
        if let Some(setup) = &self.coagulation {
            setup.validate()?;
            if !config.physics_mode.collisions_allowed() {
                return Err(ConfigError::InvalidModeCombination {
                    reason: "a coagulation setup requires a physics mode with collisions"
                        .to_string(),
                });
            }
        }
        match &config.initial {
            InitialState::SizeDistribution(bins) => {
                let Some(setup) = &self.coagulation else {
                    return Err(ConfigError::InvalidInitialState {
                        reason: "a size-distribution initial state requires a coagulation setup"
                            .to_string(),
                    });
                };
                if bins.len() != setup.sizes.len() {
                    return Err(ConfigError::InvalidInitialState {
                        reason: format!(
                            "initial distribution has {} bins but the setup has {}",
                            bins.len(),
                            setup.sizes.len()
                        ),
                    });
                }
            }
            InitialState::SurfaceDensity(_) => {}
        }
        Ok(())
    }
}

impl fmt::Debug for SimInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimInputs")
            .field("efficiency", &self.efficiency.source_description())
            .field("transmission", &self.transmission.source_description())
            .field("temperature", &self.temperature.source_description())
            .field("coagulation", &self.coagulation.is_some())
            .finish()
    }
}

// ── RunError ───────────────────────────────────────────────────────

/// A step failure, annotated with where the run was when it happened.
#[derive(Clone, Debug, PartialEq)]
pub struct RunError {
    /// Index of the failing step (0-based).
    pub step: usize,
    /// Simulation time at the start of the failing step (s).
    pub time_s: f64,
    /// The underlying failure.
    pub source: StepError,
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} (t = {:.6e} s) failed: {}",
            self.step, self.time_s, self.source
        )
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
