//! Cinder: time evolution of a thin dust surface layer orbiting a planet
//! immediately after a giant impact.
//!
//! The model tracks competing mass-loss channels — radiation-pressure
//! blow-out, collisional grinding, sublimation, gas drag, and
//! hydrodynamic escape — through a per-step implicit integration engine
//! with a verifiable mass budget. This is the top-level facade crate
//! re-exporting the public API from the Cinder sub-crates; for most
//! users, adding `cinder` as a single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use cinder::prelude::*;
//!
//! let params = PhysicalParameters {
//!     m_central: 6.4171e23,
//!     r_central: 3.3895e6,
//!     orbit_radius: 1.0e7,
//!     rho_grain: 3000.0,
//!     molar_mass: 0.0601,
//!     alpha_evap: 0.1,
//!     opacity: 0.5,
//!     s_min: 1.0e-7,
//!     s_ref: 1.0e-6,
//! };
//! let inputs = SimInputs {
//!     params,
//!     efficiency: Efficiency::Analytic(AnalyticQpr),
//!     transmission: Transmission::Analytic(AnalyticPhi),
//!     temperature: TemperatureDriver::Constant(2000.0),
//!     supply: SupplySpec::none(),
//!     sublimation: SublimationParams::clausius(13.2, 2.66e4),
//!     gas_drag: GasDragParams::default(),
//!     phase: PhasePolicy::Ramp(PhaseThresholds::default()),
//!     hydro_escape: Some(HydroEscape::default()),
//!     coagulation: None,
//! };
//! let config = SimConfig {
//!     steps: 5,
//!     ..SimConfig::default()
//! };
//!
//! let output = Simulation::new(config, inputs).unwrap().run().unwrap();
//! assert_eq!(output.records.len(), 5);
//! assert!(output.budget_log.iter().all(|b| b.passed));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cinder-core` | State, parameters, constants, errors |
//! | [`tables`] | `cinder-tables` | ⟨Q_pr⟩, Φ, and P_sat lookup sources |
//! | [`physics`] | `cinder-physics` | Leaf physics components |
//! | [`engine`] | `cinder-engine` | Configuration, pipeline, run driver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core state, parameters, constants, and errors (`cinder-core`).
pub use cinder_core as types;

/// Lookup-table sources for ⟨Q_pr⟩, Φ, and P_sat (`cinder-tables`).
pub use cinder_tables as tables;

/// Leaf physics components (`cinder-physics`).
///
/// Radiation and blow-out, shielding, phase classification, sinks,
/// supply, the implicit surface integrator, and the coagulation solver.
pub use cinder_physics as physics;

/// Configuration, the per-step pipeline, and the run driver
/// (`cinder-engine`).
pub use cinder_engine as engine;

/// Common imports for typical Cinder usage.
///
/// ```rust
/// use cinder::prelude::*;
/// ```
pub mod prelude {
    // Core types and errors
    pub use cinder_core::{
        ConfigError, LossChannel, PhysicalParameters, SimulationState, StepError, TableError,
    };

    // Lookup sources
    pub use cinder_tables::{
        AnalyticPhi, AnalyticQpr, Efficiency, PhiTable, PsatTable, QprTable, Transmission,
        VaporPressure,
    };

    // Physics components
    pub use cinder_physics::{
        BlowoutCase, GasDragParams, HydroEscape, Phase, PhaseDecision, PhasePolicy,
        PhaseThresholds, ShieldingMode, SinkMode, SublimationParams, SupplyModel, SupplySpec,
    };

    // Engine
    pub use cinder_engine::{
        InitialState, MassBudgetRecord, PhysicsMode, RunError, RunOutput, RunSummary, SimConfig,
        SimInputs, Simulation, StepRecord, SubstepPolicy, TemperatureDriver,
    };
}
