//! Run driver and per-step physics coupling for the Cinder engine.
//!
//! The engine owns the [`SimulationState`](cinder_core::SimulationState)
//! and advances it one step at a time through an explicit, ordered
//! pipeline of pure physics evaluations: radiation → sinks → shielding →
//! phase → supply → surface update, followed by a mass-budget audit.
//! Fast blow-out is either corrected analytically or resolved by
//! sub-division, per configuration.
//!
//! The integration loop is strictly single-threaded: each step (and each
//! sub-step within it) completes fully before the next begins. The unit
//! of parallelism is the whole run.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod budget;
pub mod config;
pub mod driver;
pub mod record;
pub mod step;
pub mod substep;
pub mod temperature;

pub use budget::{MassBudgetAuditor, MassBudgetRecord};
pub use config::{
    CoagulationSetup, InitialState, PhysicsMode, RunError, SimConfig, SimInputs, SubstepPolicy,
};
pub use driver::{RunOutput, Simulation};
pub use record::{Provenance, RunSummary, StepRecord};
pub use step::RateBundle;
pub use substep::SubstepPlan;
pub use temperature::{TemperatureDriver, TemperatureTable};
