//! Core types and errors for the Cinder surface-layer evolution engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions shared by the physics and engine crates:
//! physical constants, the simulation state, the immutable physical
//! parameter set, the loss-channel ledger, and the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod constants;
pub mod error;
pub mod params;
pub mod state;

pub use error::{ConfigError, StepError, TableError};
pub use params::PhysicalParameters;
pub use state::{LossChannel, LossLedger, SimulationState};
