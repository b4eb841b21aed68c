//! Leaf physics components for the Cinder surface-layer engine.
//!
//! Each module is a set of pure functions (plus small result structs) over
//! [`cinder_core::PhysicalParameters`] and the lookup interfaces in
//! `cinder-tables`. Components never touch shared mutable state; the engine
//! crate wires them into an ordered per-step pipeline.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod collisions;
pub mod phase;
pub mod radiation;
pub mod shielding;
pub mod sinks;
pub mod sublimation;
pub mod supply;
pub mod surface;

pub use collisions::{CoagulationStep, CollisionKernel, FragmentTensor, SizeBins};
pub use phase::{
    HydroEscape, Phase, PhaseDecision, PhaseMap, PhaseMethod, PhasePolicy, PhaseThresholds,
};
pub use radiation::{BlowoutCase, RadiationResolution, BLOWOUT_BETA_THRESHOLD};
pub use shielding::{ShieldingMode, ShieldingResult, TAU_MIN};
pub use sinks::{GasDragParams, SinkBreakdown, SinkMode};
pub use sublimation::SublimationParams;
pub use supply::{SupplyModel, SupplyPiece, SupplySpec, SupplyTable};
pub use surface::SurfaceStep;
