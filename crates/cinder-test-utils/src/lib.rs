//! Shared fixtures for Cinder development and testing.
//!
//! Provides a reference parameter set, pre-wired [`SimInputs`] builders,
//! forced phase policies, and a small mass-conserving coagulation setup,
//! so unit and integration tests construct runs in one or two lines.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use cinder_core::PhysicalParameters;
use cinder_engine::{CoagulationSetup, SimConfig, SimInputs, TemperatureDriver};
use cinder_physics::collisions::{CollisionKernel, FragmentTensor, SizeBins};
use cinder_physics::phase::{PhaseMap, PhasePolicy, PhaseThresholds};
use cinder_physics::sinks::GasDragParams;
use cinder_physics::sublimation::SublimationParams;
use cinder_physics::supply::SupplySpec;
use cinder_tables::{AnalyticPhi, AnalyticQpr, Efficiency, Transmission};

/// Reference parameter set: basalt-like grains in a close-in ring around
/// a Mars-mass body.
pub fn reference_parameters() -> PhysicalParameters {
    PhysicalParameters {
        m_central: 6.4171e23,
        r_central: 3.3895e6,
        orbit_radius: 1.0e7,
        rho_grain: 3000.0,
        molar_mass: 0.0601,
        alpha_evap: 0.1,
        opacity: 0.5,
        s_min: 1.0e-7,
        s_ref: 1.0e-6,
    }
}

/// Silicate-like Clausius fit for saturation vapor pressure.
pub fn silicate_sublimation() -> SublimationParams {
    SublimationParams::clausius(13.2, 2.66e4)
}

/// A ramp policy whose band sits far above any test temperature, so the
/// layer is always solid.
pub fn always_solid_phase() -> PhasePolicy {
    PhasePolicy::Ramp(PhaseThresholds {
        t_condense_k: 1.0e4,
        t_vaporize_k: 2.0e4,
        p_ref_pa: 1.0e5,
        tau_ref: 1.0,
    })
}

/// A map policy pinning the vapor fraction to a constant.
pub struct ConstantVapor(pub f64);

impl PhaseMap for ConstantVapor {
    fn vapor_fraction(&self, _: f64, _: Option<f64>, _: Option<f64>) -> f64 {
        self.0
    }
}

/// Analytic-everything inputs at a fixed temperature: no supply, solid
/// phase, no gas, no hydro escape, scalar path.
pub fn basic_inputs(temp_k: f64) -> SimInputs {
    SimInputs {
        params: reference_parameters(),
        efficiency: Efficiency::Analytic(AnalyticQpr),
        transmission: Transmission::Analytic(AnalyticPhi),
        temperature: TemperatureDriver::Constant(temp_k),
        supply: SupplySpec::none(),
        sublimation: silicate_sublimation(),
        gas_drag: GasDragParams::default(),
        phase: always_solid_phase(),
        hydro_escape: None,
        coagulation: None,
    }
}

/// A short default configuration for driver tests.
pub fn basic_config() -> SimConfig {
    SimConfig {
        steps: 10,
        ..SimConfig::default()
    }
}

/// Two-bin mass-conserving grinding setup: each destroyed large grain
/// (8e-12 kg) yields eight small fragments (1e-12 kg each); supply lands
/// in the small bin. The kernel is gentle enough that reference-scale
/// populations stay well resolved at Δt ≈ 100 s.
pub fn two_bin_grinding_setup() -> CoagulationSetup {
    let n = 2;
    let sizes = SizeBins::new(vec![1.0e-12, 8.0e-12]).unwrap();
    let kernel = CollisionKernel::new(n, vec![0.0, 0.0, 0.0, 1.0e-14]).unwrap();
    let mut f = vec![0.0; n * n * n];
    f[(n + 1) * n] = 8.0;
    let fragments = FragmentTensor::new(n, f, &sizes).unwrap();
    CoagulationSetup {
        sizes,
        kernel,
        fragments,
        supply_weights: vec![1.0, 0.0],
        audit_tol: 5.0e-3,
    }
}

/// Like [`two_bin_grinding_setup`], but 40% of each destroyed grain's
/// mass falls below the size floor (a net collisional loss).
pub fn two_bin_lossy_setup() -> CoagulationSetup {
    let mut setup = two_bin_grinding_setup();
    let n = 2;
    let mut f = vec![0.0; n * n * n];
    f[(n + 1) * n] = 4.8;
    setup.fragments = FragmentTensor::new(n, f, &setup.sizes).unwrap();
    setup
}
