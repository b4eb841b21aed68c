//! Benchmark profiles for the Cinder surface-layer engine.
//!
//! Provides pre-built configurations so benchmarks construct identical
//! runs without duplicating setup.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use cinder_core::PhysicalParameters;
use cinder_engine::{InitialState, SimConfig, SimInputs, TemperatureDriver};
use cinder_physics::phase::{PhasePolicy, PhaseThresholds};
use cinder_physics::shielding::ShieldingMode;
use cinder_physics::sinks::{GasDragParams, SinkMode};
use cinder_physics::sublimation::SublimationParams;
use cinder_physics::supply::{SupplyModel, SupplySpec};
use cinder_tables::{AnalyticPhi, AnalyticQpr, Efficiency, Transmission};

/// Reference profile: combined physics, analytic sources, constant
/// supply, shielded surface. `steps` controls run length.
pub fn reference_profile(steps: usize) -> (SimConfig, SimInputs) {
    let params = PhysicalParameters {
        m_central: 6.4171e23,
        r_central: 3.3895e6,
        orbit_radius: 1.0e7,
        rho_grain: 3000.0,
        molar_mass: 0.0601,
        alpha_evap: 0.1,
        opacity: 0.5,
        s_min: 1.0e-7,
        s_ref: 1.0e-6,
    };
    let inputs = SimInputs {
        params,
        efficiency: Efficiency::Analytic(AnalyticQpr),
        transmission: Transmission::Analytic(AnalyticPhi),
        temperature: TemperatureDriver::CoolingCurve {
            t_initial_k: 4000.0,
            t_floor_k: 1500.0,
            tau_cool_s: 1.0e6,
        },
        supply: SupplySpec {
            model: SupplyModel::Constant { rate: 1.0e-6 },
            mixing_efficiency: 0.8,
        },
        sublimation: SublimationParams::clausius(13.2, 2.66e4),
        gas_drag: GasDragParams::default(),
        phase: PhasePolicy::Ramp(PhaseThresholds {
            t_condense_k: 4500.0,
            t_vaporize_k: 5500.0,
            p_ref_pa: 1.0e5,
            tau_ref: 1.0,
        }),
        hydro_escape: None,
        coagulation: None,
    };
    let config = SimConfig {
        dt: 1.0e3,
        steps,
        sink_mode: SinkMode::Sublimation,
        shielding: ShieldingMode::PhiTau {
            albedo: 0.1,
            asymmetry: 0.3,
        },
        initial: InitialState::SurfaceDensity(5.0),
        ..SimConfig::default()
    };
    (config, inputs)
}
