//! End-to-end scenario tests for the run driver.

use cinder_core::LossChannel;
use cinder_engine::{InitialState, PhysicsMode, SimConfig, Simulation, SubstepPolicy};
use cinder_physics::phase::{HydroEscape, Phase, PhasePolicy};
use cinder_physics::radiation::BlowoutCase;
use cinder_physics::sinks::SinkMode;
use cinder_test_utils::{basic_inputs, ConstantVapor};

fn config(steps: usize) -> SimConfig {
    SimConfig {
        steps,
        dt: 1.0e3,
        initial: InitialState::SurfaceDensity(10.0),
        ..SimConfig::default()
    }
}

// ── Scenario: sink mode none ───────────────────────────────────────

#[test]
fn sink_mode_none_keeps_sink_channels_at_zero() {
    let cfg = SimConfig {
        sink_mode: SinkMode::None,
        ..config(20)
    };
    let output = Simulation::new(cfg, basic_inputs(4000.0)).unwrap().run().unwrap();

    assert_eq!(output.records.len(), 20);
    for record in &output.records {
        assert_eq!(record.sink_flux, 0.0, "step {}", record.step);
        for &(channel, mass) in &record.losses {
            match channel {
                LossChannel::Sublimation | LossChannel::GasDrag | LossChannel::HydroEscape => {
                    assert_eq!(mass, 0.0, "{channel} leaked mass at step {}", record.step);
                }
                _ => {}
            }
        }
    }
    // Blow-out is hot and ungated here, so mass does leave — through the
    // blow-out channel only.
    let blowout: f64 = output
        .summary
        .losses
        .iter()
        .find(|(c, _)| *c == LossChannel::Blowout)
        .map(|(_, v)| *v)
        .unwrap();
    assert!(blowout > 0.0);
}

// ── Scenario: β classification ─────────────────────────────────────

#[test]
fn cold_body_classifies_no_blowout() {
    let sim = Simulation::new(config(1), basic_inputs(1000.0)).unwrap();
    let output = sim.finish();
    assert!(matches!(
        output.summary.blowout_case_initial,
        BlowoutCase::NoBlowout { .. }
    ));
    assert!(output.summary.beta_at_s_min_initial < 0.5);
    assert_eq!(output.summary.blowout_case_initial.as_str(), "no_blowout");
}

#[test]
fn hot_body_classifies_blowout() {
    let sim = Simulation::new(config(1), basic_inputs(4000.0)).unwrap();
    let output = sim.finish();
    assert!(matches!(
        output.summary.blowout_case_initial,
        BlowoutCase::Blowout { .. }
    ));
    assert!(output.summary.beta_at_s_min_initial >= 0.5);
    assert_eq!(output.summary.blowout_case_initial.as_str(), "blowout");
}

// ── Scenario: pure hold state ──────────────────────────────────────

#[test]
fn no_production_no_sinks_no_blowout_holds_sigma() {
    let cfg = SimConfig {
        sink_mode: SinkMode::None,
        blowout_enabled: false,
        use_collision_timescale: false,
        ..config(50)
    };
    let output = Simulation::new(cfg, basic_inputs(2500.0)).unwrap().run().unwrap();

    for record in &output.records {
        assert_eq!(record.sigma_surf, 10.0, "step {}", record.step);
        assert_eq!(record.outflux, 0.0);
        assert_eq!(record.sink_flux, 0.0);
    }
    assert_eq!(output.summary.total_lost, 0.0);
    assert_eq!(output.final_state.sigma_surf, 10.0);
    for budget in &output.budget_log {
        assert!(budget.passed);
        assert_eq!(budget.abs_err, 0.0);
    }
}

// ── Scenario: forced vapor phase ───────────────────────────────────

#[test]
fn forced_vapor_gates_blowout_and_activates_hydro_escape() {
    let mut inputs = basic_inputs(4000.0);
    inputs.phase = PhasePolicy::Map(Box::new(ConstantVapor(1.0)));
    inputs.hydro_escape = Some(HydroEscape::default());
    let cfg = SimConfig {
        sink_mode: SinkMode::None,
        ..config(10)
    };
    let output = Simulation::new(cfg, inputs).unwrap().run().unwrap();

    // β is far above threshold, yet the vapor phase vetoes every grain.
    assert!(output.summary.beta_at_s_min_initial >= 0.5);
    for record in &output.records {
        assert_eq!(record.outflux, 0.0, "step {}", record.step);
        assert_eq!(record.gate_factor, 0.0);
        assert_eq!(record.phase, Phase::Vapor);
        assert!(record.sink_flux > 0.0, "hydro escape should be active");
    }
    let hydro = output.final_state.losses.get(LossChannel::HydroEscape);
    assert!(hydro > 0.0);
    assert_eq!(output.final_state.losses.get(LossChannel::Blowout), 0.0);
}

// ── Scenario: vapor without an escape model is a pure gate ─────────

#[test]
fn forced_vapor_without_hydro_model_just_holds() {
    let mut inputs = basic_inputs(4000.0);
    inputs.phase = PhasePolicy::Map(Box::new(ConstantVapor(1.0)));
    inputs.hydro_escape = None;
    let cfg = SimConfig {
        sink_mode: SinkMode::None,
        use_collision_timescale: false,
        ..config(5)
    };
    let output = Simulation::new(cfg, inputs).unwrap().run().unwrap();
    for record in &output.records {
        assert_eq!(record.outflux, 0.0);
        assert_eq!(record.sink_flux, 0.0);
        assert_eq!(record.sigma_surf, 10.0);
    }
}

// ── Mode gating ────────────────────────────────────────────────────

#[test]
fn sublimation_only_mode_never_blows_out() {
    let cfg = SimConfig {
        physics_mode: PhysicsMode::SublimationOnly,
        sink_mode: SinkMode::Sublimation,
        ..config(10)
    };
    let output = Simulation::new(cfg, basic_inputs(4000.0)).unwrap().run().unwrap();
    for record in &output.records {
        assert_eq!(record.outflux, 0.0);
    }
    assert_eq!(output.final_state.losses.get(LossChannel::Blowout), 0.0);
    assert!(output.final_state.losses.get(LossChannel::Sublimation) > 0.0);
}

#[test]
fn collisions_only_mode_never_sinks() {
    let cfg = SimConfig {
        physics_mode: PhysicsMode::CollisionsOnly,
        sink_mode: SinkMode::None,
        ..config(10)
    };
    let output = Simulation::new(cfg, basic_inputs(4000.0)).unwrap().run().unwrap();
    for record in &output.records {
        assert_eq!(record.sink_flux, 0.0);
    }
    assert_eq!(output.final_state.losses.get(LossChannel::Sublimation), 0.0);
    assert!(output.final_state.losses.get(LossChannel::Collisions) > 0.0);
}

// ── Substep policy Off still reports the ratio ─────────────────────

#[test]
fn under_resolved_step_is_reported_when_policy_off() {
    let inputs = basic_inputs(4000.0);
    let t_blow = 1.0 / inputs.params.omega();
    let cfg = SimConfig {
        sink_mode: SinkMode::None,
        use_collision_timescale: false,
        substep_policy: SubstepPolicy::Off,
        dt: 10.0 * t_blow,
        steps: 1,
        initial: InitialState::SurfaceDensity(10.0),
        ..SimConfig::default()
    };
    let output = Simulation::new(cfg, inputs).unwrap().run().unwrap();
    let record = &output.records[0];
    assert!((record.dt_over_t_blow - 10.0).abs() < 1e-9);
    assert_eq!(record.n_substeps, 1);
    assert!(!record.fast_blowout_corrected);
}
