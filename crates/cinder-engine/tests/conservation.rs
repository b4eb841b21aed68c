//! Mass-budget closure, positivity, and monotone cumulative losses over
//! full runs, on both the scalar and the multi-bin paths.

use cinder_core::LossChannel;
use cinder_engine::{InitialState, SimConfig, Simulation};
use cinder_physics::shielding::ShieldingMode;
use cinder_physics::sinks::SinkMode;
use cinder_physics::supply::{SupplyModel, SupplySpec};
use cinder_test_utils::{basic_inputs, two_bin_grinding_setup, two_bin_lossy_setup};

fn assert_invariants(output: &cinder_engine::RunOutput) {
    let mut prev_time = 0.0;
    let mut prev_losses: Vec<(LossChannel, f64)> = Vec::new();
    for record in &output.records {
        assert!(record.sigma_surf >= 0.0, "negative Σ at step {}", record.step);
        assert!(record.time_s > prev_time, "time must strictly increase");
        prev_time = record.time_s;

        if !prev_losses.is_empty() {
            for (&(ch, now), &(ch_prev, before)) in
                record.losses.iter().zip(prev_losses.iter())
            {
                assert_eq!(ch, ch_prev);
                assert!(
                    now >= before,
                    "{ch} cumulative loss decreased at step {}",
                    record.step
                );
            }
        }
        prev_losses = record.losses.clone();
    }
    for budget in &output.budget_log {
        assert!(
            budget.passed,
            "budget violated at step {}: rel_err {:e}",
            budget.step, budget.rel_err
        );
    }
    let channel_sum: f64 = output.summary.losses.iter().map(|(_, v)| v).sum();
    assert!((channel_sum - output.summary.total_lost).abs() < 1e-12);
}

#[test]
fn combined_run_conserves_mass() {
    let mut inputs = basic_inputs(2000.0);
    inputs.supply = SupplySpec {
        model: SupplyModel::Constant { rate: 1.0e-6 },
        mixing_efficiency: 0.8,
    };
    let cfg = SimConfig {
        dt: 500.0,
        steps: 50,
        sink_mode: SinkMode::Sublimation,
        shielding: ShieldingMode::PhiTau {
            albedo: 0.1,
            asymmetry: 0.3,
        },
        initial: InitialState::SurfaceDensity(5.0),
        ..SimConfig::default()
    };
    let output = Simulation::new(cfg, inputs).unwrap().run().unwrap();
    assert_invariants(&output);

    // Hot enough to sublimate: the sink channel must have fired.
    assert!(output.final_state.losses.get(LossChannel::Sublimation) > 0.0);
    assert!(output.summary.budget_max_rel_err < 5.0e-3);
    assert!(output.summary.budget_violation.is_none());
}

#[test]
fn decaying_supply_run_conserves_mass() {
    let mut inputs = basic_inputs(4000.0);
    inputs.supply = SupplySpec {
        model: SupplyModel::PowerLaw {
            amplitude: 1.0e-6,
            t0_s: 0.0,
            index: -0.3,
        },
        mixing_efficiency: 1.0,
    };
    let cfg = SimConfig {
        dt: 1.0e3,
        steps: 100,
        sink_mode: SinkMode::None,
        initial: InitialState::SurfaceDensity(0.0),
        ..SimConfig::default()
    };
    let output = Simulation::new(cfg, inputs).unwrap().run().unwrap();
    assert_invariants(&output);
    // Supply-driven run starting empty: everything lost came from supply.
    assert!(output.summary.total_lost > 0.0);
}

#[test]
fn coagulation_run_keeps_bins_consistent_with_sigma() {
    let mut inputs = basic_inputs(4000.0);
    inputs.coagulation = Some(two_bin_grinding_setup());
    let cfg = SimConfig {
        dt: 100.0,
        steps: 30,
        sink_mode: SinkMode::None,
        initial: InitialState::SizeDistribution(vec![1.0e9, 1.0e8]),
        ..SimConfig::default()
    };
    let output = Simulation::new(cfg, inputs).unwrap().run().unwrap();
    assert_invariants(&output);

    let setup = two_bin_grinding_setup();
    for record in &output.records {
        let bins = record.bins.as_ref().expect("coagulation path carries bins");
        assert!(bins.iter().all(|&n| n >= 0.0));
        let bin_mass = setup.sizes.total_mass(bins);
        let scale = record.sigma_surf.max(f64::MIN_POSITIVE);
        assert!(
            (bin_mass - record.sigma_surf).abs() / scale < 1.0e-9,
            "bin mass {bin_mass} diverged from Σ {} at step {}",
            record.sigma_surf,
            record.step
        );
    }
}

#[test]
fn lossy_fragment_tensor_feeds_the_collision_channel() {
    let mut inputs = basic_inputs(4000.0);
    inputs.coagulation = Some(two_bin_lossy_setup());
    let cfg = SimConfig {
        dt: 100.0,
        steps: 20,
        sink_mode: SinkMode::None,
        blowout_enabled: false,
        initial: InitialState::SizeDistribution(vec![0.0, 1.0e8]),
        ..SimConfig::default()
    };
    let output = Simulation::new(cfg, inputs).unwrap().run().unwrap();
    assert_invariants(&output);
    assert!(output.final_state.losses.get(LossChannel::Collisions) > 0.0);
}

#[test]
fn record_stream_mirrors_the_record_log() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let cfg = SimConfig {
        dt: 1.0e3,
        steps: 5,
        sink_mode: SinkMode::None,
        initial: InitialState::SurfaceDensity(2.0),
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(cfg, basic_inputs(4000.0)).unwrap();
    sim.set_record_sender(tx);
    let output = sim.run().unwrap();

    let streamed: Vec<_> = rx.try_iter().collect();
    assert_eq!(streamed.len(), output.records.len());
    assert_eq!(streamed[0], output.records[0]);
}

#[test]
fn dropped_receiver_does_not_fail_the_run() {
    let (tx, rx) = crossbeam_channel::unbounded();
    drop(rx);
    let cfg = SimConfig {
        dt: 1.0e3,
        steps: 3,
        sink_mode: SinkMode::None,
        initial: InitialState::SurfaceDensity(2.0),
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(cfg, basic_inputs(4000.0)).unwrap();
    sim.set_record_sender(tx);
    assert!(sim.run().is_ok());
}

#[test]
fn time_to_99_loss_is_reported_for_a_draining_run() {
    let cfg = SimConfig {
        dt: 5.0e3,
        steps: 60,
        sink_mode: SinkMode::None,
        use_collision_timescale: false,
        initial: InitialState::SurfaceDensity(1.0),
        ..SimConfig::default()
    };
    let output = Simulation::new(cfg, basic_inputs(4000.0)).unwrap().run().unwrap();
    // Pure blow-out with Δt/t_blow ≈ 1 drains the layer within the run.
    let t99 = output
        .summary
        .time_to_99_loss_s
        .expect("99% of the mass should be gone");
    assert!(t99 > 0.0);
    assert!(t99 <= output.final_state.time_s);
    assert!(output.final_state.losses.get(LossChannel::Blowout) > 0.99);
}
