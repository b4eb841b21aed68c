//! The ordered per-(sub-)step physics pipeline.
//!
//! Coupling order: ⟨Q_pr⟩ → β → blow-out size → sink timescales → τ/Φ →
//! phase → supply → surface update. Every stage is a pure function over
//! the immutable inputs and the incoming state; the stages communicate
//! only through this module's explicit intermediate values, never through
//! shared step-local mutables.
//!
//! Loss attribution is exact by construction: each channel's mass for the
//! sub-step is derived from the same implicit solution that advanced Σ,
//! so the run-level mass budget closes to rounding error unless a
//! component is genuinely inconsistent.

use cinder_core::{LossChannel, StepError};
use cinder_physics::collisions::step_coagulation;
use cinder_physics::phase::{classify, PhaseDecision};
use cinder_physics::radiation::{resolve_radiation, RadiationResolution};
use cinder_physics::shielding::{collision_timescale, evaluate_shielding};
use cinder_physics::sinks::{aggregate_sinks, SinkBreakdown};
use cinder_physics::surface::{blowout_timescale, fast_blowout_correction, step_surface_density};
use smallvec::SmallVec;

use crate::config::{SimConfig, SimInputs};

/// The ephemeral rate bundle of one sub-step. Recomputed every sub-step,
/// never persisted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateBundle {
    /// Blow-out timescale χ/Ω (s).
    pub t_blow: f64,
    /// Collision timescale, when the collision term is active (s).
    pub t_coll: Option<f64>,
    /// Effective sink timescale, when a sink is active (s).
    pub t_sink: Option<f64>,
    /// Mixed production rate (kg m⁻² s⁻¹).
    pub prod_rate: f64,
    /// Blow-out gate factor in [0, 1].
    pub gate_factor: f64,
    /// Vertical optical depth.
    pub tau: f64,
    /// Shielding ceiling, when finite (kg m⁻²).
    pub sigma_tau1: Option<f64>,
}

/// Everything one sub-step hands back to the driver.
#[derive(Clone, Debug)]
pub(crate) struct SubstepOutcome {
    pub sigma_surf: f64,
    pub bins: Option<Vec<f64>>,
    pub outflux: f64,
    pub sink_flux: f64,
    pub rates: RateBundle,
    pub phase: PhaseDecision,
    pub radiation: RadiationResolution,
    pub injected_mass: f64,
    pub losses: SmallVec<[(LossChannel, f64); 4]>,
    pub corrected: bool,
}

/// Sub-step loss attribution for the non-blow-out implicit terms.
///
/// The backward-Euler identity `σ_pre + Δt·prod − σ* = Δt·λ·σ*` makes
/// `Δt·σ*/t_i` the exact mass each active channel removed.
fn sink_losses(
    dt: f64,
    sigma_solved: f64,
    t_sink: Option<f64>,
    breakdown: &SinkBreakdown,
    vapor_dominated: bool,
    losses: &mut SmallVec<[(LossChannel, f64); 4]>,
) {
    let Some(t_eff) = t_sink else {
        return;
    };
    if t_eff <= 0.0 || !t_eff.is_finite() {
        return;
    }
    let total = dt * sigma_solved / t_eff;
    if total <= 0.0 {
        return;
    }
    if vapor_dominated {
        losses.push((LossChannel::HydroEscape, total));
        return;
    }
    // Split between sublimation and drag proportionally to their rates.
    let rate_sub = breakdown.sublimation.map_or(0.0, |t| 1.0 / t);
    let rate_drag = breakdown.gas_drag.map_or(0.0, |t| 1.0 / t);
    let rate_total = rate_sub + rate_drag;
    if rate_total <= 0.0 {
        losses.push((LossChannel::Sublimation, total));
        return;
    }
    if rate_sub > 0.0 {
        losses.push((LossChannel::Sublimation, total * rate_sub / rate_total));
    }
    if rate_drag > 0.0 {
        losses.push((LossChannel::GasDrag, total * rate_drag / rate_total));
    }
}

/// Advance one sub-step of size `dt` starting at `time_s`.
pub(crate) fn advance_substep(
    config: &SimConfig,
    inputs: &SimInputs,
    sigma: f64,
    bins: Option<&[f64]>,
    time_s: f64,
    dt: f64,
    analytic_correction: bool,
) -> Result<SubstepOutcome, StepError> {
    let params = &inputs.params;
    let omega = params.omega();

    // 1. Temperature, once per sub-step.
    let temp_k = inputs.temperature.at(time_s)?;

    // 2. ⟨Q_pr⟩ → β → blow-out size.
    let radiation = resolve_radiation(temp_k, &inputs.efficiency, params, config.beta_threshold)?;

    // 3. Sink timescales (sublimation, gas drag).
    let breakdown = if config.physics_mode.sinks_allowed() {
        aggregate_sinks(
            config.sink_mode,
            temp_k,
            params,
            &inputs.sublimation,
            &inputs.gas_drag,
        )?
    } else {
        SinkBreakdown::inactive()
    };

    // 4. Optical depth and the shielding ceiling.
    let shield = evaluate_shielding(config.shielding, &inputs.transmission, params, sigma)?;

    // 5. Phase decision, with the ambient vapor pressure as the pressure
    //    proxy and the current τ.
    let phase = classify(
        &inputs.phase,
        temp_k,
        Some(inputs.sublimation.ambient_pressure_pa),
        Some(shield.tau),
    )?;

    // Vapor-dominated steps swap the surface sink for hydrodynamic escape.
    let vapor_dominated = !phase.blowout_permitted;
    let t_sink = if vapor_dominated {
        inputs
            .hydro_escape
            .as_ref()
            .and_then(|h| h.escape_timescale(temp_k, phase.f_vap))
    } else {
        breakdown.effective
    };

    // 6. Supply.
    let prod_rate = inputs.supply.rate_at(time_s);

    // 7. Surface rates.
    let t_blow = blowout_timescale(config.chi_blow, omega);
    let blowout_active = config.blowout_enabled
        && config.physics_mode.blowout_allowed()
        && phase.blowout_permitted
        && radiation.beta_at_s_min >= config.beta_threshold;
    let gate_factor = if blowout_active { 1.0 } else { 0.0 };
    let t_coll = if config.physics_mode.collisions_allowed() && config.use_collision_timescale {
        collision_timescale(shield.tau, omega)
    } else {
        None
    };
    let ceiling = if shield.sigma_tau1.is_finite() {
        Some(shield.sigma_tau1)
    } else {
        None
    };

    let rates = RateBundle {
        t_blow,
        t_coll,
        t_sink,
        prod_rate,
        gate_factor,
        tau: shield.tau,
        sigma_tau1: ceiling,
    };

    // 8. Multi-bin collisional evolution, when configured.
    let mut losses: SmallVec<[(LossChannel, f64); 4]> = SmallVec::new();
    let mut injected_mass = dt * prod_rate;
    let (sigma_pre_surface, coag_bins, surface_prod, surface_t_coll) = match (bins, &inputs.coagulation) {
        (Some(population), Some(setup)) => {
            let masses = setup.sizes.masses();
            let supply_k: Vec<f64> = masses
                .iter()
                .zip(&setup.supply_weights)
                .map(|(m, w)| prod_rate * w / m)
                .collect();
            let coag = step_coagulation(
                population,
                &setup.kernel,
                &setup.fragments,
                Some(&supply_k),
                &setup.sizes,
                dt,
                setup.audit_tol,
            )?;
            if coag.ground_mass > 0.0 {
                losses.push((LossChannel::Collisions, coag.ground_mass));
            }
            injected_mass = coag.supply_mass;
            // Collisions are fully handled by the kernel; the scalar
            // update below must not apply the τ-based timescale again.
            (coag.mass_after, Some(coag.bins), 0.0, None)
        }
        _ => (sigma, None, prod_rate, t_coll),
    };

    // 9. Implicit surface update, with the blow-out term either implicit
    //    or treated by exact exponential decay (analytic correction).
    let (sigma_new, outflux, sink_flux) = if analytic_correction && blowout_active {
        // Non-blow-out terms first, implicitly, without the ceiling.
        let partial = step_surface_density(
            sigma_pre_surface,
            surface_prod,
            dt,
            omega,
            t_blow,
            surface_t_coll,
            t_sink,
            None,
            false,
            0.0,
        );
        let sigma_star = partial.sigma_surf;
        if let Some(t) = surface_t_coll {
            losses.push((LossChannel::Collisions, dt * sigma_star / t));
        }
        sink_losses(dt, sigma_star, t_sink, &breakdown, vapor_dominated, &mut losses);

        // Exact decay of the blow-out term over the step.
        let blow_mass = sigma_star * fast_blowout_correction(dt / t_blow);
        if blow_mass > 0.0 {
            losses.push((LossChannel::Blowout, blow_mass));
        }
        let mut sigma_after = sigma_star - blow_mass;

        if let Some(cap) = ceiling {
            if sigma_after > cap {
                losses.push((LossChannel::TauClip, sigma_after - cap));
                sigma_after = cap;
            }
        }
        let sink_flux = match t_sink {
            Some(t) if t > 0.0 && t.is_finite() => sigma_after / t,
            _ => 0.0,
        };
        (sigma_after, sigma_after * omega * gate_factor, sink_flux)
    } else {
        let res = step_surface_density(
            sigma_pre_surface,
            surface_prod,
            dt,
            omega,
            t_blow,
            surface_t_coll,
            t_sink,
            ceiling,
            blowout_active,
            gate_factor,
        );
        let sigma_solved = res.sigma_surf + res.clipped_mass;
        if blowout_active {
            losses.push((LossChannel::Blowout, dt * sigma_solved / t_blow));
        }
        if let Some(t) = surface_t_coll {
            losses.push((LossChannel::Collisions, dt * sigma_solved / t));
        }
        sink_losses(dt, sigma_solved, t_sink, &breakdown, vapor_dominated, &mut losses);
        if res.clipped_mass > 0.0 {
            losses.push((LossChannel::TauClip, res.clipped_mass));
        }
        (res.sigma_surf, res.outflux, res.sink_flux)
    };

    // 10. Rescale the bin populations to the post-loss surface density so
    //     the bin-mass sum stays identical to Σ.
    let bins_new = coag_bins.map(|mut b| {
        let setup = inputs.coagulation.as_ref().expect("coagulation bins imply setup");
        let total = setup.sizes.total_mass(&b);
        if total > 0.0 && sigma_new >= 0.0 {
            let factor = sigma_new / total;
            for v in &mut b {
                *v *= factor;
            }
        } else if sigma_new <= 0.0 {
            b.fill(0.0);
        }
        b
    });

    Ok(SubstepOutcome {
        sigma_surf: sigma_new,
        bins: bins_new,
        outflux,
        sink_flux,
        rates,
        phase,
        radiation,
        injected_mass,
        losses,
        corrected: analytic_correction && blowout_active,
    })
}
