//! Implicit surface-density update — the stiff core.
//!
//! The optically thin skin of the disk obeys
//!
//! ```text
//! dΣ/dt = prod − Σ/t_blow − Σ/t_coll − Σ/t_sink
//! ```
//!
//! with only the terms whose channel is active. One backward-Euler step is
//! linear in Σⁿ⁺¹, so no iteration is needed:
//!
//! ```text
//! λ     = Σ_active 1/t_i
//! Σⁿ⁺¹  = (Σⁿ + Δt·prod) / (1 + Δt·λ)
//! ```
//!
//! All loss terms sit in the denominator, which makes the update
//! unconditionally stable and positivity-preserving for any Δt. The
//! result is then clipped to the shielding ceiling Σ_{τ=1} when that is
//! finite and smaller (a diagnostic clip; the step is not re-solved).

/// Fluxes and the updated density from one surface step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceStep {
    /// Updated surface density after clipping (kg m⁻²).
    pub sigma_surf: f64,
    /// Blow-out outflux Σⁿ⁺¹·Ω·gate (kg m⁻² s⁻¹); zero when blow-out is
    /// disabled or phase-gated.
    pub outflux: f64,
    /// Sink flux Σⁿ⁺¹/t_sink (kg m⁻² s⁻¹); zero when no sink is active.
    pub sink_flux: f64,
    /// Mass removed by the ceiling clip this step (kg m⁻²); zero when the
    /// ceiling did not bind.
    pub clipped_mass: f64,
}

/// Blow-out timescale t_blow = χ/Ω.
pub fn blowout_timescale(chi_blow: f64, omega: f64) -> f64 {
    if omega > 0.0 {
        chi_blow / omega
    } else {
        f64::INFINITY
    }
}

/// Effective loss fraction for a fast, under-resolved blow-out step:
/// 1 − exp(−Δt/t_blow), the exact average of exponential decay over the
/// step, clamped to [0, 1].
pub fn fast_blowout_correction(ratio: f64) -> f64 {
    if ratio <= 0.0 {
        return 0.0;
    }
    if ratio.is_infinite() {
        return 1.0;
    }
    (-(-ratio).exp_m1()).clamp(0.0, 1.0)
}

/// Advance the surface density by one implicit Euler step.
///
/// `t_coll` and `t_sink` are `None` when their channels are inactive;
/// an inactive channel contributes nothing to λ (it is never a division
/// by zero). `gate_factor` multiplies the outflux only — phase gating and
/// fast-blow-out correction both act through it.
#[allow(clippy::too_many_arguments)]
pub fn step_surface_density(
    sigma_surf: f64,
    prod_rate: f64,
    dt: f64,
    omega: f64,
    t_blow: f64,
    t_coll: Option<f64>,
    t_sink: Option<f64>,
    sigma_tau1: Option<f64>,
    blowout_enabled: bool,
    gate_factor: f64,
) -> SurfaceStep {
    let mut lambda = 0.0;
    if blowout_enabled && t_blow.is_finite() && t_blow > 0.0 {
        lambda += 1.0 / t_blow;
    }
    if let Some(t) = t_coll {
        if t > 0.0 && t.is_finite() {
            lambda += 1.0 / t;
        }
    }
    if let Some(t) = t_sink {
        if t > 0.0 && t.is_finite() {
            lambda += 1.0 / t;
        }
    }

    let numerator = sigma_surf.max(0.0) + dt * prod_rate.max(0.0);
    let mut sigma_new = numerator / (1.0 + dt * lambda);

    let mut clipped_mass = 0.0;
    if let Some(ceiling) = sigma_tau1 {
        if ceiling.is_finite() && sigma_new > ceiling {
            clipped_mass = sigma_new - ceiling.max(0.0);
            sigma_new = ceiling.max(0.0);
        }
    }

    let outflux = if blowout_enabled {
        sigma_new * omega * gate_factor.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let sink_flux = match t_sink {
        Some(t) if t > 0.0 && t.is_finite() => sigma_new / t,
        _ => 0.0,
    };

    SurfaceStep {
        sigma_surf: sigma_new,
        outflux,
        sink_flux,
        clipped_mass,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pure_accumulation_when_all_terms_inactive() {
        let r = step_surface_density(
            2.0, 1.0e-6, 100.0, 1.0e-4, f64::INFINITY, None, None, None, false, 1.0,
        );
        assert!((r.sigma_surf - (2.0 + 100.0 * 1.0e-6)).abs() < 1e-12);
        assert_eq!(r.outflux, 0.0);
        assert_eq!(r.sink_flux, 0.0);
    }

    #[test]
    fn implicit_decay_matches_closed_form() {
        // Pure blow-out: Σⁿ⁺¹ = Σⁿ / (1 + Δt/t_blow).
        let omega = 1.0e-4;
        let t_blow = blowout_timescale(1.0, omega);
        let dt = 5.0e3;
        let r = step_surface_density(
            4.0, 0.0, dt, omega, t_blow, None, None, None, true, 1.0,
        );
        let expected = 4.0 / (1.0 + dt / t_blow);
        assert!((r.sigma_surf - expected).abs() < 1e-12);
        assert!((r.outflux - expected * omega).abs() < 1e-12);
    }

    #[test]
    fn all_channels_compound_implicitly() {
        let omega = 1.0e-4;
        let t_blow = 1.0 / omega;
        let dt = 1.0e3;
        let combined = step_surface_density(
            1.0,
            0.0,
            dt,
            omega,
            t_blow,
            Some(2.0e4),
            Some(5.0e4),
            None,
            true,
            1.0,
        );
        let lambda = omega + 1.0 / 2.0e4 + 1.0 / 5.0e4;
        let expected = 1.0 / (1.0 + dt * lambda);
        assert!((combined.sigma_surf - expected).abs() < 1e-12);
        assert!((combined.sink_flux - expected / 5.0e4).abs() < 1e-15);
    }

    #[test]
    fn ceiling_clips_and_reports_spill() {
        let r = step_surface_density(
            10.0, 0.0, 1.0, 1.0e-4, f64::INFINITY, None, None, Some(3.0), false, 1.0,
        );
        assert_eq!(r.sigma_surf, 3.0);
        assert!((r.clipped_mass - 7.0).abs() < 1e-12);
    }

    #[test]
    fn infinite_ceiling_never_clips() {
        let r = step_surface_density(
            10.0,
            0.0,
            1.0,
            1.0e-4,
            f64::INFINITY,
            None,
            None,
            Some(f64::INFINITY),
            false,
            1.0,
        );
        assert_eq!(r.sigma_surf, 10.0);
        assert_eq!(r.clipped_mass, 0.0);
    }

    #[test]
    fn gate_factor_scales_outflux_only() {
        let omega = 1.0e-4;
        let t_blow = 1.0 / omega;
        let open = step_surface_density(1.0, 0.0, 1.0e3, omega, t_blow, None, None, None, true, 1.0);
        let gated =
            step_surface_density(1.0, 0.0, 1.0e3, omega, t_blow, None, None, None, true, 0.0);
        assert_eq!(open.sigma_surf, gated.sigma_surf);
        assert!(open.outflux > 0.0);
        assert_eq!(gated.outflux, 0.0);
    }

    #[test]
    fn disabled_blowout_removes_loss_and_outflux() {
        let omega = 1.0e-4;
        let t_blow = 1.0 / omega;
        let r = step_surface_density(1.0, 0.0, 1.0e3, omega, t_blow, None, None, None, false, 1.0);
        assert_eq!(r.sigma_surf, 1.0);
        assert_eq!(r.outflux, 0.0);
    }

    #[test]
    fn correction_factor_limits() {
        assert_eq!(fast_blowout_correction(0.0), 0.0);
        assert_eq!(fast_blowout_correction(-1.0), 0.0);
        assert_eq!(fast_blowout_correction(f64::INFINITY), 1.0);
        let f = fast_blowout_correction(1.0);
        assert!((f - (1.0 - (-1.0f64).exp())).abs() < 1e-15);
        // Small ratios stay accurate through expm1.
        let tiny = fast_blowout_correction(1.0e-12);
        assert!((tiny - 1.0e-12).abs() < 1e-24);
    }

    proptest! {
        #[test]
        fn sigma_never_negative(
            sigma in 0.0f64..1.0e4,
            prod in 0.0f64..1.0e-2,
            dt in 1.0e-3f64..1.0e8,
            t_blow in 1.0e-3f64..1.0e8,
            t_coll in 1.0e-3f64..1.0e8,
            t_sink in 1.0e-3f64..1.0e8,
        ) {
            let r = step_surface_density(
                sigma, prod, dt, 1.0e-4, t_blow,
                Some(t_coll), Some(t_sink), None, true, 1.0,
            );
            prop_assert!(r.sigma_surf >= 0.0);
            prop_assert!(r.outflux >= 0.0);
            prop_assert!(r.sink_flux >= 0.0);
        }

        #[test]
        fn losses_shrink_sigma_relative_to_hold(
            sigma in 1.0e-6f64..1.0e4,
            dt in 1.0e-3f64..1.0e8,
            t_blow in 1.0e-3f64..1.0e8,
        ) {
            let held = step_surface_density(
                sigma, 0.0, dt, 1.0e-4, t_blow, None, None, None, false, 1.0,
            );
            let decayed = step_surface_density(
                sigma, 0.0, dt, 1.0e-4, t_blow, None, None, None, true, 1.0,
            );
            prop_assert!(decayed.sigma_surf < held.sigma_surf);
        }

        #[test]
        fn correction_factor_in_unit_interval(ratio in 0.0f64..1.0e3) {
            let f = fast_blowout_correction(ratio);
            prop_assert!((0.0..=1.0).contains(&f));
        }
    }
}
