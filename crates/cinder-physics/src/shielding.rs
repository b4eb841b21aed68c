//! Optical depth, self-shielding, and the τ=1 column ceiling.
//!
//! The vertical optical depth of the layer is τ = κ·Σ. Once τ grows past
//! order unity the layer shadows itself: the transmission Φ(τ, ω₀, g)
//! reduces the opacity to κ_eff = Φ·κ, and the column density at which
//! τ = 1, Σ_{τ=1} = 1/κ_eff, acts as a physical ceiling on the directly
//! irradiated surface density.

use cinder_core::{PhysicalParameters, StepError};
use cinder_tables::Transmission;

/// Optical depths at or below this are treated as the optically thin
/// limit: the collision timescale is undefined there and the collision
/// term is switched off entirely. The cutoff is deliberately a hard
/// branch, not a smooth decay.
pub const TAU_MIN: f64 = 1.0e-12;

// ── Mode ───────────────────────────────────────────────────────────

/// How the shielding ceiling is computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShieldingMode {
    /// No shielding: Φ = 1, ceiling infinite.
    Off,
    /// Externally pinned ceiling, independent of the current state.
    FixedTau1 {
        /// The pinned Σ_{τ=1} value (kg m⁻²).
        sigma_tau1: f64,
    },
    /// Transmission-based shielding with the given scattering properties.
    PhiTau {
        /// Single-scattering albedo ω₀ ∈ [0, 1].
        albedo: f64,
        /// Asymmetry parameter g ∈ [-1, 1].
        asymmetry: f64,
    },
}

// ── Result ─────────────────────────────────────────────────────────

/// Shielding quantities for one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShieldingResult {
    /// Vertical optical depth κ·Σ.
    pub tau: f64,
    /// Effective opacity Φ·κ (m² kg⁻¹).
    pub kappa_eff: f64,
    /// Column density at τ = 1; `f64::INFINITY` when no ceiling applies.
    pub sigma_tau1: f64,
    /// Transmission Φ actually applied, in [0, 1].
    pub phi: f64,
}

/// Column density at which the effective optical depth reaches unity.
pub fn sigma_tau_unity(kappa_eff: f64) -> f64 {
    if !kappa_eff.is_finite() || kappa_eff <= 0.0 {
        f64::INFINITY
    } else {
        1.0 / kappa_eff
    }
}

/// Evaluate optical depth and the shielding ceiling for the current Σ.
///
/// # Errors
///
/// Propagates a table error from the Φ source (only reachable for the
/// tabulated variant without fallback).
pub fn evaluate_shielding(
    mode: ShieldingMode,
    transmission: &Transmission,
    params: &PhysicalParameters,
    sigma_surf: f64,
) -> Result<ShieldingResult, StepError> {
    let kappa = params.opacity;
    let tau = kappa * sigma_surf.max(0.0);
    match mode {
        ShieldingMode::Off => Ok(ShieldingResult {
            tau,
            kappa_eff: kappa,
            sigma_tau1: f64::INFINITY,
            phi: 1.0,
        }),
        ShieldingMode::FixedTau1 { sigma_tau1 } => Ok(ShieldingResult {
            tau,
            kappa_eff: kappa,
            sigma_tau1,
            phi: 1.0,
        }),
        ShieldingMode::PhiTau { albedo, asymmetry } => {
            let phi = transmission.evaluate(tau, albedo, asymmetry)?;
            let kappa_eff = phi * kappa;
            Ok(ShieldingResult {
                tau,
                kappa_eff,
                sigma_tau1: sigma_tau_unity(kappa_eff),
                phi,
            })
        }
    }
}

/// Collisional grinding timescale for the surface layer (Wyatt scaling):
/// t_coll = 1/(2Ωτ). Defined only above the optically thin cutoff;
/// returns `None` at or below [`TAU_MIN`].
pub fn collision_timescale(tau: f64, omega: f64) -> Option<f64> {
    if tau <= TAU_MIN || omega <= 0.0 {
        return None;
    }
    Some(1.0 / (2.0 * omega * tau))
}
