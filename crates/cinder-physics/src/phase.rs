//! Solid/vapor phase classification and the hydrodynamic-escape sink.
//!
//! The phase decision gates blow-out: only solid-dominated material is
//! accelerated away as discrete grains. Vapor-dominated material instead
//! leaves through a hydrodynamic-escape channel with its own timescale.
//! The decision is a pure function of the current temperature, pressure,
//! and optical depth — there is no hysteresis.

use cinder_core::StepError;

// ── Phase ──────────────────────────────────────────────────────────

/// Aggregate phase state of the surface layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Entirely condensed.
    Solid,
    /// Inside the ramp band: partially vaporized.
    Mixed,
    /// Entirely vaporized.
    Vapor,
}

impl Phase {
    /// Stable tag used in records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Mixed => "mixed",
            Self::Vapor => "vapor",
        }
    }
}

/// Which policy produced a [`PhaseDecision`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseMethod {
    /// Externally supplied mapping function.
    Map,
    /// Ramped threshold comparison.
    Ramp,
}

/// The resolved phase state for one step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseDecision {
    /// Aggregate state.
    pub phase: Phase,
    /// Vapor mass fraction in [0, 1].
    pub f_vap: f64,
    /// Which policy produced this decision.
    pub method: PhaseMethod,
    /// Whether blow-out is permitted (solid-dominated material only).
    pub blowout_permitted: bool,
}

// ── Policies ───────────────────────────────────────────────────────

/// Externally supplied phase mapping.
///
/// Implementations must be pure: identical inputs produce identical
/// vapor fractions.
pub trait PhaseMap: Send {
    /// Vapor fraction for the given conditions. Values outside [0, 1]
    /// are clamped by the caller.
    fn vapor_fraction(&self, temp_k: f64, pressure_pa: Option<f64>, tau: Option<f64>) -> f64;
}

/// Ramp thresholds for the built-in policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseThresholds {
    /// Below this temperature the layer is entirely solid (K).
    pub t_condense_k: f64,
    /// At or above this temperature the layer is entirely vapor (K).
    pub t_vaporize_k: f64,
    /// Reference pressure damping the ramp (Pa); ≤ 0 disables.
    pub p_ref_pa: f64,
    /// Reference optical depth damping the ramp; ≤ 0 disables.
    pub tau_ref: f64,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            t_condense_k: 1300.0,
            t_vaporize_k: 2000.0,
            p_ref_pa: 1.0e5,
            tau_ref: 1.0,
        }
    }
}

/// Phase policy, selected at configuration time.
pub enum PhasePolicy {
    /// Externally supplied mapping function.
    Map(Box<dyn PhaseMap>),
    /// Ramped threshold comparison between condensation and vaporization
    /// temperatures, producing a fractional vapor content.
    Ramp(PhaseThresholds),
}

impl std::fmt::Debug for PhasePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Map(_) => f.write_str("PhasePolicy::Map(..)"),
            Self::Ramp(t) => f.debug_tuple("PhasePolicy::Ramp").field(t).finish(),
        }
    }
}

/// Classify the phase state for the current conditions.
///
/// Continuous inside the ramp band: the vapor fraction interpolates
/// between the condensation and vaporization temperatures, damped by
/// ambient pressure and optical depth (both suppress net vaporization).
/// Blow-out is permitted only while the layer is solid-dominated
/// (f_vap < 0.5).
///
/// # Errors
///
/// Returns [`StepError::InvalidTemperature`] for non-finite or
/// non-positive temperatures.
pub fn classify(
    policy: &PhasePolicy,
    temp_k: f64,
    pressure_pa: Option<f64>,
    tau: Option<f64>,
) -> Result<PhaseDecision, StepError> {
    if !temp_k.is_finite() || temp_k <= 0.0 {
        return Err(StepError::InvalidTemperature { value: temp_k });
    }
    let pressure = pressure_pa.filter(|p| p.is_finite()).map(|p| p.max(0.0));
    let tau = tau.filter(|t| t.is_finite()).map(|t| t.max(0.0));

    let (f_vap, method) = match policy {
        PhasePolicy::Map(map) => (
            map.vapor_fraction(temp_k, pressure, tau).clamp(0.0, 1.0),
            PhaseMethod::Map,
        ),
        PhasePolicy::Ramp(thresholds) => {
            (ramp_fraction(thresholds, temp_k, pressure, tau), PhaseMethod::Ramp)
        }
    };

    let phase = if f_vap <= 0.0 {
        Phase::Solid
    } else if f_vap >= 1.0 {
        Phase::Vapor
    } else {
        Phase::Mixed
    };

    Ok(PhaseDecision {
        phase,
        f_vap,
        method,
        blowout_permitted: f_vap < 0.5,
    })
}

fn ramp_fraction(
    thresholds: &PhaseThresholds,
    temp_k: f64,
    pressure_pa: Option<f64>,
    tau: Option<f64>,
) -> f64 {
    let t_cond = thresholds.t_condense_k;
    // Keep the ramp band non-degenerate even for a misordered pair.
    let t_vap = thresholds.t_vaporize_k.max(t_cond + 1.0);

    if temp_k <= t_cond {
        return 0.0;
    }
    if temp_k >= t_vap {
        return 1.0;
    }
    let mut frac = (temp_k - t_cond) / (t_vap - t_cond);
    if let Some(p) = pressure_pa {
        if thresholds.p_ref_pa > 0.0 {
            frac /= 1.0 + p / thresholds.p_ref_pa;
        }
    }
    if let Some(t) = tau {
        if thresholds.tau_ref > 0.0 {
            frac /= 1.0 + t / thresholds.tau_ref;
        }
    }
    frac.clamp(0.0, 1.0)
}

// ── Hydrodynamic escape ────────────────────────────────────────────

/// Hydrodynamic-escape sink configuration.
///
/// Active only while vapor is present; the escape rate grows
/// exponentially with temperature excess over the reference and linearly
/// with the vapor fraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HydroEscape {
    /// Base escape rate at the reference temperature (s⁻¹).
    pub strength: f64,
    /// Reference temperature (K).
    pub t_ref_k: f64,
    /// e-folding width of the temperature modulation (K).
    pub dt_ref_k: f64,
    /// Floor applied to the vapor fraction so a trace of vapor still
    /// escapes at a finite rate.
    pub f_vap_floor: f64,
}

impl Default for HydroEscape {
    fn default() -> Self {
        Self {
            strength: 1.0e-7,
            t_ref_k: 2000.0,
            dt_ref_k: 200.0,
            f_vap_floor: 1.0e-3,
        }
    }
}

impl HydroEscape {
    /// Escape timescale for the given conditions, `None` when inactive
    /// (zero strength or no vapor).
    pub fn escape_timescale(&self, temp_k: f64, f_vap: f64) -> Option<f64> {
        if self.strength <= 0.0 || f_vap <= 0.0 {
            return None;
        }
        let width = self.dt_ref_k.max(1.0);
        let temp_factor = ((temp_k - self.t_ref_k) / width).exp();
        let vapor_factor = f_vap.max(self.f_vap_floor);
        let rate = self.strength * temp_factor * vapor_factor;
        if rate > 0.0 && rate.is_finite() {
            Some(1.0 / rate)
        } else {
            None
        }
    }
}
