//! Non-collisional sink timescales and their aggregation.
//!
//! Sinks are loss channels other than blow-out and collisional grinding:
//! sublimation, gas drag, and (selected by the phase classifier, not
//! here) hydrodynamic escape. The aggregator combines the active
//! components harmonically — the shortest timescale dominates — and
//! reports each component separately for diagnostics. A disabled sink
//! mode yields "no sink" (`None`), which the surface integrator treats
//! as an additive-zero loss term, never a division by zero.

use cinder_core::{PhysicalParameters, StepError};
use smallvec::SmallVec;

use crate::sublimation::{sublimation_timescale, SublimationParams};

// ── Mode and parameters ────────────────────────────────────────────

/// Which sink channels participate in the surface-density update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkMode {
    /// No sinks: the loss term is absent entirely.
    None,
    /// Sublimation only.
    Sublimation,
    /// Sublimation plus gas drag.
    SublimationAndDrag,
}

/// Epstein-like gas drag parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GasDragParams {
    /// Ambient gas density (kg m⁻³).
    pub rho_gas: f64,
    /// Gas sound speed (m s⁻¹).
    pub sound_speed: f64,
}

impl Default for GasDragParams {
    fn default() -> Self {
        Self {
            rho_gas: 0.0,
            sound_speed: 500.0,
        }
    }
}

/// Order-of-magnitude Epstein stopping time t_drag = ρ_p s / (ρ_g c_s).
/// `None` when any input is non-positive (no gas, no drag).
pub fn gas_drag_timescale(s: f64, rho_grain: f64, drag: &GasDragParams) -> Option<f64> {
    if s <= 0.0 || rho_grain <= 0.0 || drag.rho_gas <= 0.0 || drag.sound_speed <= 0.0 {
        return None;
    }
    Some(rho_grain * s / (drag.rho_gas * drag.sound_speed))
}

// ── Aggregation ────────────────────────────────────────────────────

/// Sink timescales for one step: components plus the harmonic total.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SinkBreakdown {
    /// Sublimation depletion timescale (s), when active.
    pub sublimation: Option<f64>,
    /// Gas drag stopping timescale (s), when active.
    pub gas_drag: Option<f64>,
    /// Harmonic combination of the active components (s). `None` when no
    /// component is active.
    pub effective: Option<f64>,
}

impl SinkBreakdown {
    /// Breakdown with every channel inactive.
    pub fn inactive() -> Self {
        Self {
            sublimation: None,
            gas_drag: None,
            effective: None,
        }
    }
}

/// Evaluate the configured sink channels and combine them harmonically:
/// 1/t_eff = Σ 1/t_i over the active components.
///
/// # Errors
///
/// Propagates temperature validation from the sublimation flux.
pub fn aggregate_sinks(
    mode: SinkMode,
    temp_k: f64,
    params: &PhysicalParameters,
    sub: &SublimationParams,
    drag: &GasDragParams,
) -> Result<SinkBreakdown, StepError> {
    if mode == SinkMode::None {
        return Ok(SinkBreakdown::inactive());
    }

    let sublimation = sublimation_timescale(temp_k, params, sub)?;
    let gas_drag = match mode {
        SinkMode::SublimationAndDrag => gas_drag_timescale(params.s_ref, params.rho_grain, drag),
        SinkMode::Sublimation | SinkMode::None => None,
    };

    let mut rates: SmallVec<[f64; 2]> = SmallVec::new();
    for t in [sublimation, gas_drag].into_iter().flatten() {
        if t > 0.0 && t.is_finite() {
            rates.push(1.0 / t);
        }
    }
    let effective = if rates.is_empty() {
        None
    } else {
        Some(1.0 / rates.iter().sum::<f64>())
    };

    Ok(SinkBreakdown {
        sublimation,
        gas_drag,
        effective,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PhysicalParameters {
        PhysicalParameters {
            m_central: 6.4171e23,
            r_central: 3.3895e6,
            orbit_radius: 1.0e7,
            rho_grain: 3000.0,
            molar_mass: 0.0601,
            alpha_evap: 0.1,
            opacity: 1.0,
            s_min: 1.0e-7,
            s_ref: 1.0e-6,
        }
    }

    fn sub() -> SublimationParams {
        SublimationParams::clausius(13.2, 2.66e4)
    }

    #[test]
    fn mode_none_is_fully_inactive() {
        let b = aggregate_sinks(
            SinkMode::None,
            2000.0,
            &params(),
            &sub(),
            &GasDragParams::default(),
        )
        .unwrap();
        assert_eq!(b, SinkBreakdown::inactive());
    }

    #[test]
    fn sublimation_only_reports_one_component() {
        let b = aggregate_sinks(
            SinkMode::Sublimation,
            2000.0,
            &params(),
            &sub(),
            &GasDragParams::default(),
        )
        .unwrap();
        assert!(b.sublimation.is_some());
        assert!(b.gas_drag.is_none());
        assert_eq!(b.effective, b.sublimation);
    }

    #[test]
    fn harmonic_combination_is_shorter_than_either() {
        let drag = GasDragParams {
            rho_gas: 1.0e-6,
            sound_speed: 500.0,
        };
        let b = aggregate_sinks(SinkMode::SublimationAndDrag, 2000.0, &params(), &sub(), &drag)
            .unwrap();
        let t_sub = b.sublimation.unwrap();
        let t_drag = b.gas_drag.unwrap();
        let t_eff = b.effective.unwrap();
        assert!(t_eff < t_sub);
        assert!(t_eff < t_drag);
        let expected = 1.0 / (1.0 / t_sub + 1.0 / t_drag);
        assert!((t_eff - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn drag_without_gas_is_inactive() {
        let b = aggregate_sinks(
            SinkMode::SublimationAndDrag,
            2000.0,
            &params(),
            &sub(),
            &GasDragParams::default(),
        )
        .unwrap();
        assert!(b.gas_drag.is_none());
        assert_eq!(b.effective, b.sublimation);
    }

    #[test]
    fn quenched_layer_has_no_effective_sink() {
        // Ambient pressure above saturation shuts off the net flux.
        let mut s = sub();
        s.ambient_pressure_pa = 1.0e30;
        let b = aggregate_sinks(
            SinkMode::Sublimation,
            2000.0,
            &params(),
            &s,
            &GasDragParams::default(),
        )
        .unwrap();
        assert!(b.sublimation.is_none());
        assert!(b.effective.is_none());
    }

    #[test]
    fn gas_drag_formula() {
        let drag = GasDragParams {
            rho_gas: 2.0e-6,
            sound_speed: 400.0,
        };
        let t = gas_drag_timescale(1.0e-6, 3000.0, &drag).unwrap();
        assert!((t - 3000.0 * 1.0e-6 / (2.0e-6 * 400.0)).abs() < 1e-9);
    }
}
