//! Radiation pressure and the blow-out size.
//!
//! The lightness ratio β compares radiation pressure against gravity for a
//! grain of size `s` around a hot central body of luminosity
//! L = 4πR²σT⁴:
//!
//! ```text
//! β(s) = 3 L ⟨Q_pr⟩(s, T) / (16 π c G M ρ s)
//! ```
//!
//! Grains with β above a fixed threshold are unbound. The blow-out size is
//! where β crosses that threshold on the descending branch of β(s); it is
//! located by a logarithmic grid scan followed by bisection.

use cinder_core::constants::{C_LIGHT, G, SIGMA_SB};
use cinder_core::{PhysicalParameters, StepError};
use cinder_tables::Efficiency;

/// Canonical β threshold above which grains are unbound.
pub const BLOWOUT_BETA_THRESHOLD: f64 = 0.5;

/// Default size bracket for the blow-out search (m).
const SEARCH_BOUNDS: (f64, f64) = (1.0e-9, 1.0e-2);

/// Grid samples for locating the descending threshold crossing.
const SEARCH_SAMPLES: usize = 256;

/// Bisection iterations for refining the crossing.
const BISECT_ITERS: usize = 64;

// ── β ──────────────────────────────────────────────────────────────

/// Lightness ratio β for a grain of size `s` at body temperature `t_k`.
///
/// # Errors
///
/// Propagates a table error when the efficiency source cannot answer.
pub fn lightness_ratio(
    s: f64,
    t_k: f64,
    efficiency: &Efficiency,
    params: &PhysicalParameters,
) -> Result<f64, StepError> {
    let qpr = efficiency.evaluate(s, t_k)?;
    Ok(beta_from_qpr(s, t_k, qpr, params))
}

/// β given an already-resolved ⟨Q_pr⟩ value.
pub fn beta_from_qpr(s: f64, t_k: f64, qpr: f64, params: &PhysicalParameters) -> f64 {
    let luminosity =
        4.0 * std::f64::consts::PI * params.r_central.powi(2) * SIGMA_SB * t_k.powi(4);
    let num = 3.0 * luminosity * qpr;
    let den = 16.0 * std::f64::consts::PI
        * C_LIGHT
        * G
        * params.m_central
        * params.rho_grain
        * s;
    num / den
}

// ── Blow-out size ──────────────────────────────────────────────────

/// Outcome of the run-start blow-out classification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BlowoutCase {
    /// β at the configured minimum size reaches the threshold; grains at
    /// and below `size` are unbound.
    Blowout {
        /// Blow-out grain radius (m).
        size: f64,
    },
    /// β stays below the threshold everywhere; no grain is unbound.
    NoBlowout {
        /// Maximum β found over the search grid.
        beta_max: f64,
    },
}

impl BlowoutCase {
    /// Stable tag used in records and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blowout { .. } => "blowout",
            Self::NoBlowout { .. } => "no_blowout",
        }
    }
}

/// Locate the grain size where β falls through `threshold`.
///
/// β(s) rises through the Rayleigh regime, peaks near the size parameter
/// of order unity, then decays as 1/s. The search samples β on a log grid
/// over the configured bracket, finds the peak, and looks for the first
/// sample on the descending branch at or below the threshold. Returns
/// `Ok(None)` when β never reaches the threshold (no blow-out for these
/// parameters).
///
/// # Errors
///
/// - table errors from the efficiency source;
/// - [`StepError::BracketFailed`] when β exceeds the threshold at the
///   peak but never descends back through it inside the bracket — an
///   inconsistent efficiency curve for this model.
pub fn blowout_size(
    t_k: f64,
    efficiency: &Efficiency,
    params: &PhysicalParameters,
    threshold: f64,
) -> Result<Option<f64>, StepError> {
    let (s_lo, s_hi) = SEARCH_BOUNDS;
    let log_lo = s_lo.log10();
    let log_hi = s_hi.log10();
    let n = SEARCH_SAMPLES;

    let mut betas = Vec::with_capacity(n);
    let mut sizes = Vec::with_capacity(n);
    for k in 0..n {
        let frac = k as f64 / (n - 1) as f64;
        let s = 10.0_f64.powf(log_lo + frac * (log_hi - log_lo));
        sizes.push(s);
        betas.push(lightness_ratio(s, t_k, efficiency, params)?);
    }

    let (imax, &beta_max) = betas
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .expect("non-empty grid");
    if beta_max <= threshold {
        return Ok(None);
    }

    // First sample on the descending branch at or below the threshold.
    let Some(j) = (imax..n).find(|&j| betas[j] <= threshold) else {
        return Err(StepError::BracketFailed {
            threshold,
            beta_max,
        });
    };

    // Bisect inside [sizes[j-1], sizes[j]]; β is above the threshold on the
    // left edge and at or below it on the right edge.
    let mut lo = sizes[j - 1];
    let mut hi = sizes[j];
    for _ in 0..BISECT_ITERS {
        let mid = (lo * hi).sqrt();
        let b = lightness_ratio(mid, t_k, efficiency, params)?;
        if b > threshold {
            lo = mid;
        } else {
            hi = mid;
        }
        if (hi - lo) / hi < 1.0e-12 {
            break;
        }
    }
    Ok(Some((lo * hi).sqrt()))
}

// ── Per-step resolution ────────────────────────────────────────────

/// Radiation parameters resolved once per step (or sub-step).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiationResolution {
    /// ⟨Q_pr⟩ at the minimum grain size.
    pub qpr: f64,
    /// β at the minimum grain size.
    pub beta_at_s_min: f64,
    /// Blow-out size, when β crosses the threshold (m).
    pub blowout_size: Option<f64>,
    /// Classification for gating and reporting.
    pub case: BlowoutCase,
}

/// Resolve ⟨Q_pr⟩, β(s_min), and the blow-out size for one step.
///
/// # Errors
///
/// Table and bracketing failures propagate unchanged; both indicate an
/// invalid or self-inconsistent configuration.
pub fn resolve_radiation(
    t_k: f64,
    efficiency: &Efficiency,
    params: &PhysicalParameters,
    threshold: f64,
) -> Result<RadiationResolution, StepError> {
    let qpr = efficiency.evaluate(params.s_min, t_k)?;
    let beta_at_s_min = beta_from_qpr(params.s_min, t_k, qpr, params);
    let blowout = blowout_size(t_k, efficiency, params, threshold)?;
    let case = match blowout {
        Some(size) if beta_at_s_min >= threshold => BlowoutCase::Blowout { size },
        Some(_) | None => BlowoutCase::NoBlowout {
            beta_max: beta_at_s_min,
        },
    };
    Ok(RadiationResolution {
        qpr,
        beta_at_s_min,
        blowout_size: blowout,
        case,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_tables::AnalyticQpr;

    fn params() -> PhysicalParameters {
        PhysicalParameters {
            m_central: 6.4171e23,
            r_central: 3.3895e6,
            orbit_radius: 3.0 * 3.3895e6,
            rho_grain: 3000.0,
            molar_mass: 0.0601,
            alpha_evap: 0.1,
            opacity: 1.0,
            s_min: 1.0e-7,
            s_ref: 1.0e-6,
        }
    }

    fn analytic() -> Efficiency {
        Efficiency::Analytic(AnalyticQpr)
    }

    #[test]
    fn beta_scales_inverse_with_size_at_fixed_qpr() {
        let p = params();
        let b1 = beta_from_qpr(1.0e-6, 2000.0, 1.0, &p);
        let b2 = beta_from_qpr(2.0e-6, 2000.0, 1.0, &p);
        assert!((b1 / b2 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn beta_grows_steeply_with_temperature() {
        let p = params();
        let cold = beta_from_qpr(1.0e-6, 1000.0, 1.0, &p);
        let hot = beta_from_qpr(1.0e-6, 2000.0, 1.0, &p);
        assert!((hot / cold - 16.0).abs() < 1e-9, "T⁴ scaling: {}", hot / cold);
    }

    #[test]
    fn hot_body_produces_blowout_size() {
        let p = params();
        let s = blowout_size(4000.0, &analytic(), &p, BLOWOUT_BETA_THRESHOLD)
            .unwrap()
            .expect("hot body should unbind small grains");
        assert!(s > SEARCH_BOUNDS.0 && s < SEARCH_BOUNDS.1);
        // β at the located size sits on the threshold.
        let b = lightness_ratio(s, 4000.0, &analytic(), &p).unwrap();
        assert!(
            (b - BLOWOUT_BETA_THRESHOLD).abs() < 1.0e-3,
            "β at blow-out size: {b}"
        );
        // Slightly larger grains are bound.
        let b_larger = lightness_ratio(s * 2.0, 4000.0, &analytic(), &p).unwrap();
        assert!(b_larger < BLOWOUT_BETA_THRESHOLD);
    }

    #[test]
    fn cold_body_has_no_blowout() {
        let p = params();
        let res = blowout_size(1000.0, &analytic(), &p, BLOWOUT_BETA_THRESHOLD).unwrap();
        assert!(res.is_none());
    }

    #[test]
    fn resolve_classifies_blowout_by_beta_at_s_min() {
        let p = params();
        let hot = resolve_radiation(4000.0, &analytic(), &p, BLOWOUT_BETA_THRESHOLD).unwrap();
        assert!(hot.beta_at_s_min >= BLOWOUT_BETA_THRESHOLD);
        assert!(matches!(hot.case, BlowoutCase::Blowout { .. }));
        assert_eq!(hot.case.as_str(), "blowout");

        let cold = resolve_radiation(1000.0, &analytic(), &p, BLOWOUT_BETA_THRESHOLD).unwrap();
        assert!(matches!(cold.case, BlowoutCase::NoBlowout { .. }));
        assert_eq!(cold.case.as_str(), "no_blowout");
    }

    #[test]
    fn resolution_is_deterministic() {
        let p = params();
        let a = resolve_radiation(3000.0, &analytic(), &p, BLOWOUT_BETA_THRESHOLD).unwrap();
        let b = resolve_radiation(3000.0, &analytic(), &p, BLOWOUT_BETA_THRESHOLD).unwrap();
        assert_eq!(a, b);
    }
}
