//! Sublimation via the Hertz–Knudsen–Langmuir net flux.
//!
//! The evaporative mass flux off a grain surface is driven by the excess
//! of saturation vapor pressure over the ambient partial pressure:
//!
//! ```text
//! J = α (P_sat(T) − P_gas) sqrt(μ / (2π R T))    [kg m⁻² s⁻¹]
//! ```
//!
//! Dividing the bulk density by the flux gives a radius-shrink rate and,
//! for a representative grain size, a characteristic depletion timescale
//! t_sub = ρ s_ref / J.

use cinder_core::constants::R_GAS;
use cinder_core::{PhysicalParameters, StepError};
use cinder_tables::VaporPressure;

/// Sublimation model parameters, immutable for a run.
#[derive(Clone, Debug)]
pub struct SublimationParams {
    /// Saturation vapor pressure source.
    pub vapor_pressure: VaporPressure,
    /// Ambient partial pressure of the vapor species (Pa).
    pub ambient_pressure_pa: f64,
}

impl SublimationParams {
    /// Vacuum ambient with a Clausius-type fit.
    pub fn clausius(a: f64, b: f64) -> Self {
        Self {
            vapor_pressure: VaporPressure::Clausius { a, b },
            ambient_pressure_pa: 0.0,
        }
    }
}

/// Net evaporative mass flux J(T) (kg m⁻² s⁻¹). Zero when the ambient
/// pressure meets or exceeds saturation.
///
/// # Errors
///
/// Returns [`StepError::InvalidTemperature`] for non-finite or
/// non-positive temperatures.
pub fn mass_flux_hkl(
    temp_k: f64,
    params: &PhysicalParameters,
    sub: &SublimationParams,
) -> Result<f64, StepError> {
    if !temp_k.is_finite() || temp_k <= 0.0 {
        return Err(StepError::InvalidTemperature { value: temp_k });
    }
    let p_sat = sub.vapor_pressure.evaluate(temp_k);
    let excess = (p_sat - sub.ambient_pressure_pa).max(0.0);
    if excess <= 0.0 {
        return Ok(0.0);
    }
    let root = (params.molar_mass / (2.0 * std::f64::consts::PI * R_GAS * temp_k)).sqrt();
    Ok(params.alpha_evap * excess * root)
}

/// Depletion timescale t_sub = ρ s_ref / J for the representative grain.
/// `None` when the net flux vanishes (no sublimation sink).
///
/// # Errors
///
/// Propagates temperature validation from [`mass_flux_hkl`].
pub fn sublimation_timescale(
    temp_k: f64,
    params: &PhysicalParameters,
    sub: &SublimationParams,
) -> Result<Option<f64>, StepError> {
    let flux = mass_flux_hkl(temp_k, params, sub)?;
    if flux <= 0.0 {
        return Ok(None);
    }
    Ok(Some(params.rho_grain * params.s_ref / flux))
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

    // Forsterite-like fit: negligible below ~1300 K, strong above 2000 K.
    fn sub() -> SublimationParams {
        SublimationParams::clausius(13.2, 2.66e4)
    }

    #[test]
    fn flux_grows_with_temperature() {
        let p = params();
        let s = sub();
        let cold = mass_flux_hkl(1400.0, &p, &s).unwrap();
        let hot = mass_flux_hkl(2200.0, &p, &s).unwrap();
        assert!(hot > cold);
        assert!(cold > 0.0);
    }

    #[test]
    fn ambient_pressure_quenches_flux() {
        let p = params();
        let mut s = sub();
        let free = mass_flux_hkl(1800.0, &p, &s).unwrap();
        s.ambient_pressure_pa = s.vapor_pressure.evaluate(1800.0);
        let quenched = mass_flux_hkl(1800.0, &p, &s).unwrap();
        assert!(free > 0.0);
        assert_eq!(quenched, 0.0);
    }

    #[test]
    fn timescale_inverse_to_flux() {
        let p = params();
        let s = sub();
        let t = sublimation_timescale(2000.0, &p, &s).unwrap().unwrap();
        let j = mass_flux_hkl(2000.0, &p, &s).unwrap();
        assert!((t - p.rho_grain * p.s_ref / j).abs() / t < 1e-12);
    }

    #[test]
    fn zero_flux_means_no_sink() {
        let p = params();
        let mut s = sub();
        s.ambient_pressure_pa = 1.0e30;
        assert!(sublimation_timescale(1500.0, &p, &s).unwrap().is_none());
    }

    #[test]
    fn invalid_temperature_is_rejected() {
        let p = params();
        let s = sub();
        assert!(mass_flux_hkl(f64::NAN, &p, &s).is_err());
        assert!(mass_flux_hkl(-5.0, &p, &s).is_err());
    }
}
