//! Immutable physical parameters shared read-only by every component.

use crate::constants::G;
use crate::error::ConfigError;

/// Material and orbital parameters fixed for the lifetime of a run.
///
/// Constructed once from configuration, then shared by reference. Nothing
/// in the engine mutates these after validation.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicalParameters {
    /// Mass of the central body (kg).
    pub m_central: f64,
    /// Radius of the central body (m).
    pub r_central: f64,
    /// Orbital radius of the representative annulus (m).
    pub orbit_radius: f64,
    /// Bulk density of grain material (kg m⁻³).
    pub rho_grain: f64,
    /// Molar mass of the evaporating species (kg mol⁻¹).
    pub molar_mass: f64,
    /// Sublimation kinetic (evaporation) coefficient α, in (0, 1].
    pub alpha_evap: f64,
    /// Surface mass opacity of the layer (m² kg⁻¹).
    pub opacity: f64,
    /// Smallest grain size retained by the model (m).
    pub s_min: f64,
    /// Representative grain size for sink timescales (m).
    pub s_ref: f64,
}

impl PhysicalParameters {
    /// Keplerian angular velocity Ω = sqrt(G M / r³) at the annulus (s⁻¹).
    pub fn omega(&self) -> f64 {
        (G * self.m_central / self.orbit_radius.powi(3)).sqrt()
    }

    /// Orbital period 2π/Ω (s).
    pub fn orbital_period(&self) -> f64 {
        2.0 * std::f64::consts::PI / self.omega()
    }

    /// Check that every parameter is finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, f64); 9] = [
            ("m_central", self.m_central),
            ("r_central", self.r_central),
            ("orbit_radius", self.orbit_radius),
            ("rho_grain", self.rho_grain),
            ("molar_mass", self.molar_mass),
            ("alpha_evap", self.alpha_evap),
            ("opacity", self.opacity),
            ("s_min", self.s_min),
            ("s_ref", self.s_ref),
        ];
        for (name, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositiveParameter { name, value });
            }
        }
        if self.alpha_evap > 1.0 {
            return Err(ConfigError::NonPositiveParameter {
                name: "alpha_evap",
                value: self.alpha_evap,
            });
        }
        Ok(())
    }
}
