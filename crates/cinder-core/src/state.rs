//! Simulation state and the per-channel loss ledger.
//!
//! [`SimulationState`] is owned exclusively by the run driver and mutated
//! once per accepted step. All physics evaluations are pure functions over
//! a snapshot of this state; nothing else holds mutable references to it.

use indexmap::IndexMap;

// ── LossChannel ────────────────────────────────────────────────────

/// The closed set of mass-loss channels tracked by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LossChannel {
    /// Radiation-pressure blow-out of unbound grains.
    Blowout,
    /// Collisional grinding below the resolved size floor.
    Collisions,
    /// Sublimation driven by the net evaporative flux.
    Sublimation,
    /// Gas drag into the ambient gas envelope.
    GasDrag,
    /// Hydrodynamic escape of vapor-dominated material.
    HydroEscape,
    /// Material discarded by the τ=1 ceiling clip.
    TauClip,
}

impl LossChannel {
    /// All channels, in reporting order.
    pub const ALL: [LossChannel; 6] = [
        LossChannel::Blowout,
        LossChannel::Collisions,
        LossChannel::Sublimation,
        LossChannel::GasDrag,
        LossChannel::HydroEscape,
        LossChannel::TauClip,
    ];

    /// Stable name used in records and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blowout => "blowout",
            Self::Collisions => "collisions",
            Self::Sublimation => "sublimation",
            Self::GasDrag => "gas_drag",
            Self::HydroEscape => "hydro_escape",
            Self::TauClip => "tau_clip_spill",
        }
    }
}

impl std::fmt::Display for LossChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── LossLedger ─────────────────────────────────────────────────────

/// Cumulative mass lost per channel (kg m⁻², same areal units as Σ).
///
/// Totals are monotonically non-decreasing: [`add()`](LossLedger::add)
/// ignores non-finite and negative contributions rather than letting a
/// degenerate flux unwind history.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LossLedger {
    totals: IndexMap<LossChannel, f64>,
}

impl LossLedger {
    /// Empty ledger with every channel present at zero.
    pub fn new() -> Self {
        let mut totals = IndexMap::with_capacity(LossChannel::ALL.len());
        for ch in LossChannel::ALL {
            totals.insert(ch, 0.0);
        }
        Self { totals }
    }

    /// Accumulate `mass` into `channel`. Negative or non-finite
    /// contributions are dropped.
    pub fn add(&mut self, channel: LossChannel, mass: f64) {
        if mass.is_finite() && mass > 0.0 {
            *self.totals.entry(channel).or_insert(0.0) += mass;
        }
    }

    /// Cumulative loss for one channel.
    pub fn get(&self, channel: LossChannel) -> f64 {
        self.totals.get(&channel).copied().unwrap_or(0.0)
    }

    /// Sum over all channels.
    pub fn total(&self) -> f64 {
        self.totals.values().sum()
    }

    /// Iterate `(channel, cumulative mass)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (LossChannel, f64)> + '_ {
        self.totals.iter().map(|(ch, v)| (*ch, *v))
    }
}

// ── SimulationState ────────────────────────────────────────────────

/// The lumped state of the dust surface layer.
///
/// Exclusively owned by the run driver; step functions receive it by
/// reference and return updates, they never mutate shared state.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationState {
    /// Elapsed simulation time (s). Strictly increasing.
    pub time_s: f64,
    /// Surface mass density Σ of the optically thin layer (kg m⁻²). ≥ 0.
    pub sigma_surf: f64,
    /// Optional discretized size distribution: number surface density per
    /// bin (m⁻²), each ≥ 0. `None` for the scalar (single-Σ) path.
    pub bins: Option<Vec<f64>>,
    /// Cumulative mass lost, by channel.
    pub losses: LossLedger,
}

impl SimulationState {
    /// Scalar-path state starting at `sigma_surf` and t = 0.
    pub fn new(sigma_surf: f64) -> Self {
        Self {
            time_s: 0.0,
            sigma_surf,
            bins: None,
            losses: LossLedger::new(),
        }
    }

    /// Multi-bin state; `sigma_surf` is derived as Σ_k m_k N_k by the caller.
    pub fn with_bins(sigma_surf: f64, bins: Vec<f64>) -> Self {
        Self {
            time_s: 0.0,
            sigma_surf,
            bins: Some(bins),
            losses: LossLedger::new(),
        }
    }
}
