//! Simulation parameters.
//!
//! All tunables live in one immutable record handed to the simulation
//! constructor, so independent simulations with different parameter sets can
//! coexist in one process. Defaults follow Ikeda et al. (1981) and
//! Howard & Knutson (1984) in SI units.

use serde::{Deserialize, Serialize};

/// Seconds in a year, for expressing migration constants in m/s.
const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;

/// Tunable parameters for meander evolution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Local curvature coefficient (Ikeda et al., 1981).
    pub omega: f64,
    /// Total migration rate coefficient (Howard & Knutson, 1984).
    pub gamma: f64,
    /// Decay constant of the upstream convolution weight.
    pub k: f64,
    /// Migration rate constant (m/s).
    pub k1: f64,
    /// Dimensionless Chezy friction factor.
    pub cf: f64,
    /// Time step (s).
    pub dt: f64,
    /// Vertical slope-driven erosion rate constant (m/s).
    pub kv: f64,
    /// Magnitude clamp applied to the terrain gradient during advection.
    pub max_slope: f64,
    /// Migration rate threshold above which a channel may avulse.
    pub t_avulsion: f64,
    /// Minimum channel length before avulsion is considered (m).
    pub t_avulsion_length: f64,
    /// Probability that a channel meeting the avulsion preconditions
    /// actually avulses this step. 1.0 makes avulsion deterministic.
    pub p_avulsion: f64,
    /// Fraction of vertices at each end with migration suppressed.
    pub channel_falloff: f64,
    /// Maximum distance between consecutive channel points (m).
    pub sampling_distance: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            omega: -1.0,
            gamma: 2.5,
            k: 1.0,
            k1: 60.0 / SECONDS_PER_YEAR,
            cf: 0.011,
            dt: 9_460_800.0, // ~0.3 yr
            kv: 1.0e-12,
            max_slope: 0.1,
            t_avulsion: 5.0e-8,
            t_avulsion_length: 250.0,
            p_avulsion: 1.0,
            channel_falloff: 0.1,
            sampling_distance: 50.0,
        }
    }
}
