//! Point attractors and repellers with compact cubic support.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::kernels::cubic_smooth_compact;
use crate::serde_utils;

/// Step used for the numeric gradient of the intensity field (m).
const GRADIENT_EPS: f64 = 1e-2;

/// A fixed point that locally steers channel migration.
///
/// Positive strength pulls channels toward the center, negative strength
/// pushes them away. Influence vanishes outside `radius`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PointConstraint {
    #[serde(
        serialize_with = "serde_utils::serialize_dvec2",
        deserialize_with = "serde_utils::deserialize_dvec2"
    )]
    pub center: DVec2,
    pub radius: f64,
    pub strength: f64,
}

impl PointConstraint {
    pub fn new(center: DVec2, radius: f64, strength: f64) -> Self {
        Self {
            center,
            radius,
            strength,
        }
    }

    /// Scalar intensity at `p`: strength-weighted compact cubic falloff of
    /// the squared distance to the center.
    pub fn intensity(&self, p: DVec2) -> f64 {
        let d2 = p.distance_squared(self.center);
        self.strength * cubic_smooth_compact(d2, self.radius * self.radius)
    }

    /// Directional influence at `p`: the numeric gradient of the intensity
    /// field by central differences.
    pub fn direction(&self, p: DVec2) -> DVec2 {
        let ex = DVec2::new(GRADIENT_EPS, 0.0);
        let ey = DVec2::new(0.0, GRADIENT_EPS);
        DVec2::new(
            (self.intensity(p + ex) - self.intensity(p - ex)) / (2.0 * GRADIENT_EPS),
            (self.intensity(p + ey) - self.intensity(p - ey)) / (2.0 * GRADIENT_EPS),
        )
    }
}
