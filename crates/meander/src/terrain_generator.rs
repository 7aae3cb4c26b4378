//! Procedural floodplain terrain for demos and avulsion scenarios.
//!
//! Relief model: a plain tilted gently downstream, with broad fBm relief on
//! the valley sides and a parabolic valley carved along the x axis. The
//! valley axis wanders with a sinusoid plus low-frequency noise so avulsion
//! paths have somewhere interesting to go.

use glam::DVec2;
use noise::{Fbm, NoiseFn, Perlin};

use crate::field::{Box2D, ScalarField2D};

/// Configuration for floodplain generation.
#[derive(Clone, Debug)]
pub struct TerrainConfig {
    pub seed: u32,
    /// Elevation of the upstream edge (m).
    pub base_elevation: f64,
    /// Drop per meter travelled downstream (+x).
    pub downstream_slope: f64,
    /// How deep the valley cuts below the surrounding plain (m).
    pub valley_depth: f64,
    /// Half-width of the valley cross-section (m).
    pub valley_width: f64,
    /// Amplitude of the broad fBm relief (m).
    pub relief_amplitude: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            base_elevation: 80.0,
            downstream_slope: 2.0e-3, // 2 m per km
            valley_depth: 12.0,
            valley_width: 600.0,
            relief_amplitude: 6.0,
        }
    }
}

/// Generate a floodplain heightfield over `bounds` at `(nx, ny)` resolution.
pub fn generate_floodplain_terrain(
    bounds: Box2D,
    nx: usize,
    ny: usize,
    config: &TerrainConfig,
) -> ScalarField2D {
    let relief_noise: Fbm<Perlin> = Fbm::new(config.seed);
    let axis_noise: Fbm<Perlin> = Fbm::new(config.seed + 1);

    let valley_center_y = bounds.center().y;

    ScalarField2D::from_fn(bounds, nx, ny, |p: DVec2| {
        // Valley axis wanders along x: sinusoid plus low-frequency noise.
        let axis_offset =
            (p.x * 0.001).sin() * 0.2 * config.valley_width + axis_noise.get([p.x * 0.0004, 0.0]) * 0.3 * config.valley_width;
        let axis_y = valley_center_y + axis_offset;
        let dist_from_axis = (p.y - axis_y).abs();

        // Tilted plain with broad relief.
        let plain = config.base_elevation - config.downstream_slope * (p.x - bounds.min.x)
            + relief_noise.get([p.x * 0.0008, p.y * 0.0008]) * config.relief_amplitude;

        // Parabolic valley: deepest at the axis, flat beyond valley_width.
        let t = (dist_from_axis / config.valley_width).min(1.0);
        let carve = config.valley_depth * (1.0 - t * t);

        plain - carve
    })
}

/// Initial channel centerline down the valley axis: a gentle sinusoid at
/// the requested spacing, ready for `add_channel`.
pub fn initial_channel_points(bounds: Box2D, spacing: f64, amplitude: f64) -> Vec<DVec2> {
    let size = bounds.size();
    let n = (size.x / spacing).floor() as usize + 1;
    let center_y = bounds.center().y;
    (0..n)
        .map(|i| {
            let x = bounds.min.x + i as f64 * spacing;
            let y = center_y + amplitude * (x * 0.002).sin();
            DVec2::new(x.min(bounds.max.x), y)
        })
        .collect()
}
