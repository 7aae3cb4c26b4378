//! Meandering river evolution over geological time.
//!
//! A centerline simulation of the Howard & Knutson (1984) migration model:
//! per-vertex migration rates from local curvature plus an exponentially
//! weighted upstream convolution, terrain-aware lateral advection, neck
//! cutoffs leaving frozen oxbow remnants, and steepest-descent avulsion
//! re-routing across the floodplain.
//!
//! # Example
//!
//! ```
//! use glam::DVec2;
//! use meander::{Box2D, MeanderSimulation, ScalarField2D};
//!
//! let domain = Box2D::new(DVec2::ZERO, DVec2::new(5_000.0, 2_000.0));
//! let terrain = ScalarField2D::new(domain, 128, 64);
//! let mut sim = MeanderSimulation::new(42, terrain);
//!
//! let points: Vec<DVec2> = (0..100)
//!     .map(|i| DVec2::new(i as f64 * 50.0, 1_000.0))
//!     .collect();
//! sim.add_channel(points, 40.0).unwrap();
//!
//! sim.step_n(10);
//! assert_eq!(sim.channels().len(), 1);
//! ```

pub mod channel;
pub mod config;
pub mod constraint;
pub mod error;
pub mod export;
pub mod field;
pub mod kernels;
pub mod serde_utils;
pub mod terrain_generator;

pub use channel::Channel;
pub use config::SimulationParams;
pub use constraint::PointConstraint;
pub use error::InputError;
pub use field::{Box2D, ScalarField2D, VectorGrid2};
pub use glam::{DVec2, DVec3};
pub use terrain_generator::{generate_floodplain_terrain, initial_channel_points, TerrainConfig};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Meander evolution simulation over a terrain heightfield.
///
/// The terrain defines the simulation domain and is read-only after
/// construction; its gradient is cached once into a [`VectorGrid2`].
/// Channels and constraints are owned and mutated exclusively by the
/// simulation. With a fixed seed, terrain, channels and parameters,
/// stepping is reproducible.
pub struct MeanderSimulation {
    params: SimulationParams,
    terrain: ScalarField2D,
    gradient: VectorGrid2,
    channels: Vec<Channel>,
    constraints: Vec<PointConstraint>,
    rng: ChaCha8Rng,
}

impl MeanderSimulation {
    /// Create a simulation with default parameters.
    pub fn new(seed: u64, terrain: ScalarField2D) -> Self {
        Self::with_params(seed, terrain, SimulationParams::default())
    }

    /// Create a simulation with an explicit parameter record.
    pub fn with_params(seed: u64, terrain: ScalarField2D, params: SimulationParams) -> Self {
        let gradient = terrain.gradient_grid();
        Self {
            params,
            terrain,
            gradient,
            channels: Vec::new(),
            constraints: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Simulation domain, as defined by the terrain.
    pub fn domain(&self) -> Box2D {
        self.terrain.bounds()
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn terrain(&self) -> &ScalarField2D {
        &self.terrain
    }

    /// Read-only view of all channels, oxbow remnants included.
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn constraints(&self) -> &[PointConstraint] {
        &self.constraints
    }

    /// Add a channel from a centerline polyline.
    ///
    /// Rejects polylines with fewer than 4 points, any point outside the
    /// domain, or a non-positive width; rejection leaves the simulation
    /// unchanged.
    pub fn add_channel(&mut self, points: Vec<DVec2>, width: f64) -> Result<(), InputError> {
        if points.len() < 4 {
            return Err(InputError::TooFewPoints(points.len()));
        }
        if width <= 0.0 {
            return Err(InputError::NonPositiveWidth(width));
        }
        let domain = self.domain();
        if let Some(p) = points.iter().find(|p| !domain.contains(**p)) {
            return Err(InputError::PointOutsideDomain(p.x, p.y));
        }
        self.channels.push(Channel::new(points, width));
        Ok(())
    }

    /// Add a point attractor (positive strength) or repeller (negative).
    pub fn add_point_constraint(
        &mut self,
        center: DVec2,
        radius: f64,
        strength: f64,
    ) -> Result<(), InputError> {
        if radius <= 0.0 {
            return Err(InputError::NonPositiveRadius(radius));
        }
        self.constraints
            .push(PointConstraint::new(center, radius, strength));
        Ok(())
    }

    /// Advance the simulation by one time step.
    pub fn step(&mut self) {
        self.compute_migration_rates();
        self.migrate_all_channels();
        self.manage_cutoffs();
        self.manage_avulsion();
        self.resample_channels();
        self.sanity_check_channels();
    }

    /// Advance the simulation by `n` time steps.
    pub fn step_n(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Manually run the avulsion pass: recompute migration rates, then
    /// re-route every live channel that satisfies the avulsion
    /// preconditions. The probabilistic gate does not apply here.
    pub fn trigger_avulsion(&mut self) {
        self.compute_migration_rates();
        for channel in &mut self.channels {
            if channel.is_frozen() {
                continue;
            }
            if let Some(start) = channel.avulsion_candidate(&self.params) {
                channel.avulse(start, &self.terrain, &self.params);
            }
        }
        self.resample_channels();
        self.sanity_check_channels();
    }

    /// Render the terrain and all channels to a raster image on disk.
    pub fn output_image(
        &self,
        path: impl AsRef<Path>,
        width: u32,
        height: u32,
    ) -> image::ImageResult<()> {
        export::render(&self.terrain, &self.channels, width, height).save(path)
    }

    // ========== Step phases ==========

    fn compute_migration_rates(&mut self) {
        for channel in self.channels.iter_mut().filter(|c| !c.is_frozen()) {
            channel.compute_migration_rates(&self.params);
        }
    }

    fn migrate_all_channels(&mut self) {
        let domain = self.terrain.bounds();
        for channel in self.channels.iter_mut().filter(|c| !c.is_frozen()) {
            channel.migrate(&self.params, domain, &self.gradient, &self.constraints);
        }
    }

    /// Resolve self-intersections one cutoff at a time until a full pass
    /// over all live channels finds none. Severed loops are appended as
    /// frozen oxbow remnants.
    fn manage_cutoffs(&mut self) {
        loop {
            let mut found = None;
            for (ci, channel) in self.channels.iter().enumerate() {
                if channel.is_frozen() {
                    continue;
                }
                if let Some((i, j, hit)) = channel.find_cutoff() {
                    found = Some((ci, i, j, hit));
                    break;
                }
            }
            match found {
                Some((ci, i, j, hit)) => {
                    let oxbow = self.channels[ci].cutoff(i, j, hit);
                    self.channels.push(oxbow);
                }
                None => break,
            }
        }
    }

    /// One avulsion pass over live channels. Each triggered avulsion
    /// mutates exactly one channel; failed path generation is silent.
    fn manage_avulsion(&mut self) {
        for channel in &mut self.channels {
            if channel.is_frozen() {
                continue;
            }
            let Some(start) = channel.avulsion_candidate(&self.params) else {
                continue;
            };
            if self.params.p_avulsion < 1.0 && self.rng.gen::<f64>() >= self.params.p_avulsion {
                continue;
            }
            channel.avulse(start, &self.terrain, &self.params);
        }
    }

    fn resample_channels(&mut self) {
        for channel in &mut self.channels {
            channel.resample(self.params.sampling_distance);
        }
    }

    /// Debug builds assert on degenerate channels; release builds drop the
    /// offending channel with a warning.
    fn sanity_check_channels(&mut self) {
        let domain = self.terrain.bounds();
        self.channels.retain(|channel| {
            match channel.degeneracy(domain) {
                None => true,
                Some(reason) => {
                    debug_assert!(false, "degenerate channel after step: {reason}");
                    log::warn!("dropping degenerate channel: {reason}");
                    false
                }
            }
        });
    }
}
