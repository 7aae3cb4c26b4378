//! Rectangular scalar fields and the cached gradient grid.
//!
//! The terrain is a node-centered grid of elevations over an axis-aligned
//! rectangle. Channels sample it bilinearly; the simulation precomputes the
//! gradient once per terrain into a [`VectorGrid2`] so advection never pays
//! for repeated finite differencing.

use glam::DVec2;

/// Axis-aligned rectangle in world coordinates (meters).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Box2D {
    pub min: DVec2,
    pub max: DVec2,
}

impl Box2D {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Extent along each axis.
    #[inline]
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Component-wise clamp of `p` into the rectangle.
    #[inline]
    pub fn clamp(&self, p: DVec2) -> DVec2 {
        p.clamp(self.min, self.max)
    }
}

/// Node-centered scalar grid over a [`Box2D`] with bilinear sampling.
#[derive(Clone, Debug)]
pub struct ScalarField2D {
    bounds: Box2D,
    nx: usize,
    ny: usize,
    values: Vec<f64>,
}

impl ScalarField2D {
    /// Create a zero-valued field. Resolution must be at least 2x2.
    pub fn new(bounds: Box2D, nx: usize, ny: usize) -> Self {
        assert!(nx >= 2 && ny >= 2, "field resolution must be at least 2x2");
        Self {
            bounds,
            nx,
            ny,
            values: vec![0.0; nx * ny],
        }
    }

    /// Create a field by evaluating `f` at every grid node.
    pub fn from_fn(bounds: Box2D, nx: usize, ny: usize, f: impl Fn(DVec2) -> f64) -> Self {
        let mut field = Self::new(bounds, nx, ny);
        for j in 0..ny {
            for i in 0..nx {
                let p = field.node_position(i, j);
                let idx = field.idx(i, j);
                field.values[idx] = f(p);
            }
        }
        field
    }

    #[inline]
    pub fn bounds(&self) -> Box2D {
        self.bounds
    }

    #[inline]
    pub fn resolution(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// World-space spacing between adjacent nodes.
    #[inline]
    pub fn cell_size(&self) -> DVec2 {
        let size = self.bounds.size();
        DVec2::new(size.x / (self.nx - 1) as f64, size.y / (self.ny - 1) as f64)
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    /// World position of node `(i, j)`.
    #[inline]
    pub fn node_position(&self, i: usize, j: usize) -> DVec2 {
        self.bounds.min + self.cell_size() * DVec2::new(i as f64, j as f64)
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.values[self.idx(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let idx = self.idx(i, j);
        self.values[idx] = value;
    }

    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        self.bounds.contains(p)
    }

    /// Minimum and maximum stored value.
    pub fn value_range(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &v in &self.values {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        (lo, hi)
    }

    /// Bilinear sample at an arbitrary world position.
    ///
    /// Positions outside the domain are clamped onto it first.
    pub fn sample(&self, p: DVec2) -> f64 {
        let p = self.bounds.clamp(p);
        let cell = self.cell_size();
        let u = (p.x - self.bounds.min.x) / cell.x;
        let v = (p.y - self.bounds.min.y) / cell.y;
        let i = (u.floor() as usize).min(self.nx - 2);
        let j = (v.floor() as usize).min(self.ny - 2);
        let fx = (u - i as f64).clamp(0.0, 1.0);
        let fy = (v - j as f64).clamp(0.0, 1.0);

        let v00 = self.values[self.idx(i, j)];
        let v10 = self.values[self.idx(i + 1, j)];
        let v01 = self.values[self.idx(i, j + 1)];
        let v11 = self.values[self.idx(i + 1, j + 1)];

        let bottom = v00 + (v10 - v00) * fx;
        let top = v01 + (v11 - v01) * fx;
        bottom + (top - bottom) * fy
    }

    /// Gradient by central differences over one grid cell.
    pub fn gradient(&self, p: DVec2) -> DVec2 {
        let cell = self.cell_size();
        let dx = DVec2::new(cell.x, 0.0);
        let dy = DVec2::new(0.0, cell.y);
        DVec2::new(
            (self.sample(p + dx) - self.sample(p - dx)) / (2.0 * cell.x),
            (self.sample(p + dy) - self.sample(p - dy)) / (2.0 * cell.y),
        )
    }

    /// Precompute the gradient at every node into a vector grid.
    pub fn gradient_grid(&self) -> VectorGrid2 {
        let mut grid = VectorGrid2::new(self.bounds, self.nx, self.ny);
        for j in 0..self.ny {
            for i in 0..self.nx {
                let g = self.gradient(self.node_position(i, j));
                grid.set(i, j, g);
            }
        }
        grid
    }
}

/// Node-centered grid of 2D vectors over the same domain layout as
/// [`ScalarField2D`]. Used to cache the terrain gradient.
#[derive(Clone, Debug)]
pub struct VectorGrid2 {
    bounds: Box2D,
    nx: usize,
    ny: usize,
    values: Vec<DVec2>,
}

impl VectorGrid2 {
    pub fn new(bounds: Box2D, nx: usize, ny: usize) -> Self {
        assert!(nx >= 2 && ny >= 2, "grid resolution must be at least 2x2");
        Self {
            bounds,
            nx,
            ny,
            values: vec![DVec2::ZERO; nx * ny],
        }
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        j * self.nx + i
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> DVec2 {
        self.values[self.idx(i, j)]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: DVec2) {
        let idx = self.idx(i, j);
        self.values[idx] = value;
    }

    /// Bilinear sample, clamping the position into the domain.
    pub fn sample(&self, p: DVec2) -> DVec2 {
        let p = self.bounds.clamp(p);
        let size = self.bounds.size();
        let u = (p.x - self.bounds.min.x) / size.x * (self.nx - 1) as f64;
        let v = (p.y - self.bounds.min.y) / size.y * (self.ny - 1) as f64;
        let i = (u.floor() as usize).min(self.nx - 2);
        let j = (v.floor() as usize).min(self.ny - 2);
        let fx = (u - i as f64).clamp(0.0, 1.0);
        let fy = (v - j as f64).clamp(0.0, 1.0);

        let bottom = self.values[self.idx(i, j)].lerp(self.values[self.idx(i + 1, j)], fx);
        let top = self.values[self.idx(i, j + 1)].lerp(self.values[self.idx(i + 1, j + 1)], fx);
        bottom.lerp(top, fy)
    }
}
