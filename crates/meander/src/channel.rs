//! Channel centerline: discrete geometry, migration rates, lateral
//! advection and the topology-changing events (neck cutoffs, avulsion).
//!
//! A channel is an ordered polyline of world-space vertices with a constant
//! width. Migration follows the Howard & Knutson (1984) model: a local rate
//! proportional to scaled curvature (Ikeda et al., 1981) plus an
//! exponentially weighted convolution of upstream local rates. Vertices are
//! advected along the local normal, steered by the terrain gradient and any
//! point constraints, with both endpoints pinned.

use glam::DVec2;

use crate::config::SimulationParams;
use crate::constraint::PointConstraint;
use crate::field::{Box2D, ScalarField2D, VectorGrid2};
use crate::kernels::smoothstep;

/// Curvature denominators below this are treated as zero curvature.
const CURVATURE_EPS: f64 = 1e-12;
/// Parametric tolerance rejecting colinear or endpoint-touching segments.
const INTERSECT_EPS: f64 = 1e-9;
/// Convolution weights below this no longer contribute upstream influence.
const WEIGHT_CUTOFF: f64 = 1e-12;
/// Terrain gradients below this magnitude cannot drive an avulsion path.
const MIN_DESCENT_GRADIENT: f64 = 1e-12;

/// A simulated river channel.
#[derive(Clone, Debug)]
pub struct Channel {
    points: Vec<DVec2>,
    local_migration_rates: Vec<f64>,
    migration_rates: Vec<f64>,
    width: f64,
    depth: f64,
    frozen: bool,
}

impl Channel {
    /// Create a channel from an ordered centerline polyline.
    ///
    /// Depth is derived from width with the downstream hydraulic geometry
    /// relation `depth = 0.01 * width^0.6`.
    pub fn new(points: Vec<DVec2>, width: f64) -> Self {
        let n = points.len();
        Self {
            points,
            local_migration_rates: vec![0.0; n],
            migration_rates: vec![0.0; n],
            width,
            depth: 0.01 * width.powf(0.6),
            frozen: false,
        }
    }

    #[inline]
    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    #[inline]
    pub fn point(&self, i: usize) -> DVec2 {
        self.points[i]
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> f64 {
        self.depth
    }

    #[inline]
    pub fn migration_rate(&self, i: usize) -> f64 {
        self.migration_rates[i]
    }

    /// Oxbow remnants are frozen: excluded from rate computation, advection
    /// and avulsion, but still resampled and rendered.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    // ========== Geometry ==========

    /// Total polyline length.
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }

    /// Cumulative arc length at every vertex.
    pub fn curvilinear_length(&self) -> Vec<f64> {
        let mut s = Vec::with_capacity(self.points.len());
        let mut acc = 0.0;
        s.push(0.0);
        for w in self.points.windows(2) {
            acc += w[0].distance(w[1]);
            s.push(acc);
        }
        s
    }

    /// Polyline length over straight endpoint distance. Infinite for closed
    /// remnants whose endpoints coincide.
    pub fn sinuosity(&self) -> f64 {
        let chord = self.points[0].distance(*self.points.last().unwrap());
        if chord < CURVATURE_EPS {
            return f64::INFINITY;
        }
        self.length() / chord
    }

    /// Unit tangent at vertex `i`; one-sided at the endpoints.
    pub fn tangent(&self, i: usize) -> DVec2 {
        let n = self.points.len();
        let d = if i == 0 {
            self.points[1] - self.points[0]
        } else if i == n - 1 {
            self.points[n - 1] - self.points[n - 2]
        } else {
            self.points[i + 1] - self.points[i - 1]
        };
        d.normalize_or_zero()
    }

    /// Left-hand unit normal at vertex `i`.
    #[inline]
    pub fn normal(&self, i: usize) -> DVec2 {
        self.tangent(i).perp()
    }

    /// Signed discrete curvature at vertex `i` from the circumscribed
    /// circle of the vertex triangle; zero at the endpoints. The sign
    /// encodes bend direction (positive bends left).
    pub fn curvature(&self, i: usize) -> f64 {
        let n = self.points.len();
        if i == 0 || i >= n - 1 {
            return 0.0;
        }
        let v1 = self.points[i] - self.points[i - 1];
        let v2 = self.points[i + 1] - self.points[i];
        let denom = v1.length() * v2.length() * (v1 + v2).length();
        if denom < CURVATURE_EPS {
            return 0.0;
        }
        2.0 * v1.perp_dot(v2) / denom
    }

    /// Curvature nondimensionalized by channel width.
    #[inline]
    pub fn scaled_curvature(&self, i: usize) -> f64 {
        self.curvature(i) * self.width
    }

    // ========== Migration rates ==========

    /// Compute local and total migration rates for every vertex.
    pub(crate) fn compute_migration_rates(&mut self, params: &SimulationParams) {
        self.compute_local_migration_rates(params);
        self.compute_total_migration_rates(params);
    }

    /// Local rate (Ikeda et al., 1981): `omega * curvature * width`.
    fn compute_local_migration_rates(&mut self, params: &SimulationParams) {
        let n = self.points.len();
        self.local_migration_rates.resize(n, 0.0);
        for i in 0..n {
            self.local_migration_rates[i] = params.omega * self.scaled_curvature(i);
        }
    }

    /// Total rate (Howard & Knutson, 1984): the local rate plus a weighted
    /// integral of upstream local rates, decaying exponentially with arc
    /// length and normalized by the integral of the weight itself.
    fn compute_total_migration_rates(&mut self, params: &SimulationParams) {
        let n = self.points.len();
        let s = self.curvilinear_length();
        let cf_u = 2.0 * params.cf / self.depth;
        let decay = 2.0 * params.k * cf_u;

        let mut total = vec![0.0; n];
        for i in 0..n {
            let mut acc = 0.0;
            let mut norm = 0.0;
            for j in (0..i).rev() {
                let w = (-decay * (s[i] - s[j])).exp();
                if w < WEIGHT_CUTOFF {
                    break;
                }
                let ds = s[j + 1] - s[j];
                acc += self.local_migration_rates[j] * w * ds;
                norm += w * ds;
            }
            let upstream = if norm > 0.0 { acc / norm } else { 0.0 };
            total[i] = params.gamma * (self.local_migration_rates[i] + upstream);
        }

        // Falloff envelope: the first and last channel_falloff * n vertices
        // ramp smoothly to zero so the endpoints never migrate.
        let falloff = ((params.channel_falloff * n as f64).floor() as usize).max(1);
        for (i, rate) in total.iter_mut().enumerate() {
            let head = i as f64 / falloff as f64;
            let tail = (n - 1 - i) as f64 / falloff as f64;
            *rate *= smoothstep(head.min(tail));
        }

        self.migration_rates = total;
    }

    /// Zero the rate buffers after a topology change so they stay parallel
    /// to the point list.
    fn reset_rates(&mut self) {
        let n = self.points.len();
        self.local_migration_rates.clear();
        self.local_migration_rates.resize(n, 0.0);
        self.migration_rates.clear();
        self.migration_rates.resize(n, 0.0);
    }

    // ========== Advection ==========

    /// Advect interior vertices laterally by one time step.
    ///
    /// Reads exclusively from the pre-step point snapshot and writes into a
    /// fresh buffer. A vertex whose new position would leave the domain is
    /// pinned for this step.
    pub(crate) fn migrate(
        &mut self,
        params: &SimulationParams,
        domain: Box2D,
        gradient: &VectorGrid2,
        constraints: &[PointConstraint],
    ) {
        let n = self.points.len();
        if n < 4 {
            return;
        }
        let mut next = self.points.clone();
        for i in 1..n - 1 {
            let p = self.points[i];

            let mut delta = self.normal(i) * (params.k1 * self.migration_rates[i] * params.dt);

            let slope = gradient.sample(p).clamp_length_max(params.max_slope);
            delta -= slope * (params.kv * params.dt);

            let mut drift = DVec2::ZERO;
            for c in constraints {
                drift += c.direction(p);
            }
            delta += drift * params.dt;

            let q = p + delta;
            if domain.contains(q) {
                next[i] = q;
            }
        }
        self.points = next;
    }

    // ========== Cutoffs ==========

    /// Find the first neck cutoff: a pair of non-adjacent intersecting
    /// segments separated by more than `4 * width` of arc length. Returns
    /// the segment indices and the intersection point.
    pub(crate) fn find_cutoff(&self) -> Option<(usize, usize, DVec2)> {
        let n = self.points.len();
        if n < 4 {
            return None;
        }
        let s = self.curvilinear_length();
        let min_separation = 4.0 * self.width;
        for i in 0..n - 1 {
            for j in i + 2..n - 1 {
                if s[j] - s[i] <= min_separation {
                    continue;
                }
                // Cutting here must leave the main channel at least 4 points.
                if i + n - j < 3 {
                    continue;
                }
                if let Some(hit) = segment_intersection(
                    self.points[i],
                    self.points[i + 1],
                    self.points[j],
                    self.points[j + 1],
                ) {
                    return Some((i, j, hit));
                }
            }
        }
        None
    }

    /// Cut the neck between segments `i` and `j` at `hit`.
    ///
    /// The channel keeps its head and tail joined through the neck; the
    /// severed loop is returned as a frozen oxbow remnant of the same width.
    pub(crate) fn cutoff(&mut self, i: usize, j: usize, hit: DVec2) -> Channel {
        let mut oxbow_points = Vec::with_capacity(j - i + 2);
        oxbow_points.push(hit);
        oxbow_points.extend_from_slice(&self.points[i + 1..=j]);
        oxbow_points.push(hit);

        let mut main = Vec::with_capacity(i + 2 + (self.points.len() - j - 1));
        main.extend_from_slice(&self.points[..=i]);
        main.push(hit);
        main.extend_from_slice(&self.points[j + 1..]);

        self.points = main;
        self.reset_rates();

        let mut oxbow = Channel::new(oxbow_points, self.width);
        oxbow.frozen = true;
        oxbow
    }

    // ========== Avulsion ==========

    /// First vertex qualifying for avulsion, if the channel qualifies at
    /// all: long enough, with some vertex migrating past the threshold.
    pub(crate) fn avulsion_candidate(&self, params: &SimulationParams) -> Option<usize> {
        if self.length() < params.t_avulsion_length {
            return None;
        }
        self.migration_rates
            .iter()
            .position(|r| r.abs() >= params.t_avulsion)
            .filter(|&i| i + 1 < self.points.len())
    }

    /// Re-route the channel downstream of `start` along the terrain's
    /// steepest descent. Returns false when no valid path exists; the
    /// channel is then left unchanged.
    pub(crate) fn avulse(
        &mut self,
        start: usize,
        terrain: &ScalarField2D,
        params: &SimulationParams,
    ) -> bool {
        let Some((path, rejoin)) = self.descent_path(start, terrain, params) else {
            return false;
        };

        let mut points = self.points[..=start].to_vec();
        points.extend_from_slice(&path[1..]);
        if let Some(k) = rejoin {
            points.extend_from_slice(&self.points[k..]);
        }
        if points.len() < 4 {
            return false;
        }

        self.points = points;
        self.reset_rates();
        true
    }

    /// Walk the steepest descent from `points[start]`, stepping by the
    /// sampling distance, until the walk rejoins the remaining polyline
    /// (within `2 * width` of a later vertex) or exits the domain. Returns
    /// the path and the rejoin vertex index, or None when the terrain is
    /// flat at the start or the walk stalls before a valid terminus.
    fn descent_path(
        &self,
        start: usize,
        terrain: &ScalarField2D,
        params: &SimulationParams,
    ) -> Option<(Vec<DVec2>, Option<usize>)> {
        let domain = terrain.bounds();
        let step = params.sampling_distance;
        let rejoin_distance = 2.0 * self.width;
        // The walk must first clear the old neck before a rejoin counts.
        let min_travel = 4.0 * self.width;
        let size = domain.size();
        let max_steps = (2.0 * (size.x + size.y) / step).ceil() as usize;

        let mut path = vec![self.points[start]];
        let mut p = self.points[start];
        let mut travelled = 0.0;

        for _ in 0..max_steps {
            let g = terrain.gradient(p);
            if g.length() < MIN_DESCENT_GRADIENT {
                return None;
            }
            let q = p - g.normalize() * step;
            if !domain.contains(q) {
                let exit = domain.clamp(q);
                if exit != *path.last().unwrap() {
                    path.push(exit);
                }
                return Some((path, None));
            }
            path.push(q);
            travelled += step;
            p = q;

            if travelled > min_travel {
                for k in start + 1..self.points.len() {
                    if p.distance(self.points[k]) < rejoin_distance {
                        return Some((path, Some(k)));
                    }
                }
            }
        }
        None
    }

    // ========== Resampling ==========

    /// Re-space the polyline: merge vertices closer than half the sampling
    /// distance, then split segments longer than the sampling distance by
    /// recursive midpoint insertion. Endpoints are preserved exactly and
    /// the operation is idempotent.
    pub(crate) fn resample(&mut self, sampling_distance: f64) {
        self.merge_close_points(sampling_distance);
        self.split_long_segments(sampling_distance);
        self.reset_rates();
    }

    fn merge_close_points(&mut self, sampling_distance: f64) {
        let n = self.points.len();
        if n < 3 {
            return;
        }
        let min_spacing = 0.5 * sampling_distance;
        let mut out = Vec::with_capacity(n);
        out.push(self.points[0]);
        for i in 1..n - 1 {
            // Dropping vertex i keeps everything gathered so far plus the
            // remaining tail including the endpoint.
            let kept_if_dropped = out.len() + (n - i - 1);
            let close = out.last().unwrap().distance(self.points[i]) < min_spacing;
            if close && kept_if_dropped >= 4 {
                continue;
            }
            out.push(self.points[i]);
        }
        out.push(self.points[n - 1]);
        self.points = out;
    }

    fn split_long_segments(&mut self, sampling_distance: f64) {
        let n = self.points.len();
        let mut out = Vec::with_capacity(n);
        for i in 0..n - 1 {
            out.push(self.points[i]);
            subdivide(self.points[i], self.points[i + 1], sampling_distance, &mut out);
        }
        out.push(self.points[n - 1]);
        self.points = out;
    }

    // ========== Sanity ==========

    /// Reason this channel is degenerate, if any: too few points, a NaN
    /// coordinate, an out-of-domain vertex or duplicated adjacent points.
    pub(crate) fn degeneracy(&self, domain: Box2D) -> Option<&'static str> {
        if self.points.len() < 4 {
            return Some("fewer than 4 points");
        }
        for p in &self.points {
            if !p.is_finite() {
                return Some("non-finite coordinate");
            }
            if !domain.contains(*p) {
                return Some("point outside domain");
            }
        }
        if self.points.windows(2).any(|w| w[0] == w[1]) {
            return Some("duplicated adjacent points");
        }
        None
    }
}

/// Insert midpoints between `a` and `b` (exclusive), in order, until no gap
/// exceeds `max_len`.
fn subdivide(a: DVec2, b: DVec2, max_len: f64, out: &mut Vec<DVec2>) {
    if a.distance(b) <= max_len {
        return;
    }
    let mid = (a + b) * 0.5;
    subdivide(a, mid, max_len, out);
    out.push(mid);
    subdivide(mid, b, max_len, out);
}

/// Proper intersection of segments `(a, b)` and `(c, d)` in parametric
/// form. Colinear overlaps and endpoint touches are rejected.
fn segment_intersection(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> Option<DVec2> {
    let r = b - a;
    let s = d - c;
    let denom = r.perp_dot(s);
    if denom.abs() < INTERSECT_EPS {
        return None;
    }
    let ac = c - a;
    let t = ac.perp_dot(s) / denom;
    let u = ac.perp_dot(r) / denom;
    if t > INTERSECT_EPS && t < 1.0 - INTERSECT_EPS && u > INTERSECT_EPS && u < 1.0 - INTERSECT_EPS
    {
        Some(a + r * t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ScalarField2D;

    fn straight_points(n: usize, spacing: f64) -> Vec<DVec2> {
        (0..n).map(|i| DVec2::new(i as f64 * spacing, 0.0)).collect()
    }

    fn test_domain() -> Box2D {
        Box2D::new(DVec2::new(-1e6, -1e6), DVec2::new(1e6, 1e6))
    }

    #[test]
    fn test_depth_derived_from_width() {
        let ch = Channel::new(straight_points(4, 50.0), 50.0);
        assert!((ch.depth() - 0.01 * 50f64.powf(0.6)).abs() < 1e-12);
    }

    #[test]
    fn test_length_and_sinuosity_of_straight_line() {
        let ch = Channel::new(straight_points(11, 10.0), 5.0);
        assert!((ch.length() - 100.0).abs() < 1e-9);
        assert!((ch.sinuosity() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_curvilinear_length_is_cumulative() {
        let ch = Channel::new(straight_points(5, 25.0), 5.0);
        let s = ch.curvilinear_length();
        assert_eq!(s.len(), 5);
        assert_eq!(s[0], 0.0);
        assert!((s[4] - 100.0).abs() < 1e-9);
        assert!(s.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_straight_line_has_zero_curvature() {
        let ch = Channel::new(straight_points(10, 50.0), 50.0);
        for i in 0..ch.size() {
            assert_eq!(ch.curvature(i), 0.0);
        }
    }

    #[test]
    fn test_curvature_sign_encodes_bend_direction() {
        // Left bend: the polyline turns counterclockwise.
        let left = Channel::new(
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(2.0, 1.0),
                DVec2::new(2.0, 2.0),
            ],
            1.0,
        );
        assert!(left.curvature(1) > 0.0);

        let right = Channel::new(
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(2.0, -1.0),
                DVec2::new(2.0, -2.0),
            ],
            1.0,
        );
        assert!(right.curvature(1) < 0.0);
    }

    #[test]
    fn test_curvature_approximates_circle() {
        // Points on a circle of radius 100: discrete curvature ~ 1/100.
        let radius = 100.0;
        let points: Vec<DVec2> = (0..32)
            .map(|i| {
                let a = i as f64 * 0.05;
                DVec2::new(radius * a.cos(), radius * a.sin())
            })
            .collect();
        let ch = Channel::new(points, 1.0);
        for i in 1..ch.size() - 1 {
            assert!(
                (ch.curvature(i) - 1.0 / radius).abs() < 1e-4,
                "curvature at {} was {}",
                i,
                ch.curvature(i)
            );
        }
    }

    #[test]
    fn test_degenerate_triangle_yields_zero_curvature() {
        // Folded back on itself: v1 + v2 == 0, denominator underflows.
        let ch = Channel::new(
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
                DVec2::new(0.0, 0.0),
                DVec2::new(1.0, 0.0),
            ],
            1.0,
        );
        assert_eq!(ch.curvature(1), 0.0);
    }

    #[test]
    fn test_normal_is_left_perpendicular() {
        let ch = Channel::new(straight_points(4, 10.0), 5.0);
        let t = ch.tangent(1);
        let n = ch.normal(1);
        assert!((t.dot(n)).abs() < 1e-12);
        assert!((t.perp_dot(n) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_migration_rates_zero_for_straight_channel() {
        let mut ch = Channel::new(straight_points(50, 50.0), 50.0);
        ch.compute_migration_rates(&SimulationParams::default());
        assert!(ch.migration_rates.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn test_migration_rates_pinned_at_endpoints() {
        let points: Vec<DVec2> = (0..60)
            .map(|i| {
                let x = i as f64 * 25.0;
                DVec2::new(x, 100.0 * (x / 500.0).sin())
            })
            .collect();
        let mut ch = Channel::new(points, 50.0);
        ch.compute_migration_rates(&SimulationParams::default());
        assert_eq!(ch.migration_rate(0), 0.0);
        assert_eq!(ch.migration_rate(ch.size() - 1), 0.0);
        assert!(ch.migration_rates.iter().any(|&r| r.abs() > 0.0));
    }

    #[test]
    fn test_rate_buffers_stay_parallel_to_points() {
        let mut ch = Channel::new(straight_points(20, 60.0), 50.0);
        ch.compute_migration_rates(&SimulationParams::default());
        assert_eq!(ch.local_migration_rates.len(), ch.size());
        assert_eq!(ch.migration_rates.len(), ch.size());
        ch.resample(50.0);
        assert_eq!(ch.local_migration_rates.len(), ch.size());
        assert_eq!(ch.migration_rates.len(), ch.size());
    }

    #[test]
    fn test_migrate_pins_endpoints() {
        let points: Vec<DVec2> = (0..40)
            .map(|i| {
                let x = i as f64 * 25.0;
                DVec2::new(x, 80.0 * (x / 300.0).sin())
            })
            .collect();
        let mut ch = Channel::new(points.clone(), 40.0);
        let params = SimulationParams::default();
        let terrain = ScalarField2D::new(test_domain(), 4, 4);
        let gradient = terrain.gradient_grid();
        ch.compute_migration_rates(&params);
        ch.migrate(&params, test_domain(), &gradient, &[]);
        assert_eq!(ch.point(0), points[0]);
        assert_eq!(ch.point(ch.size() - 1), *points.last().unwrap());
        // Interior vertices actually moved.
        assert!((1..ch.size() - 1).any(|i| ch.point(i) != points[i]));
    }

    #[test]
    fn test_migrate_pins_vertices_leaving_domain() {
        let domain = Box2D::new(DVec2::new(-10.0, -5.0), DVec2::new(500.0, 5.0));
        let points: Vec<DVec2> = (0..20)
            .map(|i| {
                let x = i as f64 * 25.0;
                DVec2::new(x, 4.0 * (x / 100.0).sin())
            })
            .collect();
        let mut ch = Channel::new(points.clone(), 60.0);
        let params = SimulationParams::default();
        let terrain = ScalarField2D::new(domain, 4, 4);
        let gradient = terrain.gradient_grid();
        ch.compute_migration_rates(&params);
        ch.migrate(&params, domain, &gradient, &[]);
        for (i, p) in ch.points().iter().enumerate() {
            assert!(
                domain.contains(*p),
                "vertex {} escaped the domain: {:?}",
                i,
                p
            );
        }
    }

    #[test]
    fn test_resample_splits_long_segments() {
        let mut ch = Channel::new(straight_points(5, 180.0), 20.0);
        ch.resample(50.0);
        for w in ch.points().windows(2) {
            assert!(w[0].distance(w[1]) <= 50.0 + 1e-9);
        }
        assert_eq!(ch.point(0), DVec2::ZERO);
        assert_eq!(ch.point(ch.size() - 1), DVec2::new(720.0, 0.0));
    }

    #[test]
    fn test_resample_merges_close_points() {
        let mut points = straight_points(8, 40.0);
        points.insert(3, DVec2::new(81.0, 0.0)); // 1 m after vertex 2
        let mut ch = Channel::new(points, 20.0);
        ch.resample(50.0);
        for w in ch.points().windows(2).take(ch.size() - 2) {
            assert!(w[0].distance(w[1]) >= 25.0 - 1e-9);
        }
    }

    #[test]
    fn test_resample_is_idempotent() {
        let points: Vec<DVec2> = (0..80)
            .map(|i| {
                let x = i as f64 * 37.0;
                DVec2::new(x, 120.0 * (x / 400.0).sin())
            })
            .collect();
        let mut ch = Channel::new(points, 30.0);
        ch.resample(50.0);
        let once = ch.points().to_vec();
        ch.resample(50.0);
        assert_eq!(once.len(), ch.size());
        for (a, b) in once.iter().zip(ch.points()) {
            assert!(a.distance(*b) < 1e-9);
        }
    }

    #[test]
    fn test_resample_never_drops_below_four_points() {
        let points = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(3.0, 0.0),
        ];
        let mut ch = Channel::new(points, 10.0);
        ch.resample(50.0);
        assert!(ch.size() >= 4);
    }

    #[test]
    fn test_segment_intersection_basics() {
        let hit = segment_intersection(
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(0.0, 2.0),
            DVec2::new(2.0, 0.0),
        )
        .unwrap();
        assert!((hit - DVec2::new(1.0, 1.0)).length() < 1e-12);

        // Parallel segments never intersect.
        assert!(segment_intersection(
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
        )
        .is_none());

        // Shared endpoints are not proper intersections.
        assert!(segment_intersection(
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 1.0),
        )
        .is_none());
    }

    /// A looping polyline whose return leg crosses the outbound leg at
    /// (150, 0), with enough arc length between the crossing segments to
    /// qualify as a neck cutoff.
    fn hairpin(width: f64) -> Channel {
        Channel::new(
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(100.0, 0.0),
                DVec2::new(200.0, 0.0),
                DVec2::new(300.0, 0.0),
                DVec2::new(300.0, 100.0),
                DVec2::new(150.0, 100.0),
                DVec2::new(150.0, -50.0),
                DVec2::new(100.0, -100.0),
            ],
            width,
        )
    }

    #[test]
    fn test_find_cutoff_detects_neck() {
        let ch = hairpin(10.0);
        let (i, j, hit) = ch.find_cutoff().expect("hairpin should self-intersect");
        assert!(j > i + 1);
        let s = ch.curvilinear_length();
        assert!(s[j] - s[i] > 4.0 * ch.width());
        assert!(hit.is_finite());
    }

    #[test]
    fn test_cutoff_produces_simple_main_and_closed_oxbow() {
        let mut ch = hairpin(10.0);
        let before = ch.size();
        let length_before = ch.length();
        let (i, j, hit) = ch.find_cutoff().unwrap();
        let oxbow = ch.cutoff(i, j, hit);

        // The oxbow is a closed loop of the severed vertices.
        assert!(oxbow.is_frozen());
        assert_eq!(oxbow.point(0), hit);
        assert_eq!(oxbow.point(oxbow.size() - 1), hit);
        assert_eq!(oxbow.size(), j - i + 2);

        // The main channel shortened and no longer self-intersects.
        assert!(ch.size() < before);
        assert!(ch.length() < length_before);
        assert!(ch.find_cutoff().is_none());
    }

    #[test]
    fn test_avulsion_follows_descent_and_reaches_boundary() {
        let domain = Box2D::new(DVec2::ZERO, DVec2::new(2000.0, 1000.0));
        // Terrain sloping down toward y = 0.
        let terrain = ScalarField2D::from_fn(domain, 32, 32, |p| 0.02 * p.y);
        let points: Vec<DVec2> = (0..40)
            .map(|i| DVec2::new(i as f64 * 50.0, 800.0))
            .collect();
        let mut ch = Channel::new(points, 30.0);
        let params = SimulationParams::default();
        assert!(ch.avulse(5, &terrain, &params));

        // The re-routed tail marches downhill.
        let pts = ch.points();
        assert!(pts.len() >= 4);
        for w in pts[5..].windows(2) {
            assert!(w[1].y <= w[0].y + 1e-9);
        }
        // Terminates at the lower domain edge.
        assert!(pts.last().unwrap().y < 1.0);
    }

    #[test]
    fn test_avulsion_aborts_on_flat_terrain() {
        let domain = Box2D::new(DVec2::ZERO, DVec2::new(2000.0, 1000.0));
        let terrain = ScalarField2D::new(domain, 16, 16);
        let points: Vec<DVec2> = (0..40)
            .map(|i| DVec2::new(i as f64 * 50.0, 500.0))
            .collect();
        let mut ch = Channel::new(points.clone(), 30.0);
        let params = SimulationParams::default();
        assert!(!ch.avulse(5, &terrain, &params));
        assert_eq!(ch.points(), points.as_slice());
    }

    #[test]
    fn test_degeneracy_checks() {
        let domain = Box2D::new(DVec2::ZERO, DVec2::new(100.0, 100.0));
        let ok = Channel::new(
            vec![
                DVec2::new(10.0, 10.0),
                DVec2::new(20.0, 10.0),
                DVec2::new(30.0, 10.0),
                DVec2::new(40.0, 10.0),
            ],
            5.0,
        );
        assert!(ok.degeneracy(domain).is_none());

        let short = Channel::new(vec![DVec2::ZERO, DVec2::new(1.0, 0.0)], 5.0);
        assert!(short.degeneracy(domain).is_some());

        let outside = Channel::new(
            vec![
                DVec2::new(10.0, 10.0),
                DVec2::new(20.0, 10.0),
                DVec2::new(30.0, 10.0),
                DVec2::new(400.0, 10.0),
            ],
            5.0,
        );
        assert_eq!(outside.degeneracy(domain), Some("point outside domain"));

        let duplicated = Channel::new(
            vec![
                DVec2::new(10.0, 10.0),
                DVec2::new(20.0, 10.0),
                DVec2::new(20.0, 10.0),
                DVec2::new(40.0, 10.0),
            ],
            5.0,
        );
        assert_eq!(
            duplicated.degeneracy(domain),
            Some("duplicated adjacent points")
        );
    }
}
