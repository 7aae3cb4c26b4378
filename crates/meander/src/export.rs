//! Raster export: renders the terrain and channel planforms to an image.
//!
//! This is the only rendering surface of the crate; it reads nothing but
//! the terrain field and the channel list.

use glam::DVec2;
use image::{Rgb, RgbImage};

use crate::channel::Channel;
use crate::field::ScalarField2D;

/// Live channel color.
const CHANNEL_COLOR: Rgb<u8> = Rgb([25, 80, 170]);
/// Oxbow remnant color.
const OXBOW_COLOR: Rgb<u8> = Rgb([120, 150, 185]);

/// Elevation ramp: dark green lowlands through tan uplands.
fn elevation_color(t: f64) -> Rgb<u8> {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        let s = t / 0.5;
        Rgb([
            (60.0 + 80.0 * s) as u8,
            (110.0 + 50.0 * s) as u8,
            (60.0 + 20.0 * s) as u8,
        ])
    } else {
        let s = (t - 0.5) / 0.5;
        Rgb([
            (140.0 + 60.0 * s) as u8,
            (160.0 - 30.0 * s) as u8,
            (80.0 + 20.0 * s) as u8,
        ])
    }
}

/// Render the terrain and all channel polylines into an RGB image.
pub fn render(terrain: &ScalarField2D, channels: &[Channel], width: u32, height: u32) -> RgbImage {
    let bounds = terrain.bounds();
    let size = bounds.size();
    let (lo, hi) = terrain.value_range();
    let range = (hi - lo).max(1e-9);

    let mut img = RgbImage::new(width, height);

    // Terrain background.
    for py in 0..height {
        for px in 0..width {
            let p = DVec2::new(
                bounds.min.x + (px as f64 + 0.5) / width as f64 * size.x,
                // Image rows grow downward, world y grows upward.
                bounds.min.y + (1.0 - (py as f64 + 0.5) / height as f64) * size.y,
            );
            let t = (terrain.sample(p) - lo) / range;
            img.put_pixel(px, py, elevation_color(t));
        }
    }

    // Channel planforms on top, stroked at roughly channel width.
    let meters_per_pixel = size.x / width as f64;
    for channel in channels {
        let color = if channel.is_frozen() {
            OXBOW_COLOR
        } else {
            CHANNEL_COLOR
        };
        let radius = ((channel.width() / meters_per_pixel) * 0.5).round().max(1.0) as i64;
        for w in channel.points().windows(2) {
            stroke_segment(&mut img, bounds.min, size, w[0], w[1], radius, color);
        }
    }

    img
}

/// Rasterize one world-space segment by dense sampling with a square stamp.
fn stroke_segment(
    img: &mut RgbImage,
    origin: DVec2,
    size: DVec2,
    a: DVec2,
    b: DVec2,
    radius: i64,
    color: Rgb<u8>,
) {
    let (w, h) = (img.width() as f64, img.height() as f64);
    let to_pixel = |p: DVec2| {
        DVec2::new(
            (p.x - origin.x) / size.x * w,
            (1.0 - (p.y - origin.y) / size.y) * h,
        )
    };
    let pa = to_pixel(a);
    let pb = to_pixel(b);
    let steps = (pa.distance(pb).ceil() as usize).max(1) * 2;
    for s in 0..=steps {
        let p = pa.lerp(pb, s as f64 / steps as f64);
        stamp(img, p, radius, color);
    }
}

fn stamp(img: &mut RgbImage, center: DVec2, radius: i64, color: Rgb<u8>) {
    let cx = center.x.round() as i64;
    let cy = center.y.round() as i64;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
