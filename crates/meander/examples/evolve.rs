//! Meander evolution demo: procedural floodplain, one channel, PNG frames.
//!
//! Run with: cargo run --example evolve -p meander --release

use glam::DVec2;
use meander::{
    generate_floodplain_terrain, initial_channel_points, Box2D, MeanderSimulation, TerrainConfig,
};

fn main() {
    let bounds = Box2D::new(DVec2::ZERO, DVec2::new(12_000.0, 4_000.0));
    let config = TerrainConfig::default();
    let terrain = generate_floodplain_terrain(bounds, 256, 96, &config);

    let mut sim = MeanderSimulation::new(42, terrain);
    let points = initial_channel_points(bounds, 50.0, 150.0);
    sim.add_channel(points, 60.0).expect("initial channel");

    let total_steps = 600;
    let frame_every = 50;
    let out_dir = "meander_frames";
    std::fs::create_dir_all(out_dir).expect("create output directory");

    println!("Domain: {:.0}m x {:.0}m", bounds.size().x, bounds.size().y);
    println!("Running {} steps (~{:.0} years)...\n", total_steps, total_steps as f64 * sim.params().dt / (365.0 * 24.0 * 3600.0));

    println!("{:>6} {:>10} {:>10} {:>8}", "Step", "Sinuosity", "Length", "Channels");
    println!("{}", "-".repeat(38));

    for step in 0..=total_steps {
        if step % frame_every == 0 {
            let main = &sim.channels()[0];
            println!(
                "{:>6} {:>10.4} {:>10.0} {:>8}",
                step,
                main.sinuosity(),
                main.length(),
                sim.channels().len()
            );
            let path = format!("{}/frame_{:04}.png", out_dir, step);
            sim.output_image(&path, 1200, 400).expect("write frame");
        }
        sim.step();
    }

    let oxbows = sim.channels().iter().filter(|c| c.is_frozen()).count();
    println!("\nDone: {} channels ({} oxbow remnants)", sim.channels().len(), oxbows);
    println!("Frames written to {}/", out_dir);
}
