//! Carving demo: builds a small cratered landscape and meshes it a few
//! chunks per simulated frame.
//!
//! Usage: cargo run --release --bin carve_demo -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   Volume config JSON (default: built-in defaults)
//!   --budget <N>      Chunks meshed per frame (default: 8)
//!   --craters <N>     Number of craters to blast (default: 6)
//!   --parallel        Extract each frame's batch on the rayon pool

use std::time::Instant;

use glam::{IVec3, Vec3};

use carvox::core::logging;
use carvox::{MeshAttributes, MeshSink, VolumeConfig, VoxelVolume};

/// Sink that only counts what a renderer would upload
#[derive(Default)]
struct CountingSink {
    next_id: u64,
    live: usize,
    vertices: usize,
    triangles: usize,
}

impl MeshSink for CountingSink {
    type Handle = (u64, usize, usize);

    fn create(&mut self, attributes: &MeshAttributes, _origin: IVec3) -> Self::Handle {
        self.next_id += 1;
        self.live += 1;
        self.vertices += attributes.vertex_count();
        self.triangles += attributes.triangle_count();
        (self.next_id, attributes.vertex_count(), attributes.triangle_count())
    }

    fn dispose(&mut self, (_, vertices, triangles): Self::Handle) {
        self.live -= 1;
        self.vertices -= vertices;
        self.triangles -= triangles;
    }
}

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let budget = parse_usize_arg(&args, "--budget").unwrap_or(8);
    let craters = parse_usize_arg(&args, "--craters").unwrap_or(6);
    let parallel = args.iter().any(|a| a == "--parallel");

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => match VolumeConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {path}: {e}");
                std::process::exit(1);
            }
        },
        None => VolumeConfig::default(),
    };
    config.meshing.parallel |= parallel;

    let mut volume = match VoxelVolume::new(config, CountingSink::default()) {
        Ok(volume) => volume,
        Err(e) => {
            log::error!("Invalid volume config: {e}");
            std::process::exit(1);
        }
    };

    let size = volume.size();
    println!("=== Carvox Carve Demo ===");
    println!("Volume: {size}^3, chunks {}^3", volume.config().chunk_size());
    println!("Budget: {budget} chunks/frame");
    println!();

    // Ground slab, a few rock pillars, then craters blasted into it
    let start = Instant::now();
    volume.cuboid(IVec3::ZERO, IVec3::new(size, size / 3, size), 1);
    for i in 0..4 {
        let x = size / 5 + i * size / 5;
        volume.cuboid(IVec3::new(x, size / 3, x / 2), IVec3::new(x + 3, size / 2, x / 2 + 3), 2);
    }
    for i in 0..craters {
        let t = i as f32 / craters.max(1) as f32;
        let center = Vec3::new(
            size as f32 * (0.2 + 0.6 * t),
            size as f32 / 3.0,
            size as f32 * (0.5 + 0.3 * (t * 6.0).sin()),
        );
        let changed = volume.sphere(center, size as f32 / 10.0, 0);
        log::debug!("Crater {i} at {center}: changed={changed}");
    }
    log::info!(
        "Carved in {:.2}ms, {} octree nodes",
        start.elapsed().as_secs_f64() * 1000.0,
        volume.tree().node_count()
    );

    let queued = volume.make_mesh();
    log::info!("{queued} chunks queued");

    let mut frame = 0;
    let start = Instant::now();
    while volume.pending_len() > 0 {
        let built = volume.gen_mesh(Some(budget));
        frame += 1;
        log::debug!("Frame {frame}: built {built}, {} pending", volume.pending_len());
    }
    let sink = volume.sink();
    log::info!(
        "Meshed in {frame} frames ({:.2}ms): {} bundles, {} vertices, {} triangles",
        start.elapsed().as_secs_f64() * 1000.0,
        sink.live,
        sink.vertices,
        sink.triangles
    );

    // One more hit on an already meshed surface
    let center = Vec3::new(size as f32 / 2.0, size as f32 / 3.0, size as f32 / 2.0);
    volume.sphere(center, size as f32 / 8.0, 0);
    let requeued = volume.make_mesh();
    let rebuilt = volume.gen_mesh(None);
    log::info!("Impact requeued {requeued} chunks, rebuilt {rebuilt}");

    println!("Done. {} live bundles", volume.sink().live);
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
