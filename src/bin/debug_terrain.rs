//! Debug script to dump the terrain classifier around the base as ASCII

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use painted_world::ascii::{export_ascii, kind_counts, legend, render_ascii};
use painted_world::landmarks::Bounds;
use painted_world::terrain::TerrainKind;
use painted_world::{World, WorldConfig};

#[derive(Parser, Debug)]
#[command(name = "debug_terrain")]
#[command(about = "Print the terrain classification around the base landmark")]
struct Args {
    #[arg(short, long, default_value = "42")]
    seed: u32,

    /// JSON world config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Half extent of the dump in tiles; defaults to the whole world bounds
    #[arg(long)]
    radius: Option<f64>,

    /// Tiles per character
    #[arg(long, default_value = "1.0")]
    step: f64,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "painted_world=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &args.config {
        Some(path) => WorldConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => WorldConfig::default(),
    };
    config.seed = args.seed;
    let world = World::new(config).context("generating world")?;

    let bounds = match (args.radius, world.base()) {
        (Some(r), Some(base)) => Bounds {
            min_x: base.x - r,
            min_y: base.y - r,
            max_x: base.x + r,
            max_y: base.y + r,
        },
        _ => world.bounds(),
    };

    if let Some(path) = &args.output {
        export_ascii(&world, &bounds, args.step, path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {}", path.display());
    } else {
        println!("=== TERRAIN seed={} step={} ===", world.seed(), args.step);
        println!("{}", legend());
        print!("{}", render_ascii(&world, &bounds, args.step));
    }

    let counts = kind_counts(&world, &bounds, args.step);
    let total: usize = counts.iter().sum();
    println!();
    println!("TERRAIN DISTRIBUTION:");
    for (kind, count) in TerrainKind::ALL.iter().zip(counts) {
        println!(
            "  {:?}: {} ({:.1}%)",
            kind,
            count,
            100.0 * count as f64 / total.max(1) as f64
        );
    }

    for landmark in world.landmarks() {
        println!(
            "  {} {:?} at ({:.0}, {:.0}): {:?}",
            landmark.category.ascii_char(),
            landmark.id,
            landmark.x,
            landmark.y,
            world.classify(landmark.x, landmark.y)
        );
    }

    Ok(())
}
