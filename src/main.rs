use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use painted_world::chunk::{tile_to_pixel, ChunkCoord};
use painted_world::export::{export_chunk_mosaic, export_chunks, export_frame};
use painted_world::scene::{Scene, Viewport};
use painted_world::viewer::run_viewer;
use painted_world::{EvictionPolicy, World, WorldConfig};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CachePolicyArg {
    Fifo,
    Lru,
}

impl From<CachePolicyArg> for EvictionPolicy {
    fn from(arg: CachePolicyArg) -> Self {
        match arg {
            CachePolicyArg::Fifo => EvictionPolicy::Fifo,
            CachePolicyArg::Lru => EvictionPolicy::Lru,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "painted_world")]
#[command(about = "Generate a painted island world around landmarks and render it in chunks")]
struct Args {
    /// World seed (overrides the config file)
    #[arg(short, long)]
    seed: Option<u32>,

    /// JSON world config; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Export chunks around the base to this directory, plus a mosaic
    #[arg(long)]
    export_chunks: Option<PathBuf>,

    /// Radius in chunks for chunk export
    #[arg(long, default_value = "2")]
    chunk_radius: u32,

    /// Export a composed frame to this PNG
    #[arg(long)]
    export_frame: Option<PathBuf>,

    /// Frame width in pixels
    #[arg(long, default_value = "640")]
    frame_width: usize,

    /// Frame height in pixels
    #[arg(long, default_value = "480")]
    frame_height: usize,

    /// Frames to simulate before exporting, with the avatar walking
    /// toward the first road's destination
    #[arg(long, default_value = "0")]
    ticks: u32,

    /// Chunk cache eviction policy (overrides the config file)
    #[arg(long, value_enum)]
    cache_policy: Option<CachePolicyArg>,

    /// Open the interactive viewer
    #[arg(long)]
    view: bool,
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
        Some(path) => WorldConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => WorldConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(policy) = args.cache_policy {
        config.cache_policy = policy.into();
    }
    if args.frame_width == 0 || args.frame_height == 0 {
        bail!("frame size must be non-zero");
    }

    println!("Generating world with seed: {}", config.seed);
    let mut world = World::new(config).context("generating world")?;
    println!(
        "{} landmarks, {} roads, {} props",
        world.landmarks().len(),
        world.paths().len(),
        world.props().len()
    );

    let base = world
        .base()
        .map(|b| b.position())
        .context("world has no base landmark")?;
    let base_kind = world.classify(base.x, base.y);
    if !base_kind.is_walkable() {
        println!("Warning: base tile is {:?}", base_kind);
    }

    if let Some(dir) = &args.export_chunks {
        let center = ChunkCoord::containing_pixel(tile_to_pixel(base.x), tile_to_pixel(base.y));
        println!("Exporting chunks around {:?} (radius {})...", center, args.chunk_radius);
        let written = export_chunks(&mut world, center, args.chunk_radius, dir)
            .with_context(|| format!("exporting chunks to {}", dir.display()))?;
        let mosaic = dir.join("mosaic.png");
        let (w, h) = export_chunk_mosaic(&mut world, center, args.chunk_radius, &mosaic)
            .with_context(|| format!("exporting mosaic {}", mosaic.display()))?;
        println!("Wrote {} chunks and a {}x{} mosaic to {}", written.len(), w, h, dir.display());
    }

    if let Some(path) = &args.export_frame {
        let mut scene = Scene::new(&world, Viewport::new(args.frame_width, args.frame_height));
        if args.ticks > 0 {
            if let Some(road) = world.paths().first() {
                let goal = road.points.last().copied().unwrap_or(base);
                scene.set_target(goal.x, goal.y)?;
            }
            for _ in 0..args.ticks {
                scene.tick(&mut world, 1.0 / 60.0);
            }
            info!(x = scene.avatar.x, y = scene.avatar.y, ticks = args.ticks, "simulated avatar");
        }
        let frame = scene.render(&mut world);
        export_frame(&frame, path).with_context(|| format!("exporting frame {}", path.display()))?;
        println!("Wrote {}x{} frame to {}", frame.width, frame.height, path.display());
    }

    let stats = world.cache_stats();
    if stats.misses > 0 {
        println!(
            "Chunk cache ({}): {} / {} entries, {} hits, {} misses, {} evictions",
            world.cache_policy(),
            stats.len,
            stats.capacity,
            stats.hits,
            stats.misses,
            stats.evictions
        );
    }

    if args.view {
        run_viewer(world, args.frame_width, args.frame_height).context("running viewer")?;
    } else if args.export_chunks.is_none() && args.export_frame.is_none() {
        println!("Nothing to export. Try --export-frame frame.png, --export-chunks out/ or --view");
    }

    Ok(())
}
