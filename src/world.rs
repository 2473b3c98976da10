//! A generated world and everything derived from it.
//!
//! `World` owns the configuration, the roads and props generated from
//! it, the spatial index over them and the chunk cache. Several worlds
//! can coexist; nothing here is global.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{CacheStats, ChunkCache, EvictionPolicy};
use crate::chunk::{ChunkCoord, TerrainChunk};
use crate::config::WorldConfig;
use crate::error::{ensure_finite, WorldError};
use crate::features::SpatialIndex;
use crate::landmarks::{base_landmark, landmark_bounds, pick_landmark, Bounds, LandmarkCategory, Landmark};
use crate::paths::{generate_paths, Path};
use crate::props::{generate_props, Prop};
use crate::scene::{Camera, Viewport};
use crate::terrain::{terrain_bias, TerrainKind, TerrainSource};

/// Chunks beyond the visible ones that [`World::prefetch_around`] renders
pub const PREFETCH_MARGIN: i32 = 1;

/// Output of world generation for a config
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedWorld {
    pub paths: Vec<Path>,
    pub props: Vec<Prop>,
}

/// Generate roads and props. Pure in `config`.
pub fn generate_world(config: &WorldConfig) -> Result<GeneratedWorld, WorldError> {
    generate_indexed(config).map(|(generated, _)| generated)
}

fn generate_indexed(config: &WorldConfig) -> Result<(GeneratedWorld, SpatialIndex), WorldError> {
    config.validate()?;
    let base = base_landmark(&config.landmarks).ok_or_else(|| {
        let count = config
            .landmarks
            .iter()
            .filter(|l| l.category == LandmarkCategory::Base)
            .count();
        WorldError::BaseCount(count)
    })?;

    let paths = generate_paths(&config.landmarks, &config.connections, config.seed)?;
    let index = SpatialIndex::new(base.position(), &config.landmarks, &paths);

    let bounds = landmark_bounds(&config.landmarks, config.bounds_margin);
    let source = TerrainSource::new(config.seed, &index, &config.terrain);
    let props = generate_props(&bounds, &source);

    for landmark in &config.landmarks {
        if !source.classify(landmark.x, landmark.y).is_walkable() {
            warn!(id = %landmark.id, "landmark sits on water");
        }
    }

    Ok((GeneratedWorld { paths, props }, index))
}

pub struct World {
    config: WorldConfig,
    paths: Vec<Path>,
    props: Vec<Prop>,
    index: SpatialIndex,
    cache: ChunkCache,
}

impl World {
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        let (generated, index) = generate_indexed(&config)?;
        let cache = ChunkCache::with_capacity(config.cache_capacity, config.cache_policy);
        let world = World {
            config,
            paths: generated.paths,
            props: generated.props,
            index,
            cache,
        };
        world.log_summary();
        Ok(world)
    }

    /// World with the built-in landmark table
    pub fn with_seed(seed: u32) -> Result<Self, WorldError> {
        Self::new(WorldConfig::with_seed(seed))
    }

    fn log_summary(&self) {
        let road_points: usize = self.paths.iter().map(|p| p.points.len()).sum();
        info!(
            seed = self.config.seed,
            landmarks = self.config.landmarks.len(),
            roads = self.paths.len(),
            road_points,
            grid = self.index.has_grid(),
            props = self.props.len(),
            "generated world"
        );
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn seed(&self) -> u32 {
        self.config.seed
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.config.landmarks
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// The base landmark. Validation guarantees there is one.
    pub fn base(&self) -> Option<&Landmark> {
        base_landmark(&self.config.landmarks)
    }

    pub fn source(&self) -> TerrainSource<'_> {
        TerrainSource::new(self.config.seed, &self.index, &self.config.terrain)
    }

    /// Drop every cached chunk.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    /// Regenerate roads and props for a new seed and drop the cache.
    pub fn reseed(&mut self, seed: u32) -> Result<(), WorldError> {
        let mut config = self.config.clone();
        config.seed = seed;
        let (generated, index) = generate_indexed(&config)?;
        self.config = config;
        self.paths = generated.paths;
        self.props = generated.props;
        self.index = index;
        self.cache.clear();
        self.log_summary();
        Ok(())
    }

    pub fn cache_policy(&self) -> EvictionPolicy {
        self.cache.policy()
    }

    pub fn set_cache_policy(&mut self, policy: EvictionPolicy) {
        self.config.cache_policy = policy;
        self.cache.set_policy(policy);
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn is_cached(&self, coord: &ChunkCoord) -> bool {
        self.cache.contains(coord)
    }

    pub fn classify(&self, x: f64, y: f64) -> TerrainKind {
        self.source().classify(x, y)
    }

    pub fn terrain_bias(&self, x: f64, y: f64) -> f64 {
        terrain_bias(x, y, &self.index, &self.config.terrain)
    }

    pub fn is_walkable(&self, x: f64, y: f64) -> bool {
        x.is_finite() && y.is_finite() && self.classify(x, y).is_walkable()
    }

    pub fn chunk(&mut self, cx: i32, cy: i32) -> Arc<TerrainChunk> {
        let source = TerrainSource::new(self.config.seed, &self.index, &self.config.terrain);
        self.cache.get_or_render(ChunkCoord::new(cx, cy), &source)
    }

    /// Render the chunks under the viewport plus a margin, nearest first.
    /// Returns how many chunks were rendered.
    pub fn prefetch_around(&mut self, camera: &Camera, viewport: &Viewport) -> usize {
        let mut coords = viewport.visible_chunks(camera, PREFETCH_MARGIN);
        let center = ChunkCoord::containing_pixel(
            camera.x + viewport.width as f64 * 0.5,
            camera.y + viewport.height as f64 * 0.5,
        );
        coords.sort_by_key(|c| c.distance(&center));

        let source = TerrainSource::new(self.config.seed, &self.index, &self.config.terrain);
        self.cache.prefetch(&coords, &source)
    }

    /// Landmark nearest to `(x, y)` within the pick radius.
    pub fn hit_test(&self, x: f64, y: f64) -> Result<Option<&Landmark>, WorldError> {
        ensure_finite(x, y)?;
        Ok(pick_landmark(&self.config.landmarks, x, y, self.config.pick_radius))
    }

    /// Landmark bounding box padded by the configured margin
    pub fn bounds(&self) -> Bounds {
        landmark_bounds(&self.config.landmarks, self.config.bounds_margin)
    }
}
