//! World configuration.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. `{"seed": 7}` is a complete config.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{EvictionPolicy, DEFAULT_CACHE_CAPACITY};
use crate::error::WorldError;
use crate::landmarks::{default_connections, default_landmarks, Connection, Landmark, LandmarkCategory};
use crate::terrain::TerrainParams;

/// Largest absolute landmark coordinate, in tiles
pub const MAX_WORLD_EXTENT: f64 = 2048.0;

/// Largest padding around the landmark bounds, in tiles
pub const MAX_BOUNDS_MARGIN: f64 = 256.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub seed: u32,
    pub landmarks: Vec<Landmark>,
    /// Landmark pairs that get a road
    pub connections: Vec<Connection>,
    pub terrain: TerrainParams,
    pub cache_capacity: usize,
    pub cache_policy: EvictionPolicy,
    /// Hit-test radius in tiles
    pub pick_radius: f64,
    /// Padding around the landmark bounding box, in tiles
    pub bounds_margin: f64,
    /// Avatar walking speed in tiles per second
    pub avatar_speed: f64,
    /// Fraction of the viewport on each side the avatar may enter before
    /// the camera follows
    pub dead_zone: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            landmarks: default_landmarks(),
            connections: default_connections(),
            terrain: TerrainParams::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_policy: EvictionPolicy::Fifo,
            pick_radius: 2.0,
            bounds_margin: 24.0,
            avatar_speed: 6.0,
            dead_zone: 0.3,
        }
    }
}

impl WorldConfig {
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Read a JSON config and validate it.
    pub fn load(path: &Path) -> Result<Self, WorldError> {
        let file = File::open(path)?;
        let config: WorldConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        info!(path = %path.display(), seed = config.seed, landmarks = config.landmarks.len(), "loaded config");
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), WorldError> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), WorldError> {
        let scalars = [
            ("pick_radius", self.pick_radius),
            ("bounds_margin", self.bounds_margin),
            ("avatar_speed", self.avatar_speed),
            ("dead_zone", self.dead_zone),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(WorldError::NonFiniteConfig(name));
            }
        }
        self.terrain.validate()?;

        if self.cache_capacity == 0 {
            return Err(WorldError::InvalidConfig("cache_capacity must be at least 1".into()));
        }
        if self.pick_radius <= 0.0 {
            return Err(WorldError::InvalidConfig("pick_radius must be positive".into()));
        }
        if !(0.0..=MAX_BOUNDS_MARGIN).contains(&self.bounds_margin) {
            return Err(WorldError::InvalidConfig(format!(
                "bounds_margin must be in [0, {MAX_BOUNDS_MARGIN}]"
            )));
        }
        if self.avatar_speed <= 0.0 {
            return Err(WorldError::InvalidConfig("avatar_speed must be positive".into()));
        }
        if !(0.0..0.5).contains(&self.dead_zone) {
            return Err(WorldError::InvalidConfig("dead_zone must be in [0, 0.5)".into()));
        }

        let mut ids = HashSet::new();
        for landmark in &self.landmarks {
            if !landmark.position().is_finite() {
                return Err(WorldError::NonFiniteCoordinate {
                    x: landmark.x,
                    y: landmark.y,
                });
            }
            if landmark.x.abs() > MAX_WORLD_EXTENT || landmark.y.abs() > MAX_WORLD_EXTENT {
                return Err(WorldError::InvalidConfig(format!(
                    "landmark {} at ({}, {}) is beyond the world extent of {MAX_WORLD_EXTENT} tiles",
                    landmark.id, landmark.x, landmark.y
                )));
            }
            if !ids.insert(landmark.id.as_str()) {
                return Err(WorldError::DuplicateLandmark(landmark.id.clone()));
            }
        }

        let bases = self
            .landmarks
            .iter()
            .filter(|l| l.category == LandmarkCategory::Base)
            .count();
        if bases != 1 {
            return Err(WorldError::BaseCount(bases));
        }

        for connection in &self.connections {
            for id in [&connection.from, &connection.to] {
                if !ids.contains(id.as_str()) {
                    return Err(WorldError::UnknownLandmark(id.clone()));
                }
            }
        }
        Ok(())
    }
}
