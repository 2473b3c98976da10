//! Terrain classification.
//!
//! A sample is `warped_noise + bias`, where the bias pulls land up around
//! the base, the landmarks and the roads. Road samples themselves always
//! classify as [`TerrainKind::Path`].

use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::features::SpatialIndex;
use crate::value_noise::warped_noise;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    DeepWater,
    Water,
    Sand,
    Grass,
    Path,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 5] = [
        TerrainKind::DeepWater,
        TerrainKind::Water,
        TerrainKind::Sand,
        TerrainKind::Grass,
        TerrainKind::Path,
    ];

    /// Whether the avatar may stand here
    pub fn is_walkable(&self) -> bool {
        !matches!(self, TerrainKind::DeepWater | TerrainKind::Water)
    }

    pub fn is_water(&self) -> bool {
        !self.is_walkable()
    }

    /// Shades a block of this kind may be painted with
    pub fn palette(&self) -> &'static [[u8; 3]] {
        match self {
            TerrainKind::DeepWater => &[[28, 58, 112], [31, 63, 120], [26, 54, 106]],
            TerrainKind::Water => &[[52, 102, 170], [57, 110, 178], [48, 96, 162], [60, 114, 184]],
            TerrainKind::Sand => &[[222, 202, 148], [214, 194, 140], [228, 210, 158]],
            TerrainKind::Grass => &[[92, 164, 72], [86, 156, 66], [98, 172, 78], [82, 150, 62]],
            TerrainKind::Path => &[[176, 140, 96], [168, 132, 90]],
        }
    }

    pub fn ascii_char(&self) -> char {
        match self {
            TerrainKind::DeepWater => '~',
            TerrainKind::Water => '-',
            TerrainKind::Sand => '.',
            TerrainKind::Grass => '"',
            TerrainKind::Path => '#',
        }
    }
}

/// Tunables for bias and thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Multiplier from tile units to noise space; smaller = larger islands
    pub scale: f64,
    pub base_radius: f64,
    pub base_max: f64,
    pub landmark_radius: f64,
    pub landmark_max: f64,
    pub path_radius: f64,
    pub path_max: f64,
    /// Distance from a road sample that paints as road
    pub path_half_width: f64,
    pub deep_water: f64,
    pub water: f64,
    pub sand: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            scale: 0.03,
            base_radius: 30.0,
            base_max: 1.0,
            landmark_radius: 14.0,
            landmark_max: 1.0,
            path_radius: 5.0,
            path_max: 0.5,
            path_half_width: 1.2,
            deep_water: -0.3,
            water: -0.15,
            sand: -0.05,
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> Result<(), WorldError> {
        let fields = [
            ("terrain.scale", self.scale),
            ("terrain.base_radius", self.base_radius),
            ("terrain.base_max", self.base_max),
            ("terrain.landmark_radius", self.landmark_radius),
            ("terrain.landmark_max", self.landmark_max),
            ("terrain.path_radius", self.path_radius),
            ("terrain.path_max", self.path_max),
            ("terrain.path_half_width", self.path_half_width),
            ("terrain.deep_water", self.deep_water),
            ("terrain.water", self.water),
            ("terrain.sand", self.sand),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(WorldError::NonFiniteConfig(name));
            }
        }
        if self.scale <= 0.0 {
            return Err(WorldError::InvalidConfig("terrain.scale must be positive".into()));
        }
        if !(0.0 < self.path_radius
            && self.path_radius < self.landmark_radius
            && self.landmark_radius < self.base_radius)
        {
            return Err(WorldError::InvalidConfig(
                "bias radii must satisfy 0 < path < landmark < base".into(),
            ));
        }
        if self.base_max < 0.0 || self.landmark_max < 0.0 || self.path_max < 0.0 {
            return Err(WorldError::InvalidConfig("bias maxima must be non-negative".into()));
        }
        if self.path_half_width < 0.0 {
            return Err(WorldError::InvalidConfig("terrain.path_half_width must be non-negative".into()));
        }
        if !(self.deep_water < self.water && self.water < self.sand) {
            return Err(WorldError::InvalidConfig(
                "thresholds must satisfy deep_water < water < sand".into(),
            ));
        }
        Ok(())
    }
}

/// Linear falloff `(radius - d) / radius`, clamped to `[0, max]`.
#[inline]
pub fn falloff(distance: f64, radius: f64, max: f64) -> f64 {
    ((radius - distance) / radius).clamp(0.0, max)
}

/// Sum of the base, landmark and road falloffs at `(x, y)`.
pub fn terrain_bias(x: f64, y: f64, index: &SpatialIndex, params: &TerrainParams) -> f64 {
    let base = falloff(index.distance_to_base(x, y), params.base_radius, params.base_max);
    let landmark = falloff(
        index.distance_to_landmark(x, y),
        params.landmark_radius,
        params.landmark_max,
    );
    let path = falloff(index.distance_to_path(x, y), params.path_radius, params.path_max);
    base + landmark + path
}

/// Raw land value before thresholding
pub fn terrain_value(x: f64, y: f64, seed: u32, index: &SpatialIndex, params: &TerrainParams) -> f64 {
    warped_noise(x * params.scale, y * params.scale, seed) + terrain_bias(x, y, index, params)
}

/// Classify the terrain at `(x, y)` in tile units.
pub fn classify(x: f64, y: f64, seed: u32, index: &SpatialIndex, params: &TerrainParams) -> TerrainKind {
    let path_distance = index.distance_to_path(x, y);
    if path_distance <= params.path_half_width {
        return TerrainKind::Path;
    }

    let value = terrain_value(x, y, seed, index, params);
    if value < params.deep_water {
        TerrainKind::DeepWater
    } else if value < params.water {
        TerrainKind::Water
    } else if value < params.sand {
        TerrainKind::Sand
    } else {
        TerrainKind::Grass
    }
}

/// Everything classification reads, borrowed together so chunk renders
/// can share it across threads.
#[derive(Clone, Copy, Debug)]
pub struct TerrainSource<'a> {
    pub seed: u32,
    pub index: &'a SpatialIndex,
    pub params: &'a TerrainParams,
}

impl<'a> TerrainSource<'a> {
    pub fn new(seed: u32, index: &'a SpatialIndex, params: &'a TerrainParams) -> Self {
        Self { seed, index, params }
    }

    pub fn classify(&self, x: f64, y: f64) -> TerrainKind {
        classify(x, y, self.seed, self.index, self.params)
    }

    pub fn bias(&self, x: f64, y: f64) -> f64 {
        terrain_bias(x, y, self.index, self.params)
    }
}
