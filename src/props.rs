//! Decorative props scattered over dry land.
//!
//! Placement is decided once per world. A low-frequency density field
//! makes groves and clearings, and a seeded RNG picks the kind and the
//! offset inside each tile.

use noise::NoiseFn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::landmarks::Bounds;
use crate::terrain::{TerrainKind, TerrainSource};
use crate::value_noise::FbmField;

/// No props this close to a landmark centre, in tiles
pub const LANDMARK_CLEARANCE: f64 = 2.5;

/// Frequency of the density field in tiles
const DENSITY_FREQUENCY: f64 = 0.08;

/// Density field value below which a tile stays bare
const DENSITY_CUTOFF: f64 = 0.05;

/// Chance a tile inside a dense area gets a prop
const PLACEMENT_CHANCE: f64 = 0.35;

const DENSITY_SALT: u32 = 0x0D15_EA5E;
const RNG_SALT: u64 = 0x9120_97F5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropKind {
    Tree,
    Pine,
    Rock,
    Flower,
    Bush,
}

impl PropKind {
    /// Main sprite colour
    pub fn color(&self) -> [u8; 3] {
        match self {
            PropKind::Tree => [46, 112, 48],
            PropKind::Pine => [30, 84, 52],
            PropKind::Rock => [128, 124, 118],
            PropKind::Flower => [226, 96, 150],
            PropKind::Bush => [64, 132, 56],
        }
    }

    /// Sprite footprint in blocks (width, height)
    pub fn size_blocks(&self) -> (usize, usize) {
        match self {
            PropKind::Tree => (3, 4),
            PropKind::Pine => (3, 5),
            PropKind::Rock => (2, 2),
            PropKind::Flower => (1, 1),
            PropKind::Bush => (2, 2),
        }
    }

    /// Kind for a uniform roll on grass
    fn from_grass_roll(roll: f64) -> Self {
        if roll < 0.35 {
            PropKind::Tree
        } else if roll < 0.55 {
            PropKind::Pine
        } else if roll < 0.75 {
            PropKind::Bush
        } else if roll < 0.95 {
            PropKind::Flower
        } else {
            PropKind::Rock
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub kind: PropKind,
    pub x: f64,
    pub y: f64,
}

/// Place props over every integer tile in `bounds`.
///
/// Every tile draws the same number of values from the RNG whether or not
/// it gets a prop, so a tile's outcome depends only on the seed and its
/// position in the scan.
pub fn generate_props(bounds: &Bounds, source: &TerrainSource<'_>) -> Vec<Prop> {
    let mut rng = ChaCha8Rng::seed_from_u64(source.seed as u64 ^ RNG_SALT);
    let density = FbmField::new(source.seed ^ DENSITY_SALT).with_frequency(DENSITY_FREQUENCY);

    let x0 = bounds.min_x.floor() as i64;
    let x1 = bounds.max_x.ceil() as i64;
    let y0 = bounds.min_y.floor() as i64;
    let y1 = bounds.max_y.ceil() as i64;

    let mut props = Vec::new();
    for ty in y0..y1 {
        for tx in x0..x1 {
            let roll: f64 = rng.gen();
            let kind_roll: f64 = rng.gen();
            let ox: f64 = rng.gen_range(0.15..0.85);
            let oy: f64 = rng.gen_range(0.15..0.85);

            if roll >= PLACEMENT_CHANCE {
                continue;
            }
            if density.get([tx as f64, ty as f64]) < DENSITY_CUTOFF {
                continue;
            }

            let x = tx as f64 + ox;
            let y = ty as f64 + oy;
            if source.index.distance_to_landmark(x, y) < LANDMARK_CLEARANCE {
                continue;
            }

            let kind = match source.classify(x, y) {
                TerrainKind::Grass => PropKind::from_grass_roll(kind_roll),
                TerrainKind::Sand => PropKind::Rock,
                TerrainKind::DeepWater | TerrainKind::Water | TerrainKind::Path => continue,
            };
            props.push(Prop { kind, x, y });
        }
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SpatialIndex;
    use crate::landmarks::{default_connections, default_landmarks, landmark_bounds, Point};
    use crate::paths::generate_paths;
    use crate::terrain::TerrainParams;

    fn scatter(seed: u32) -> (Vec<Prop>, SpatialIndex) {
        let landmarks = default_landmarks();
        let paths = generate_paths(&landmarks, &default_connections(), seed).unwrap();
        let index = SpatialIndex::new(Point::new(64.0, 64.0), &landmarks, &paths);
        let params = TerrainParams::default();
        let bounds = landmark_bounds(&landmarks, 8.0);
        let props = generate_props(&bounds, &TerrainSource::new(seed, &index, &params));
        (props, index)
    }

    #[test]
    fn test_props_are_deterministic() {
        let (a, _) = scatter(42);
        let (b, _) = scatter(42);
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_props_avoid_water_roads_and_landmarks() {
        let params = TerrainParams::default();
        for seed in [1, 42] {
            let (props, index) = scatter(seed);
            let source = TerrainSource::new(seed, &index, &params);
            for prop in &props {
                let kind = source.classify(prop.x, prop.y);
                assert!(matches!(kind, TerrainKind::Grass | TerrainKind::Sand), "{prop:?} on {kind:?}");
                if kind == TerrainKind::Sand {
                    assert_eq!(prop.kind, PropKind::Rock);
                }
                assert!(index.distance_to_landmark(prop.x, prop.y) >= LANDMARK_CLEARANCE);
            }
        }
    }

    #[test]
    fn test_props_inside_bounds() {
        let (props, _) = scatter(7);
        let bounds = landmark_bounds(&default_landmarks(), 8.0);
        for prop in &props {
            assert!(bounds.contains(prop.x, prop.y));
        }
    }

    #[test]
    fn test_grass_roll_covers_all_kinds() {
        let kinds: Vec<PropKind> = [0.0, 0.4, 0.6, 0.8, 0.99]
            .into_iter()
            .map(PropKind::from_grass_roll)
            .collect();
        assert_eq!(
            kinds,
            vec![PropKind::Tree, PropKind::Pine, PropKind::Bush, PropKind::Flower, PropKind::Rock]
        );
    }
}
