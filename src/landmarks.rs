//! Landmarks: the named points of interest the map is built around.

use serde::{Deserialize, Serialize};

/// A position in tile units
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// What kind of place a landmark is. Drives icon colour and size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandmarkCategory {
    /// The home camp; every world has exactly one
    Base,
    Academy,
    Library,
    Workshop,
    Arena,
    Shrine,
}

impl LandmarkCategory {
    pub fn color(&self) -> [u8; 3] {
        match self {
            LandmarkCategory::Base => [200, 60, 50],
            LandmarkCategory::Academy => [70, 90, 200],
            LandmarkCategory::Library => [150, 90, 40],
            LandmarkCategory::Workshop => [110, 110, 120],
            LandmarkCategory::Arena => [210, 150, 40],
            LandmarkCategory::Shrine => [230, 230, 240],
        }
    }

    /// Icon half-size in tiles
    pub fn icon_radius(&self) -> f64 {
        match self {
            LandmarkCategory::Base => 1.5,
            LandmarkCategory::Arena => 1.25,
            _ => 1.0,
        }
    }

    pub fn ascii_char(&self) -> char {
        match self {
            LandmarkCategory::Base => 'B',
            LandmarkCategory::Academy => 'A',
            LandmarkCategory::Library => 'L',
            LandmarkCategory::Workshop => 'W',
            LandmarkCategory::Arena => 'R',
            LandmarkCategory::Shrine => 'S',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub category: LandmarkCategory,
}

impl Landmark {
    pub fn new(id: impl Into<String>, x: f64, y: f64, category: LandmarkCategory) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            category,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A road to be generated between two landmark ids
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: String,
    pub to: String,
}

impl Connection {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// The built-in island layout
pub fn default_landmarks() -> Vec<Landmark> {
    vec![
        Landmark::new("camp", 64.0, 64.0, LandmarkCategory::Base),
        Landmark::new("academy", 98.0, 50.0, LandmarkCategory::Academy),
        Landmark::new("library", 36.0, 88.0, LandmarkCategory::Library),
        Landmark::new("workshop", 112.0, 96.0, LandmarkCategory::Workshop),
        Landmark::new("arena", 74.0, 126.0, LandmarkCategory::Arena),
        Landmark::new("shrine", 22.0, 36.0, LandmarkCategory::Shrine),
    ]
}

/// Roads of the built-in layout, radiating out from camp
pub fn default_connections() -> Vec<Connection> {
    vec![
        Connection::new("camp", "academy"),
        Connection::new("camp", "library"),
        Connection::new("academy", "workshop"),
        Connection::new("library", "arena"),
        Connection::new("workshop", "arena"),
        Connection::new("library", "shrine"),
    ]
}

pub fn find_landmark<'a>(landmarks: &'a [Landmark], id: &str) -> Option<&'a Landmark> {
    landmarks.iter().find(|l| l.id == id)
}

/// The single `Base` landmark, if the table has exactly one.
pub fn base_landmark(landmarks: &[Landmark]) -> Option<&Landmark> {
    let mut bases = landmarks
        .iter()
        .filter(|l| l.category == LandmarkCategory::Base);
    match (bases.next(), bases.next()) {
        (Some(base), None) => Some(base),
        _ => None,
    }
}

/// Nearest landmark within `radius` of `(x, y)`. Earlier entries win ties.
pub fn pick_landmark(landmarks: &[Landmark], x: f64, y: f64, radius: f64) -> Option<&Landmark> {
    let mut best: Option<(&Landmark, f64)> = None;
    for landmark in landmarks {
        let d = landmark.position().distance(x, y);
        if d > radius {
            continue;
        }
        match best {
            Some((_, best_d)) if best_d <= d => {}
            _ => best = Some((landmark, d)),
        }
    }
    best.map(|(l, _)| l)
}

/// Axis-aligned rectangle in tile units
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// Bounding box of the landmark table grown by `margin` on every side.
/// An empty table gives a box of `margin` around the origin.
pub fn landmark_bounds(landmarks: &[Landmark], margin: f64) -> Bounds {
    let mut bounds = Bounds {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for landmark in landmarks {
        bounds.min_x = bounds.min_x.min(landmark.x);
        bounds.min_y = bounds.min_y.min(landmark.y);
        bounds.max_x = bounds.max_x.max(landmark.x);
        bounds.max_y = bounds.max_y.max(landmark.y);
    }
    if landmarks.is_empty() {
        bounds = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        };
    }
    Bounds {
        min_x: bounds.min_x - margin,
        min_y: bounds.min_y - margin,
        max_x: bounds.max_x + margin,
        max_y: bounds.max_y + margin,
    }
}

/// Stable 32-bit FNV-1a over a string. Used to key per-road randomness so
/// it does not depend on the table order or the std hasher.
pub fn id_hash(id: &str) -> u32 {
    let mut h: u32 = 0x811C_9DC5;
    for byte in id.bytes() {
        h ^= byte as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_has_one_base() {
        let landmarks = default_landmarks();
        let base = base_landmark(&landmarks).expect("one base");
        assert_eq!(base.id, "camp");
        for connection in default_connections() {
            assert!(find_landmark(&landmarks, &connection.from).is_some());
            assert!(find_landmark(&landmarks, &connection.to).is_some());
        }
    }

    #[test]
    fn test_base_landmark_rejects_two_bases() {
        let landmarks = vec![
            Landmark::new("a", 0.0, 0.0, LandmarkCategory::Base),
            Landmark::new("b", 5.0, 0.0, LandmarkCategory::Base),
        ];
        assert!(base_landmark(&landmarks).is_none());
        assert!(base_landmark(&[]).is_none());
    }

    #[test]
    fn test_pick_landmark_nearest_within_radius() {
        let landmarks = vec![
            Landmark::new("a", 0.0, 0.0, LandmarkCategory::Base),
            Landmark::new("b", 3.0, 0.0, LandmarkCategory::Shrine),
        ];
        assert_eq!(pick_landmark(&landmarks, 0.5, 0.0, 2.0).map(|l| l.id.as_str()), Some("a"));
        assert_eq!(pick_landmark(&landmarks, 2.2, 0.0, 2.0).map(|l| l.id.as_str()), Some("b"));
        assert!(pick_landmark(&landmarks, 1.5, 5.0, 2.0).is_none());
        // equidistant: first in table wins
        assert_eq!(pick_landmark(&landmarks, 1.5, 0.0, 2.0).map(|l| l.id.as_str()), Some("a"));
    }

    #[test]
    fn test_landmark_bounds() {
        let bounds = landmark_bounds(&default_landmarks(), 24.0);
        assert_eq!(bounds.min_x, 22.0 - 24.0);
        assert_eq!(bounds.max_y, 126.0 + 24.0);
        assert!(bounds.contains(64.0, 64.0));
        assert!(!bounds.contains(200.0, 64.0));
        assert_eq!(bounds.center(), Point::new(67.0, 81.0));

        let empty = landmark_bounds(&[], 5.0);
        assert_eq!(empty.width(), 10.0);
        assert_eq!(empty.height(), 10.0);
    }

    #[test]
    fn test_id_hash_known_values() {
        assert_eq!(id_hash(""), 0x811C_9DC5);
        assert_eq!(id_hash("a"), 0xE40C_292C);
        assert_ne!(id_hash("camp"), id_hash("academy"));
    }

    #[test]
    fn test_category_serde_names() {
        let json = serde_json::to_string(&LandmarkCategory::Workshop).unwrap();
        assert_eq!(json, "\"workshop\"");
        let parsed: Landmark =
            serde_json::from_str(r#"{"id":"x","x":1.0,"y":2.0,"category":"arena"}"#).unwrap();
        assert_eq!(parsed.category, LandmarkCategory::Arena);
    }
}
