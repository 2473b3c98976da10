//! Roads between landmarks.
//!
//! Each road is a quadratic Bezier whose control point is pushed off the
//! straight line by a seeded amount proportional to the road's length,
//! sampled at a fixed density and then jittered point by point.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::WorldError;
use crate::landmarks::{find_landmark, id_hash, Connection, Landmark, Point};
use crate::value_noise::hash;

/// Control point offset as a fraction of road length
pub const CURVE_FACTOR: f64 = 0.3;

/// Samples per tile of arc length
pub const SAMPLES_PER_TILE: f64 = 1.0;

/// Maximum per-axis displacement applied to every sample
pub const PATH_JITTER: f64 = 0.35;

/// Upper bound on segments per road. Roads between landmarks inside the
/// world extent stay well below it.
pub const MAX_ROAD_SEGMENTS: usize = 1 << 16;

const CURVE_SALT: u32 = 0x27D4_EB2F;
const JITTER_SALT_X: u32 = 0x1656_67B1;
const JITTER_SALT_Y: u32 = 0x3C6E_F372;

/// A road polyline between two landmarks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Path {
    pub from: String,
    pub to: String,
    pub points: Vec<Point>,
}

impl Path {
    /// Polyline length in tiles
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance(w[1].x, w[1].y))
            .sum()
    }
}

/// Quadratic Bezier segment
#[derive(Clone, Copy, Debug)]
pub struct QuadraticBezier {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
}

impl QuadraticBezier {
    pub fn new(p0: Point, p1: Point, p2: Point) -> Self {
        Self { p0, p1, p2 }
    }

    /// B(t) = (1-t)^2 P0 + 2(1-t)t P1 + t^2 P2
    pub fn evaluate(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let w0 = mt * mt;
        let w1 = 2.0 * mt * t;
        let w2 = t * t;
        Point::new(
            w0 * self.p0.x + w1 * self.p1.x + w2 * self.p2.x,
            w0 * self.p0.y + w1 * self.p1.y + w2 * self.p2.y,
        )
    }

    /// Arc length by chord sampling
    pub fn approximate_length(&self, samples: usize) -> f64 {
        let mut length = 0.0;
        let mut prev = self.evaluate(0.0);
        for i in 1..=samples {
            let current = self.evaluate(i as f64 / samples as f64);
            length += prev.distance(current.x, current.y);
            prev = current;
        }
        length
    }
}

/// Key for a directed pair of ids
fn road_key(from: &str, to: &str) -> u32 {
    id_hash(from) ^ id_hash(to).rotate_left(16)
}

fn jitter(point: Point, index: usize, key: u32, seed: u32) -> Point {
    let i = index as i32;
    let k = key as i32;
    let jx = (hash(i, k, seed ^ JITTER_SALT_X) * 2.0 - 1.0) * PATH_JITTER;
    let jy = (hash(i, k, seed ^ JITTER_SALT_Y) * 2.0 - 1.0) * PATH_JITTER;
    Point::new(point.x + jx, point.y + jy)
}

/// Sample a jittered curved road from `a` to `b`. Pure in all arguments.
pub fn sample_road(a: Point, b: Point, key: u32, seed: u32) -> Vec<Point> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dist = (dx * dx + dy * dy).sqrt();

    if dist < 1e-9 {
        return vec![jitter(a, 0, key, seed)];
    }

    // unit normal to the chord
    let nx = -dy / dist;
    let ny = dx / dist;
    let bend = (hash(key as i32, 0, seed ^ CURVE_SALT) * 2.0 - 1.0) * CURVE_FACTOR * dist;
    let control = Point::new((a.x + b.x) * 0.5 + nx * bend, (a.y + b.y) * 0.5 + ny * bend);
    let curve = QuadraticBezier::new(a, control, b);

    let arc = curve.approximate_length(32);
    let segments = ((arc * SAMPLES_PER_TILE).ceil() as usize).clamp(2, MAX_ROAD_SEGMENTS);

    (0..=segments)
        .map(|i| {
            let t = i as f64 / segments as f64;
            jitter(curve.evaluate(t), i, key, seed)
        })
        .collect()
}

/// Generate the road between two landmarks of `landmarks`.
pub fn generate_path(
    landmarks: &[Landmark],
    from_id: &str,
    to_id: &str,
    seed: u32,
) -> Result<Vec<Point>, WorldError> {
    let from = find_landmark(landmarks, from_id)
        .ok_or_else(|| WorldError::UnknownLandmark(from_id.to_string()))?;
    let to = find_landmark(landmarks, to_id)
        .ok_or_else(|| WorldError::UnknownLandmark(to_id.to_string()))?;

    Ok(sample_road(
        from.position(),
        to.position(),
        road_key(from_id, to_id),
        seed,
    ))
}

/// Precompute every configured road once.
pub fn generate_paths(
    landmarks: &[Landmark],
    connections: &[Connection],
    seed: u32,
) -> Result<Vec<Path>, WorldError> {
    let mut paths = Vec::with_capacity(connections.len());
    for connection in connections {
        let points = generate_path(landmarks, &connection.from, &connection.to, seed)?;
        if points.len() < 2 {
            warn!(from = %connection.from, to = %connection.to, "landmarks coincide, road is a single point");
        }
        debug!(from = %connection.from, to = %connection.to, points = points.len(), "generated road");
        paths.push(Path {
            from: connection.from.clone(),
            to: connection.to.clone(),
            points,
        });
    }
    Ok(paths)
}
