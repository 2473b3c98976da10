//! Distance queries against points of interest.
//!
//! The terrain bias asks three questions per sample: how far is the base,
//! how far is the nearest landmark, how far is the nearest road sample.
//! Road samples are scanned linearly; once there are enough of them a
//! bucket grid answers the same query with identical results.

use std::collections::HashMap;

use crate::landmarks::{Landmark, Point};
use crate::paths::Path;

/// Point count at which [`SpatialIndex::new`] builds a [`PathGrid`]
pub const GRID_THRESHOLD: usize = 128;

/// Bucket size in tiles
pub const GRID_CELL: f64 = 8.0;

/// Uniform bucket grid over road samples
#[derive(Clone, Debug)]
pub struct PathGrid {
    cell: f64,
    buckets: HashMap<(i32, i32), Vec<usize>>,
    min_cell: (i32, i32),
    max_cell: (i32, i32),
}

impl PathGrid {
    pub fn build(points: &[Point], cell: f64) -> Self {
        let mut buckets: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
        let mut min_cell = (i32::MAX, i32::MAX);
        let mut max_cell = (i32::MIN, i32::MIN);

        for (i, p) in points.iter().enumerate() {
            let key = Self::cell_of(cell, p.x, p.y);
            min_cell = (min_cell.0.min(key.0), min_cell.1.min(key.1));
            max_cell = (max_cell.0.max(key.0), max_cell.1.max(key.1));
            buckets.entry(key).or_default().push(i);
        }

        Self {
            cell,
            buckets,
            min_cell,
            max_cell,
        }
    }

    fn cell_of(cell: f64, x: f64, y: f64) -> (i32, i32) {
        ((x / cell).floor() as i32, (y / cell).floor() as i32)
    }

    /// Ring search outward from the query cell, clipped to the occupied
    /// cell range. A point in ring `r` is more than `(r - 1) * cell` away,
    /// so the search stops once the best distance is below that.
    fn nearest(&self, points: &[Point], x: f64, y: f64) -> Option<(usize, f64)> {
        if self.buckets.is_empty() {
            return None;
        }
        let (qx, qy) = Self::cell_of(self.cell, x, y);
        let (qx, qy) = (qx as i64, qy as i64);
        let (min_x, min_y) = (self.min_cell.0 as i64, self.min_cell.1 as i64);
        let (max_x, max_y) = (self.max_cell.0 as i64, self.max_cell.1 as i64);

        let first_ring = [min_x - qx, qx - max_x, min_y - qy, qy - max_y, 0]
            .into_iter()
            .max()
            .unwrap_or(0);
        let last_ring = [qx - min_x, max_x - qx, qy - min_y, max_y - qy]
            .into_iter()
            .max()
            .unwrap_or(0);

        let mut best: Option<(usize, f64)> = None;
        let visit = |dx: i64, dy: i64, best: &mut Option<(usize, f64)>| {
            let key = ((qx + dx) as i32, (qy + dy) as i32);
            let Some(indices) = self.buckets.get(&key) else {
                return;
            };
            for &i in indices {
                let d = points[i].distance(x, y);
                *best = match *best {
                    Some((bi, bd)) if bd < d || (bd == d && bi < i) => Some((bi, bd)),
                    _ => Some((i, d)),
                };
            }
        };

        for ring in first_ring..=last_ring {
            if let Some((_, d)) = best {
                if d < (ring - 1) as f64 * self.cell {
                    break;
                }
            }
            let dx_lo = (-ring).max(min_x - qx);
            let dx_hi = ring.min(max_x - qx);
            let dy_lo = (-ring).max(min_y - qy);
            let dy_hi = ring.min(max_y - qy);

            for dy in dy_lo..=dy_hi {
                if dy.abs() == ring {
                    for dx in dx_lo..=dx_hi {
                        visit(dx, dy, &mut best);
                    }
                } else {
                    if dx_lo == -ring {
                        visit(-ring, dy, &mut best);
                    }
                    if dx_hi == ring && ring != 0 {
                        visit(ring, dy, &mut best);
                    }
                }
            }
        }
        best
    }
}

/// Everything the terrain bias measures distance to
#[derive(Clone, Debug)]
pub struct SpatialIndex {
    base: Point,
    landmarks: Vec<Point>,
    path_points: Vec<Point>,
    grid: Option<PathGrid>,
}

impl SpatialIndex {
    /// Build the index, adding a grid when the road sample count is large.
    pub fn new(base: Point, landmarks: &[Landmark], paths: &[Path]) -> Self {
        let mut index = Self::linear(base, landmarks, paths);
        if index.path_points.len() >= GRID_THRESHOLD {
            index.grid = Some(PathGrid::build(&index.path_points, GRID_CELL));
        }
        index
    }

    /// Index that always scans road samples linearly
    pub fn linear(base: Point, landmarks: &[Landmark], paths: &[Path]) -> Self {
        Self {
            base,
            landmarks: landmarks.iter().map(Landmark::position).collect(),
            path_points: paths.iter().flat_map(|p| p.points.iter().copied()).collect(),
            grid: None,
        }
    }

    /// Index that always uses a grid with the given cell size
    pub fn with_grid(base: Point, landmarks: &[Landmark], paths: &[Path], cell: f64) -> Self {
        let mut index = Self::linear(base, landmarks, paths);
        index.grid = Some(PathGrid::build(&index.path_points, cell));
        index
    }

    pub fn base(&self) -> Point {
        self.base
    }

    pub fn path_points(&self) -> &[Point] {
        &self.path_points
    }

    pub fn has_grid(&self) -> bool {
        self.grid.is_some()
    }

    pub fn distance_to_base(&self, x: f64, y: f64) -> f64 {
        self.base.distance(x, y)
    }

    /// Index (into the landmark table) and distance of the nearest landmark
    pub fn nearest_landmark(&self, x: f64, y: f64) -> Option<(usize, f64)> {
        nearest_linear(&self.landmarks, x, y)
    }

    pub fn distance_to_landmark(&self, x: f64, y: f64) -> f64 {
        self.nearest_landmark(x, y).map_or(f64::INFINITY, |(_, d)| d)
    }

    /// Index (into the flattened road samples) and distance of the nearest
    /// road sample. The lowest index wins exact ties.
    pub fn nearest_path_point(&self, x: f64, y: f64) -> Option<(usize, f64)> {
        match &self.grid {
            Some(grid) => grid.nearest(&self.path_points, x, y),
            None => nearest_linear(&self.path_points, x, y),
        }
    }

    pub fn distance_to_path(&self, x: f64, y: f64) -> f64 {
        self.nearest_path_point(x, y).map_or(f64::INFINITY, |(_, d)| d)
    }
}

fn nearest_linear(points: &[Point], x: f64, y: f64) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d = p.distance(x, y);
        match best {
            Some((_, bd)) if bd <= d => {}
            _ => best = Some((i, d)),
        }
    }
    best
}
