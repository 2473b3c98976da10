//! Chunk rasterisation.
//!
//! A chunk is a `CHUNK_PIXELS` square of screen pixels painted in solid
//! `BLOCK_PIXELS` blocks. Each block is classified once and filled with a
//! shade picked by hash, so the same chunk coordinate always produces
//! the same buffer.

use serde::{Deserialize, Serialize};

use crate::terrain::{TerrainKind, TerrainSource};
use crate::value_noise::hash;

/// Chunk edge length in pixels
pub const CHUNK_PIXELS: usize = 256;

/// Edge of one logical "game pixel" in real pixels
pub const BLOCK_PIXELS: usize = 4;

/// Blocks per chunk edge
pub const CHUNK_BLOCKS: usize = CHUNK_PIXELS / BLOCK_PIXELS;

/// Screen pixels per world tile
pub const TILE_PIXELS: f64 = 16.0;

const PALETTE_SALT: u32 = 0x9E37_79B9;

/// Integer chunk coordinate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chunk containing a world-pixel position
    pub fn containing_pixel(px: f64, py: f64) -> Self {
        Self::new(
            (px / CHUNK_PIXELS as f64).floor() as i32,
            (py / CHUNK_PIXELS as f64).floor() as i32,
        )
    }

    /// World-pixel position of the chunk's top-left corner
    pub fn origin_pixels(&self) -> (i64, i64) {
        (
            self.x as i64 * CHUNK_PIXELS as i64,
            self.y as i64 * CHUNK_PIXELS as i64,
        )
    }

    /// Chebyshev distance in chunks
    pub fn distance(&self, other: &ChunkCoord) -> u32 {
        let dx = (self.x as i64 - other.x as i64).unsigned_abs();
        let dy = (self.y as i64 - other.y as i64).unsigned_abs();
        dx.max(dy) as u32
    }
}

pub fn tile_to_pixel(tile: f64) -> f64 {
    tile * TILE_PIXELS
}

pub fn pixel_to_tile(pixel: f64) -> f64 {
    pixel / TILE_PIXELS
}

/// Pack an RGB triple as `0x00RRGGBB`
#[inline]
pub fn pack_rgb(rgb: [u8; 3]) -> u32 {
    ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32
}

#[inline]
pub fn unpack_rgb(color: u32) -> [u8; 3] {
    [(color >> 16) as u8, (color >> 8) as u8, color as u8]
}

/// A rendered chunk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainChunk {
    pub coord: ChunkCoord,
    /// Row-major `0x00RRGGBB`, `CHUNK_PIXELS * CHUNK_PIXELS` long
    pixels: Vec<u32>,
    /// Row-major classification per block
    kinds: Vec<TerrainKind>,
}

impl TerrainChunk {
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * CHUNK_PIXELS + x]
    }

    pub fn kind_at_block(&self, bx: usize, by: usize) -> TerrainKind {
        self.kinds[by * CHUNK_BLOCKS + bx]
    }

    /// Count of blocks per terrain kind, in [`TerrainKind::ALL`] order
    pub fn histogram(&self) -> [usize; 5] {
        let mut counts = [0usize; 5];
        for kind in &self.kinds {
            let slot = TerrainKind::ALL
                .iter()
                .position(|k| k == kind)
                .unwrap_or(0);
            counts[slot] += 1;
        }
        counts
    }
}

/// World-tile coordinate sampled for a global block index (block centre)
#[inline]
pub fn block_to_tile(block: i64) -> f64 {
    (block as f64 * BLOCK_PIXELS as f64 + BLOCK_PIXELS as f64 * 0.5) / TILE_PIXELS
}

/// Shade for a block of `kind` at a global block index
pub fn block_color(kind: TerrainKind, gbx: i64, gby: i64, seed: u32) -> u32 {
    let palette = kind.palette();
    // high halves go into the seed; zero for non-negative indices below 2^32
    let high = ((gbx >> 32) as u32).wrapping_mul(0x85EB_CA6B) ^ ((gby >> 32) as u32).wrapping_mul(0xC2B2_AE35);
    let pick = hash(gbx as i32, gby as i32, seed ^ PALETTE_SALT ^ high);
    let slot = ((pick * palette.len() as f64) as usize).min(palette.len() - 1);
    pack_rgb(palette[slot])
}

/// Rasterise one chunk.
pub fn render_chunk(coord: ChunkCoord, source: &TerrainSource<'_>) -> TerrainChunk {
    let mut pixels = vec![0u32; CHUNK_PIXELS * CHUNK_PIXELS];
    let mut kinds = Vec::with_capacity(CHUNK_BLOCKS * CHUNK_BLOCKS);

    let first_bx = coord.x as i64 * CHUNK_BLOCKS as i64;
    let first_by = coord.y as i64 * CHUNK_BLOCKS as i64;

    for by in 0..CHUNK_BLOCKS {
        let gby = first_by + by as i64;
        let ty = block_to_tile(gby);
        for bx in 0..CHUNK_BLOCKS {
            let gbx = first_bx + bx as i64;
            let kind = source.classify(block_to_tile(gbx), ty);
            kinds.push(kind);

            let color = block_color(kind, gbx, gby, source.seed);
            for py in by * BLOCK_PIXELS..(by + 1) * BLOCK_PIXELS {
                let row = py * CHUNK_PIXELS;
                pixels[row + bx * BLOCK_PIXELS..row + (bx + 1) * BLOCK_PIXELS].fill(color);
            }
        }
    }

    TerrainChunk {
        coord,
        pixels,
        kinds,
    }
}
