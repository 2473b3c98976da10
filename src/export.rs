//! PNG export for chunks, chunk mosaics and composed frames.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Rgb, RgbImage};
use tracing::info;

use crate::chunk::{unpack_rgb, ChunkCoord, TerrainChunk, CHUNK_PIXELS};
use crate::error::WorldError;
use crate::scene::Frame;
use crate::world::World;

/// Convert a row-major `0x00RRGGBB` buffer to an RGB image
pub fn pixels_to_image(width: usize, height: usize, pixels: &[u32]) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(width as u32, height as u32);
    for (i, &color) in pixels.iter().take(width * height).enumerate() {
        img.put_pixel((i % width) as u32, (i / width) as u32, Rgb(unpack_rgb(color)));
    }
    img
}

/// Export one chunk as a PNG image
pub fn export_chunk(chunk: &TerrainChunk, path: &Path) -> Result<(), WorldError> {
    pixels_to_image(CHUNK_PIXELS, CHUNK_PIXELS, chunk.pixels()).save(path)?;
    Ok(())
}

/// Export every chunk within `radius` of `center` as its own file
/// `chunk_{x}_{y}.png` in `dir`. Returns the written paths.
pub fn export_chunks(
    world: &mut World,
    center: ChunkCoord,
    radius: u32,
    dir: &Path,
) -> Result<Vec<PathBuf>, WorldError> {
    fs::create_dir_all(dir)?;
    let r = radius as i32;
    let mut written = Vec::new();
    for cy in center.y - r..=center.y + r {
        for cx in center.x - r..=center.x + r {
            let path = dir.join(format!("chunk_{cx}_{cy}.png"));
            export_chunk(&world.chunk(cx, cy), &path)?;
            written.push(path);
        }
    }
    info!(count = written.len(), dir = %dir.display(), "exported chunks");
    Ok(written)
}

/// Export the chunks within `radius` of `center` stitched into one image.
/// Returns the image size.
pub fn export_chunk_mosaic(
    world: &mut World,
    center: ChunkCoord,
    radius: u32,
    path: &Path,
) -> Result<(u32, u32), WorldError> {
    let span = 2 * radius as usize + 1;
    let side = (span * CHUNK_PIXELS) as u32;
    let mut img: RgbImage = ImageBuffer::new(side, side);
    let r = radius as i32;

    for (row, cy) in (center.y - r..=center.y + r).enumerate() {
        for (col, cx) in (center.x - r..=center.x + r).enumerate() {
            let chunk = world.chunk(cx, cy);
            let left = (col * CHUNK_PIXELS) as u32;
            let top = (row * CHUNK_PIXELS) as u32;
            for (i, &color) in chunk.pixels().iter().enumerate() {
                let x = left + (i % CHUNK_PIXELS) as u32;
                let y = top + (i / CHUNK_PIXELS) as u32;
                img.put_pixel(x, y, Rgb(unpack_rgb(color)));
            }
        }
    }

    img.save(path)?;
    info!(path = %path.display(), chunks = span * span, size = side, "exported chunk mosaic");
    Ok((side, side))
}

/// Export a composed frame as a PNG image
pub fn export_frame(frame: &Frame, path: &Path) -> Result<(), WorldError> {
    pixels_to_image(frame.width, frame.height, &frame.pixels).save(path)?;
    info!(path = %path.display(), width = frame.width, height = frame.height, "exported frame");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::scene::{Scene, Viewport};

    #[test]
    fn test_export_chunk_is_readable() {
        let mut world = World::with_seed(42).unwrap();
        let chunk = world.chunk(4, 4);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunk.png");
        export_chunk(&chunk, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (CHUNK_PIXELS as u32, CHUNK_PIXELS as u32));
        assert_eq!(img.get_pixel(17, 201).0, unpack_rgb(chunk.pixel(17, 201)));
    }

    #[test]
    fn test_export_chunks_writes_one_file_each() {
        let mut world = World::with_seed(1).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("chunks");
        let written = export_chunks(&mut world, ChunkCoord::new(4, 4), 1, &out).unwrap();
        assert_eq!(written.len(), 9);
        assert!(out.join("chunk_3_5.png").exists());
        for path in &written {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_mosaic_places_chunks() {
        let mut world = World::with_seed(7).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mosaic.png");
        let size = export_chunk_mosaic(&mut world, ChunkCoord::new(4, 5), 1, &path).unwrap();
        assert_eq!(size, (768, 768));

        let img = image::open(&path).unwrap().to_rgb8();
        let right_bottom = world.chunk(5, 6);
        assert_eq!(img.get_pixel(512 + 3, 512 + 9).0, unpack_rgb(right_bottom.pixel(3, 9)));
    }

    #[test]
    fn test_export_frame() {
        let mut world = World::new(WorldConfig::with_seed(2)).unwrap();
        let scene = Scene::new(&world, Viewport::new(120, 80));
        let frame = scene.render(&mut world);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        export_frame(&frame, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (120, 80));
        assert_eq!(img.get_pixel(5, 70).0, unpack_rgb(frame.get(5, 70)));
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let mut world = World::with_seed(3).unwrap();
        let chunk = world.chunk(0, 0);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("chunk.png");
        assert!(export_chunk(&chunk, &path).is_err());
    }
}
