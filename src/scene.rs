//! Camera, avatar and frame composition.
//!
//! A frame is the cached chunk raster under the viewport with landmark
//! icons, props and the avatar drawn on top in order of their y
//! coordinate, so whatever stands lower on the screen covers what
//! stands behind it.

use tracing::trace;

use crate::chunk::{
    pack_rgb, tile_to_pixel, pixel_to_tile, ChunkCoord, BLOCK_PIXELS, CHUNK_PIXELS,
};
use crate::config::WorldConfig;
use crate::error::{ensure_finite, WorldError};
use crate::landmarks::{LandmarkCategory, Point};
use crate::props::PropKind;
use crate::world::World;

/// Distance in tiles at which the avatar counts as arrived
pub const ARRIVE_EPSILON: f64 = 0.05;

/// Frames per half cycle of the walking bob
pub const BOB_PERIOD: u64 = 16;

const AVATAR_COLOR: [u8; 3] = [244, 214, 72];
const AVATAR_EYE: [u8; 3] = [34, 30, 40];
const TRUNK_COLOR: [u8; 3] = [96, 64, 36];
const ICON_OUTLINE: [u8; 3] = [40, 34, 30];

/// Window size in pixels
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Chunks intersecting the viewport, grown by `margin` chunks on every
    /// side, in row-major order.
    pub fn visible_chunks(&self, camera: &Camera, margin: i32) -> Vec<ChunkCoord> {
        let first = ChunkCoord::containing_pixel(camera.x, camera.y);
        let last = ChunkCoord::containing_pixel(
            camera.x + self.width.max(1) as f64 - 1.0,
            camera.y + self.height.max(1) as f64 - 1.0,
        );
        let mut coords = Vec::new();
        for cy in first.y - margin..=last.y + margin {
            for cx in first.x - margin..=last.x + margin {
                coords.push(ChunkCoord::new(cx, cy));
            }
        }
        coords
    }
}

/// Top-left corner of the viewport in world pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
}

impl Camera {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Camera with the tile position `(x, y)` in the middle of the viewport
    pub fn centered_on(x: f64, y: f64, viewport: &Viewport) -> Self {
        Self::new(
            (tile_to_pixel(x) - viewport.width as f64 * 0.5).round(),
            (tile_to_pixel(y) - viewport.height as f64 * 0.5).round(),
        )
    }

    /// Shift the camera just enough to keep the avatar inside the dead
    /// zone rectangle. Shifts land on whole pixels.
    pub fn follow(&mut self, avatar: &Avatar, viewport: &Viewport, dead_zone: f64) {
        self.x = follow_axis(self.x, tile_to_pixel(avatar.x), viewport.width as f64, dead_zone);
        self.y = follow_axis(self.y, tile_to_pixel(avatar.y), viewport.height as f64, dead_zone);
    }

    pub fn world_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (tile_to_pixel(x) - self.x, tile_to_pixel(y) - self.y)
    }

    pub fn screen_to_world(&self, sx: f64, sy: f64) -> (f64, f64) {
        (pixel_to_tile(sx + self.x), pixel_to_tile(sy + self.y))
    }
}

fn follow_axis(camera: f64, target: f64, extent: f64, dead_zone: f64) -> f64 {
    let margin = extent * dead_zone;
    let screen = target - camera;
    if screen < margin {
        (target - margin).floor()
    } else if screen > extent - margin {
        (target - (extent - margin)).ceil()
    } else {
        camera
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

/// The player marker, in tile units
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Avatar {
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
    pub moving: bool,
    pub target: Option<Point>,
}

impl Avatar {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    pub fn set_target(&mut self, x: f64, y: f64) -> Result<(), WorldError> {
        ensure_finite(x, y)?;
        self.target = Some(Point::new(x, y));
        Ok(())
    }

    /// Advance toward the target by `speed * dt` tiles.
    ///
    /// A step that would end on a tile `walkable` rejects leaves the
    /// avatar where it is and drops the target.
    pub fn step(&mut self, dt: f64, speed: f64, walkable: impl Fn(f64, f64) -> bool) {
        let Some(target) = self.target else {
            self.moving = false;
            return;
        };

        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= ARRIVE_EPSILON {
            self.x = target.x;
            self.y = target.y;
            self.target = None;
            self.moving = false;
            return;
        }
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        self.facing = if dx.abs() >= dy.abs() {
            if dx < 0.0 {
                Facing::Left
            } else {
                Facing::Right
            }
        } else if dy < 0.0 {
            Facing::Up
        } else {
            Facing::Down
        };

        let travel = speed * dt;
        let arrives = travel >= dist - ARRIVE_EPSILON;
        let (nx, ny) = if arrives {
            (target.x, target.y)
        } else {
            (self.x + dx / dist * travel, self.y + dy / dist * travel)
        };

        if !walkable(nx, ny) {
            self.target = None;
            self.moving = false;
            return;
        }

        self.x = nx;
        self.y = ny;
        if arrives {
            self.target = None;
            self.moving = false;
        } else {
            self.moving = true;
        }
    }
}

/// A composed frame, row-major `0x00RRGGBB`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Fill a rectangle given in signed screen pixels, clipped to the frame.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: u32) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i64);
        let y1 = (y + h).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for py in y0..y1 {
            let row = py as usize * self.width;
            self.pixels[row + x0 as usize..row + x1 as usize].fill(color);
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum SpriteKind {
    Landmark(LandmarkCategory),
    Prop(PropKind),
    Avatar { facing: Facing, bob: bool },
}

#[derive(Clone, Copy, Debug)]
struct Sprite {
    x: f64,
    y: f64,
    kind: SpriteKind,
}

/// Compose the frame the camera sees.
pub fn render_frame(
    world: &mut World,
    camera: &Camera,
    avatar: &Avatar,
    frame_counter: u64,
    viewport: &Viewport,
) -> Frame {
    let mut frame = Frame::new(viewport.width, viewport.height);

    // floor, as in visible_chunks and draw_sprite, so negative fractional
    // offsets still cover the last column and row
    let (cx, cy) = (camera.x.floor() as i64, camera.y.floor() as i64);
    let coords = viewport.visible_chunks(camera, 0);
    for coord in &coords {
        let chunk = world.chunk(coord.x, coord.y);
        let (ox, oy) = coord.origin_pixels();
        blit_chunk(&mut frame, chunk.pixels(), ox - cx, oy - cy);
    }
    trace!(chunks = coords.len(), frame_counter, "composed terrain");

    let mut sprites: Vec<Sprite> = Vec::with_capacity(world.landmarks().len() + world.props().len() + 1);
    sprites.extend(world.landmarks().iter().map(|l| Sprite {
        x: l.x,
        y: l.y,
        kind: SpriteKind::Landmark(l.category),
    }));
    sprites.extend(world.props().iter().map(|p| Sprite {
        x: p.x,
        y: p.y,
        kind: SpriteKind::Prop(p.kind),
    }));
    sprites.push(Sprite {
        x: avatar.x,
        y: avatar.y,
        kind: SpriteKind::Avatar {
            facing: avatar.facing,
            bob: avatar.moving && (frame_counter / BOB_PERIOD) % 2 == 1,
        },
    });

    // stable, so equal depths keep landmark < prop < avatar
    sprites.sort_by(|a, b| a.y.total_cmp(&b.y));
    for sprite in &sprites {
        draw_sprite(&mut frame, camera, sprite);
    }
    frame
}

fn blit_chunk(frame: &mut Frame, pixels: &[u32], left: i64, top: i64) {
    let x0 = left.max(0);
    let x1 = (left + CHUNK_PIXELS as i64).min(frame.width as i64);
    if x0 >= x1 {
        return;
    }
    for py in top.max(0)..(top + CHUNK_PIXELS as i64).min(frame.height as i64) {
        let src_row = (py - top) as usize * CHUNK_PIXELS;
        let dst_row = py as usize * frame.width;
        let src = &pixels[src_row + (x0 - left) as usize..src_row + (x1 - left) as usize];
        frame.pixels[dst_row + x0 as usize..dst_row + x1 as usize].copy_from_slice(src);
    }
}

fn draw_sprite(frame: &mut Frame, camera: &Camera, sprite: &Sprite) {
    let (sx, sy) = camera.world_to_screen(sprite.x, sprite.y);
    let (sx, sy) = (sx.floor() as i64, sy.floor() as i64);
    let block = BLOCK_PIXELS as i64;

    match sprite.kind {
        SpriteKind::Landmark(category) => {
            let half = tile_to_pixel(category.icon_radius()) as i64;
            frame.fill_rect(sx - half, sy - half, 2 * half, 2 * half, pack_rgb(ICON_OUTLINE));
            frame.fill_rect(
                sx - half + block,
                sy - half + block,
                2 * (half - block),
                2 * (half - block),
                pack_rgb(category.color()),
            );
        }
        SpriteKind::Prop(kind) => {
            let (bw, bh) = kind.size_blocks();
            let (w, h) = (bw as i64 * block, bh as i64 * block);
            let color = pack_rgb(kind.color());
            match kind {
                PropKind::Tree | PropKind::Pine => {
                    frame.fill_rect(sx - w / 2, sy - h, w, h - block, color);
                    frame.fill_rect(sx - block / 2, sy - block, block, block, pack_rgb(TRUNK_COLOR));
                }
                _ => frame.fill_rect(sx - w / 2, sy - h, w, h, color),
            }
        }
        SpriteKind::Avatar { facing, bob } => {
            let (w, h) = (3 * block, 4 * block);
            let top = sy - h - if bob { block } else { 0 };
            frame.fill_rect(sx - w / 2, top, w, h, pack_rgb(AVATAR_COLOR));
            let eye_x = match facing {
                Facing::Left => Some(sx - w / 2),
                Facing::Right => Some(sx + w / 2 - block),
                Facing::Down => Some(sx - block / 2),
                Facing::Up => None,
            };
            if let Some(eye_x) = eye_x {
                frame.fill_rect(eye_x, top, block, block, pack_rgb(AVATAR_EYE));
            }
        }
    }
}

/// Movement and camera tunables taken from the config
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneSettings {
    pub avatar_speed: f64,
    pub dead_zone: f64,
}

impl SceneSettings {
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            avatar_speed: config.avatar_speed,
            dead_zone: config.dead_zone,
        }
    }
}

/// Everything the frame loop mutates besides the world
pub struct Scene {
    pub camera: Camera,
    pub avatar: Avatar,
    pub viewport: Viewport,
    pub frame_counter: u64,
    pub settings: SceneSettings,
}

impl Scene {
    /// Scene with the avatar standing on the base and the camera on it.
    pub fn new(world: &World, viewport: Viewport) -> Self {
        let start = world.base().map_or(Point::default(), |b| b.position());
        Self {
            camera: Camera::centered_on(start.x, start.y, &viewport),
            avatar: Avatar::new(start.x, start.y),
            viewport,
            frame_counter: 0,
            settings: SceneSettings::from_config(world.config()),
        }
    }

    pub fn set_target(&mut self, x: f64, y: f64) -> Result<(), WorldError> {
        self.avatar.set_target(x, y)
    }

    /// Walk toward the tile under a screen position.
    pub fn set_target_screen(&mut self, sx: f64, sy: f64) -> Result<(), WorldError> {
        let (x, y) = self.camera.screen_to_world(sx, sy);
        self.set_target(x, y)
    }

    /// Advance one frame: move the avatar, follow it with the camera and
    /// warm the cache around the new view.
    pub fn tick(&mut self, world: &mut World, dt: f64) {
        self.avatar
            .step(dt, self.settings.avatar_speed, |x, y| world.is_walkable(x, y));
        self.camera
            .follow(&self.avatar, &self.viewport, self.settings.dead_zone);
        world.prefetch_around(&self.camera, &self.viewport);
        self.frame_counter = self.frame_counter.wrapping_add(1);
    }

    pub fn render(&self, world: &mut World) -> Frame {
        render_frame(world, &self.camera, &self.avatar, self.frame_counter, &self.viewport)
    }

    /// Put the avatar back on the base, e.g. after a reseed.
    pub fn respawn(&mut self, world: &World) {
        let frame_counter = self.frame_counter;
        *self = Scene::new(world, self.viewport);
        self.frame_counter = frame_counter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::unpack_rgb;
    use crate::landmarks::Landmark;

    fn lone_world() -> World {
        World::new(WorldConfig {
            seed: 3,
            landmarks: vec![Landmark::new("camp", 10.0, 10.0, LandmarkCategory::Base)],
            connections: vec![],
            ..WorldConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_avatar_reaches_target() {
        let mut avatar = Avatar::new(0.0, 0.0);
        avatar.set_target(3.0, 4.0).unwrap();
        avatar.step(0.5, 2.0, |_, _| true);
        assert!(avatar.moving);
        assert!((avatar.x - 0.6).abs() < 1e-12 && (avatar.y - 0.8).abs() < 1e-12);
        assert_eq!(avatar.facing, Facing::Down);

        for _ in 0..10 {
            avatar.step(0.5, 2.0, |_, _| true);
        }
        assert_eq!((avatar.x, avatar.y), (3.0, 4.0));
        assert!(!avatar.moving);
        assert!(avatar.target.is_none());
    }

    #[test]
    fn test_avatar_stops_at_water() {
        let mut avatar = Avatar::new(0.0, 0.0);
        avatar.set_target(10.0, 0.0).unwrap();
        // water from x = 2.5 onward
        let walkable = |x: f64, _y: f64| x < 2.5;
        for _ in 0..20 {
            avatar.step(0.25, 4.0, walkable);
        }
        assert_eq!(avatar.x, 2.0);
        assert_eq!(avatar.facing, Facing::Right);
        assert!(!avatar.moving);
        assert!(avatar.target.is_none());
    }

    #[test]
    fn test_set_target_rejects_non_finite() {
        let mut avatar = Avatar::new(1.0, 1.0);
        assert!(avatar.set_target(f64::NAN, 0.0).is_err());
        assert!(avatar.set_target(0.0, f64::NEG_INFINITY).is_err());
        assert!(avatar.target.is_none());
    }

    #[test]
    fn test_camera_dead_zone() {
        let viewport = Viewport::new(200, 100);
        let mut camera = Camera::new(0.0, 0.0);

        // screen (80, 50) is inside the inner rect 60..140 x 30..70
        let mut avatar = Avatar::new(5.0, 3.125);
        camera.follow(&avatar, &viewport, 0.3);
        assert_eq!(camera, Camera::new(0.0, 0.0));

        // x = 10.3 tiles is 164.8 px, beyond 140
        avatar.x = 10.3;
        camera.follow(&avatar, &viewport, 0.3);
        assert_eq!(camera.x, 25.0);
        let (sx, _) = camera.world_to_screen(avatar.x, avatar.y);
        assert!(sx <= 140.0 && sx >= 60.0);

        avatar.y = -1.0;
        camera.follow(&avatar, &viewport, 0.3);
        assert_eq!(camera.y, -46.0);
        assert_eq!(camera.y.fract(), 0.0);
    }

    #[test]
    fn test_camera_round_trip() {
        let camera = Camera::new(-37.0, 512.0);
        let (sx, sy) = camera.world_to_screen(3.5, 40.25);
        assert_eq!(camera.screen_to_world(sx, sy), (3.5, 40.25));
    }

    #[test]
    fn test_visible_chunks() {
        let viewport = Viewport::new(300, 200);
        let coords = viewport.visible_chunks(&Camera::new(-10.0, 0.0), 0);
        assert_eq!(
            coords,
            vec![
                ChunkCoord::new(-1, 0),
                ChunkCoord::new(0, 0),
                ChunkCoord::new(1, 0)
            ]
        );
        assert_eq!(viewport.visible_chunks(&Camera::new(0.0, 0.0), 1).len(), 4 * 3);
    }

    #[test]
    fn test_frame_shows_terrain_under_camera() {
        let mut world = lone_world();
        let viewport = Viewport::new(64, 48);
        let camera = Camera::new(-300.0, -300.0);
        // avatar far off screen
        let avatar = Avatar::new(1000.0, 1000.0);
        let frame = render_frame(&mut world, &camera, &avatar, 0, &viewport);

        let chunk = world.chunk(-2, -2);
        // screen (0, 0) is world pixel (-300, -300), i.e. (212, 212) in chunk (-2, -2)
        assert_eq!(frame.get(0, 0), chunk.pixel(212, 212));
        assert_eq!(frame.get(43, 43), chunk.pixel(255, 255));
        let chunk_right = world.chunk(-1, -1);
        assert_eq!(frame.get(44, 44), chunk_right.pixel(0, 0));
    }

    #[test]
    fn test_fractional_camera_paints_every_pixel() {
        let mut world = lone_world();
        let viewport = Viewport::new(256, 4);
        let camera = Camera::new(-255.5, -1000.0);
        let avatar = Avatar::new(1000.0, 1000.0);
        let frame = render_frame(&mut world, &camera, &avatar, 0, &viewport);

        assert!(frame.pixels.iter().all(|&p| p != 0));
        // camera floors to (-256, -1000): row 0 is row 24 of chunk (-1, -4)
        let chunk = world.chunk(-1, -4);
        assert_eq!(frame.get(0, 0), chunk.pixel(0, 24));
        assert_eq!(frame.get(255, 0), chunk.pixel(255, 24));
    }

    #[test]
    fn test_sprites_sorted_by_depth() {
        let mut world = lone_world();
        let viewport = Viewport::new(320, 320);
        let camera = Camera::new(0.0, 0.0);
        let body = pack_rgb(AVATAR_COLOR);
        let icon = pack_rgb(LandmarkCategory::Base.color());

        // avatar stands just below the landmark and covers its icon
        let front = Avatar::new(10.0, 10.5);
        let frame = render_frame(&mut world, &camera, &front, 0, &viewport);
        assert_eq!(frame.get(160, 164), body);

        // avatar stands just above and is hidden behind it
        let behind = Avatar::new(10.0, 9.9);
        let frame = render_frame(&mut world, &camera, &behind, 0, &viewport);
        assert_eq!(frame.get(160, 154), icon);
        assert_eq!(unpack_rgb(frame.get(160, 154)), LandmarkCategory::Base.color());
    }

    #[test]
    fn test_avatar_bobs_while_moving() {
        let mut world = lone_world();
        let viewport = Viewport::new(320, 320);
        // outside the prop bounds so nothing is drawn over the avatar
        let camera = Camera::new(480.0, 480.0);
        let mut avatar = Avatar::new(40.0, 40.0);
        avatar.moving = true;
        let body = pack_rgb(AVATAR_COLOR);

        // feet at screen y = 160; the bottom row lifts by one block on odd half cycles
        let still = render_frame(&mut world, &camera, &avatar, 0, &viewport);
        let bobbed = render_frame(&mut world, &camera, &avatar, BOB_PERIOD, &viewport);
        assert_eq!(still.get(160, 158), body);
        assert_ne!(bobbed.get(160, 158), body);
        assert_eq!(bobbed.get(160, 154), body);
    }

    #[test]
    fn test_scene_tick_walks_and_counts() {
        let mut world = lone_world();
        let mut scene = Scene::new(&world, Viewport::new(160, 120));
        assert_eq!((scene.avatar.x, scene.avatar.y), (10.0, 10.0));

        scene.set_target(10.5, 10.0).unwrap();
        for _ in 0..30 {
            scene.tick(&mut world, 1.0 / 30.0);
        }
        assert_eq!(scene.frame_counter, 30);
        assert_eq!((scene.avatar.x, scene.avatar.y), (10.5, 10.0));
        assert!(world.cache_stats().len > 0);

        let frame = scene.render(&mut world);
        assert_eq!(frame.pixels.len(), 160 * 120);
        assert!(scene.set_target(f64::INFINITY, 0.0).is_err());
    }
}
