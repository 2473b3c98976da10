use std::time::Instant;

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use tracing::info;

use crate::error::WorldError;
use crate::scene::{Scene, Viewport};
use crate::world::World;

/// Longest frame step fed to the avatar, so a stalled window does not
/// teleport it across the map
const MAX_FRAME_DT: f64 = 0.1;

/// Run the interactive viewer.
/// Click to walk, click a landmark to inspect it, R to reseed,
/// L to switch the cache policy, Escape to exit.
pub fn run_viewer(mut world: World, width: usize, height: usize) -> Result<(), WorldError> {
    let mut window = Window::new(
        "Painted World - Click: Walk, R: Reseed, L: Cache policy, Esc: Exit",
        width,
        height,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| WorldError::Window(e.to_string()))?;

    window.set_target_fps(60);

    let mut scene = Scene::new(&world, Viewport::new(width, height));
    world.prefetch_around(&scene.camera, &scene.viewport);

    println!("Viewer started. Controls:");
    println!("  Click: walk there (or inspect a landmark)");
    println!("  R: Reseed");
    println!("  L: Toggle FIFO/LRU chunk cache");
    println!("  Esc: Exit");

    let mut last_frame = Instant::now();
    let mut mouse_was_down = false;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_pressed(Key::R, KeyRepeat::No) {
            let seed = rand::random::<u32>();
            println!("Reseeding with seed: {}", seed);
            world.reseed(seed)?;
            scene.respawn(&world);
        }

        if window.is_key_pressed(Key::L, KeyRepeat::No) {
            let policy = world.cache_policy().toggled();
            world.set_cache_policy(policy);
            let stats = world.cache_stats();
            println!(
                "Cache policy: {} ({} / {} chunks, hit rate {:.1}%)",
                policy,
                stats.len,
                stats.capacity,
                stats.hit_rate() * 100.0
            );
        }

        let mouse_down = window.get_mouse_down(MouseButton::Left);
        if mouse_down && !mouse_was_down {
            if let Some((mx, my)) = window.get_mouse_pos(MouseMode::Discard) {
                handle_click(&world, &mut scene, mx as f64, my as f64)?;
            }
        }
        mouse_was_down = mouse_down;

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f64().min(MAX_FRAME_DT);
        last_frame = now;

        scene.tick(&mut world, dt);
        let frame = scene.render(&mut world);

        window
            .update_with_buffer(&frame.pixels, frame.width, frame.height)
            .map_err(|e| WorldError::Window(e.to_string()))?;
    }

    let stats = world.cache_stats();
    info!(
        hits = stats.hits,
        misses = stats.misses,
        evictions = stats.evictions,
        "viewer closed"
    );
    Ok(())
}

fn handle_click(world: &World, scene: &mut Scene, sx: f64, sy: f64) -> Result<(), WorldError> {
    let (x, y) = scene.camera.screen_to_world(sx, sy);
    match world.hit_test(x, y)? {
        Some(landmark) => {
            println!(
                "{} ({:?}) at ({:.1}, {:.1})",
                landmark.id, landmark.category, landmark.x, landmark.y
            );
            scene.set_target(landmark.x, landmark.y)
        }
        None => scene.set_target(x, y),
    }
}
