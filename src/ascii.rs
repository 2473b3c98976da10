//! ASCII rendering of the classifier, for eyeballing worlds in a terminal
//! or diffing them in a text file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::WorldError;
use crate::landmarks::{pick_landmark, Bounds};
use crate::terrain::TerrainKind;
use crate::world::World;

/// One character per sample, `step` tiles apart, rows top to bottom.
/// Samples within half a step of a landmark show the landmark instead.
pub fn render_ascii(world: &World, bounds: &Bounds, step: f64) -> String {
    let step = if step.is_finite() && step > 0.0 { step } else { 1.0 };
    let cols = (bounds.width() / step).floor() as usize + 1;
    let rows = (bounds.height() / step).floor() as usize + 1;

    let mut out = String::with_capacity((cols + 1) * rows);
    for row in 0..rows {
        let y = bounds.min_y + row as f64 * step;
        for col in 0..cols {
            let x = bounds.min_x + col as f64 * step;
            let c = match pick_landmark(world.landmarks(), x, y, step * 0.5) {
                Some(landmark) => landmark.category.ascii_char(),
                None => world.classify(x, y).ascii_char(),
            };
            out.push(c);
        }
        out.push('\n');
    }
    out
}

/// Sample counts per terrain kind, in [`TerrainKind::ALL`] order
pub fn kind_counts(world: &World, bounds: &Bounds, step: f64) -> [usize; 5] {
    let step = if step.is_finite() && step > 0.0 { step } else { 1.0 };
    let mut counts = [0usize; 5];
    let mut y = bounds.min_y;
    while y <= bounds.max_y {
        let mut x = bounds.min_x;
        while x <= bounds.max_x {
            let kind = world.classify(x, y);
            if let Some(slot) = TerrainKind::ALL.iter().position(|k| *k == kind) {
                counts[slot] += 1;
            }
            x += step;
        }
        y += step;
    }
    counts
}

pub fn legend() -> String {
    let mut out = String::from("LEGEND:\n");
    for kind in TerrainKind::ALL {
        out.push_str(&format!("  {} = {:?}\n", kind.ascii_char(), kind));
    }
    out.push_str("  B A L W R S = Base, Academy, Library, Workshop, Arena, Shrine\n");
    out
}

/// Write the map with a header and legend to a text file
pub fn export_ascii(world: &World, bounds: &Bounds, step: f64, path: &Path) -> Result<(), WorldError> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(
        file,
        "=== TERRAIN ({:.0},{:.0})..({:.0},{:.0}) step={} seed={} ===",
        bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y, step, world.seed()
    )?;
    writeln!(file, "{}", legend())?;
    write!(file, "{}", render_ascii(world, bounds, step))?;
    file.flush()?;
    Ok(())
}
