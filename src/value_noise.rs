//! Hash and value-noise primitives.
//!
//! Everything here is a pure function of `(x, y, seed)`. The terrain
//! classifier, the palette picker, path jitter and prop placement all
//! draw from these, so the same seed always paints the same world.

use noise::{NoiseFn, Seedable};

/// Octaves summed by [`fbm`]
pub const FBM_OCTAVES: u32 = 5;

/// Frequency multiplier between octaves. Deliberately not 2.0 so lattice
/// points of successive octaves never line up.
pub const LACUNARITY: f64 = 2.1;

/// Amplitude multiplier between octaves
pub const GAIN: f64 = 0.5;

/// How far (in noise space) the warp fields displace the final sample
pub const WARP_STRENGTH: f64 = 1.5;

const WARP_SEED_X: u32 = 0x5851_F42D;
const WARP_SEED_Y: u32 = 0x1405_7B7E;

/// Integer lattice hash in `[0, 1)`.
pub fn hash(x: i32, y: i32, seed: u32) -> f64 {
    let mut h = (x as u32).wrapping_mul(374_761_393);
    h = h.wrapping_add((y as u32).wrapping_mul(668_265_263));
    h = h.wrapping_add(seed.wrapping_mul(2_246_822_519));
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h = (h ^ (h >> 16)).wrapping_mul(2_654_435_761);
    h ^= h >> 15;
    h as f64 / 4_294_967_296.0
}

/// Quintic fade `6t^5 - 15t^4 + 10t^3`
#[inline]
pub fn quintic(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Lattice cell and fractional offset. Octave scaling can push huge inputs
/// to infinity; those have no fractional part left.
#[inline]
fn split(v: f64) -> (i32, f64) {
    let floor = v.floor();
    let frac = v - floor;
    if frac.is_finite() {
        (floor as i32, frac)
    } else {
        (floor as i32, 0.0)
    }
}

/// Bilinear value noise over the integer lattice, in `[-1, 1)`.
pub fn value_noise(x: f64, y: f64, seed: u32) -> f64 {
    let (ix, tx) = split(x);
    let (iy, ty) = split(y);
    let fx = quintic(tx);
    let fy = quintic(ty);

    let ix1 = ix.wrapping_add(1);
    let iy1 = iy.wrapping_add(1);

    let n00 = hash(ix, iy, seed);
    let n10 = hash(ix1, iy, seed);
    let n01 = hash(ix, iy1, seed);
    let n11 = hash(ix1, iy1, seed);

    let top = lerp(n00, n10, fx);
    let bottom = lerp(n01, n11, fx);
    lerp(top, bottom, fy) * 2.0 - 1.0
}

/// Seed used for a given octave so octaves are uncorrelated
#[inline]
fn octave_seed(seed: u32, octave: u32) -> u32 {
    seed.wrapping_add(octave.wrapping_mul(1013))
}

/// Fractal Brownian motion: [`FBM_OCTAVES`] octaves of [`value_noise`],
/// normalised by the total amplitude.
pub fn fbm(x: f64, y: f64, seed: u32) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for octave in 0..FBM_OCTAVES {
        total += value_noise(x * frequency, y * frequency, octave_seed(seed, octave)) * amplitude;
        max_value += amplitude;
        amplitude *= GAIN;
        frequency *= LACUNARITY;
    }

    total / max_value
}

/// Domain-warped fbm. Two independent fbm fields form an offset vector
/// and the final fbm is sampled at the displaced coordinate.
pub fn warped_noise(x: f64, y: f64, seed: u32) -> f64 {
    let qx = fbm(x, y, seed.wrapping_add(WARP_SEED_X));
    let qy = fbm(x + 5.2, y + 1.3, seed.wrapping_add(WARP_SEED_Y));
    fbm(x + WARP_STRENGTH * qx, y + WARP_STRENGTH * qy, seed)
}

/// [`value_noise`] as a `noise` crate source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValueField {
    seed: u32,
}

impl ValueField {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }
}

impl NoiseFn<f64, 2> for ValueField {
    fn get(&self, point: [f64; 2]) -> f64 {
        value_noise(point[0], point[1], self.seed)
    }
}

impl Seedable for ValueField {
    fn set_seed(self, seed: u32) -> Self {
        Self { seed }
    }

    fn seed(&self) -> u32 {
        self.seed
    }
}

/// [`fbm`] as a `noise` crate source, with an input frequency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FbmField {
    seed: u32,
    pub frequency: f64,
}

impl FbmField {
    pub fn new(seed: u32) -> Self {
        Self { seed, frequency: 1.0 }
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }
}

impl NoiseFn<f64, 2> for FbmField {
    fn get(&self, point: [f64; 2]) -> f64 {
        fbm(point[0] * self.frequency, point[1] * self.frequency, self.seed)
    }
}

impl Seedable for FbmField {
    fn set_seed(self, seed: u32) -> Self {
        Self { seed, ..self }
    }

    fn seed(&self) -> u32 {
        self.seed
    }
}

/// [`warped_noise`] as a `noise` crate source, with an input frequency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WarpedField {
    seed: u32,
    pub frequency: f64,
}

impl WarpedField {
    pub fn new(seed: u32) -> Self {
        Self { seed, frequency: 1.0 }
    }

    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }
}

impl NoiseFn<f64, 2> for WarpedField {
    fn get(&self, point: [f64; 2]) -> f64 {
        warped_noise(point[0] * self.frequency, point[1] * self.frequency, self.seed)
    }
}

impl Seedable for WarpedField {
    fn set_seed(self, seed: u32) -> Self {
        Self { seed, ..self }
    }

    fn seed(&self) -> u32 {
        self.seed
    }
}
