//! 2D gradient noise for procedural heightfields
//!
//! Seeded, deterministic fractal noise used by [`super::HeightGrid::from_noise`].
//! Uses the standard Ken Perlin permutation table with a seed-mixed hash.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Configuration for fractal noise heightfields
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoiseConfig {
    /// Base frequency controls feature size (lower = larger features)
    pub base_frequency: f32,
    /// Number of octaves for fractal detail layers
    pub octaves: usize,
    /// Amplitude decay per octave (controls roughness)
    pub persistence: f32,
    /// Frequency multiplier per octave
    pub lacunarity: f32,
    /// Output scale applied to the normalized noise value
    pub amplitude: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            base_frequency: 0.04,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            amplitude: 10.0,
        }
    }
}

// Standard 256-element permutation table from Ken Perlin's reference
// implementation. Must remain unchanged to keep generated terrain stable
// across versions.
const PERM: [u32; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

/// Hash a lattice coordinate, mixing the seed into the table lookups
#[inline]
fn hash(x: i32, z: i32, seed: u32) -> u32 {
    let seed_hash = (seed.wrapping_mul(1103515245).wrapping_add(12345)) >> 16;
    let ix = ((x as u32) ^ seed_hash) & 255;
    let iz = ((z as u32) ^ (seed_hash >> 8)) & 255;
    let a = PERM[ix as usize];
    PERM[((a + iz) & 255) as usize]
}

/// Gradient dot product for one of 8 lattice directions
#[inline]
fn gradient(hash_value: u32, x: f32, z: f32) -> f32 {
    match hash_value & 7 {
        0 => x + z,
        1 => x - z,
        2 => -x + z,
        3 => -x - z,
        4 => x,
        5 => -x,
        6 => z,
        _ => -z,
    }
}

/// Quintic smoothstep interpolation (Ken Perlin's improved fade function)
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Sample 2D gradient noise at a position, returning a value in [-1, 1]
fn perlin_2d(pos: Vec2, seed: u32) -> f32 {
    let x0 = pos.x.floor() as i32;
    let z0 = pos.y.floor() as i32;
    let x1 = x0 + 1;
    let z1 = z0 + 1;

    let xf = pos.x - pos.x.floor();
    let zf = pos.y - pos.y.floor();

    let u = fade(xf);
    let v = fade(zf);

    let g00 = gradient(hash(x0, z0, seed), xf, zf);
    let g10 = gradient(hash(x1, z0, seed), xf - 1.0, zf);
    let g01 = gradient(hash(x0, z1, seed), xf, zf - 1.0);
    let g11 = gradient(hash(x1, z1, seed), xf - 1.0, zf - 1.0);

    let bottom = lerp(g00, g10, u);
    let top = lerp(g01, g11, u);

    // 2D gradient noise peaks below 1; rescale toward the nominal range
    lerp(bottom, top, v) * std::f32::consts::SQRT_2
}

/// Sample fractal Brownian motion noise at a position
///
/// Accumulates `config.octaves` layers of gradient noise, each at higher
/// frequency and lower amplitude, and normalizes the result to roughly
/// [-1, 1]. `config.amplitude` is not applied here; it is a grid-level
/// output scale.
pub fn sample_fbm_2d(position: Vec2, seed: u32, config: &NoiseConfig) -> f32 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = config.base_frequency;
    let mut max_value = 0.0;

    for octave in 0..config.octaves {
        let octave_seed = seed.wrapping_add(octave as u32 * 1013);
        total += perlin_2d(position * frequency, octave_seed) * amplitude;
        max_value += amplitude;
        frequency *= config.lacunarity;
        amplitude *= config.persistence;
    }

    total / max_value
}

/// Per-octave sample offsets derived from the seed
///
/// Offsetting each octave breaks up the axis-aligned artifacts that appear
/// when every layer shares the lattice origin.
pub(crate) fn octave_offsets(seed: u32, octaves: usize) -> Vec<Vec2> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
    (0..octaves)
        .map(|_| Vec2::new(rng.gen_range(-1024.0..1024.0), rng.gen_range(-1024.0..1024.0)))
        .collect()
}

/// fBm sampling with explicit per-octave offsets
pub(crate) fn sample_fbm_2d_offset(
    position: Vec2,
    seed: u32,
    config: &NoiseConfig,
    offsets: &[Vec2],
) -> f32 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = config.base_frequency;
    let mut max_value = 0.0;

    for (octave, offset) in offsets.iter().enumerate() {
        let octave_seed = seed.wrapping_add(octave as u32 * 1013);
        total += perlin_2d(position * frequency + *offset, octave_seed) * amplitude;
        max_value += amplitude;
        frequency *= config.lacunarity;
        amplitude *= config.persistence;
    }

    total / max_value.max(f32::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let config = NoiseConfig::default();
        let pos = Vec2::new(12.5, 33.7);

        let a = sample_fbm_2d(pos, 42, &config);
        let b = sample_fbm_2d(pos, 42, &config);
        assert_eq!(a, b, "same seed and position must match");
    }

    #[test]
    fn test_different_seeds() {
        let config = NoiseConfig::default();
        let pos = Vec2::new(5.3, 8.1);

        let a = sample_fbm_2d(pos, 42, &config);
        let b = sample_fbm_2d(pos, 999, &config);
        assert_ne!(a, b, "different seeds should diverge");
    }

    #[test]
    fn test_range() {
        let config = NoiseConfig::default();
        for i in 0..64 {
            let pos = Vec2::new(i as f32 * 1.7, i as f32 * 0.9);
            let value = sample_fbm_2d(pos, 7, &config);
            assert!(
                (-1.5..=1.5).contains(&value),
                "fbm value {} at {:?} outside reasonable range",
                value,
                pos
            );
        }
    }

    #[test]
    fn test_octave_offsets_deterministic() {
        let a = octave_offsets(42, 4);
        let b = octave_offsets(42, 4);
        assert_eq!(a, b);

        let c = octave_offsets(43, 4);
        assert_ne!(a, c);
    }

    #[test]
    fn test_perlin_core_range() {
        for i in 0..32 {
            let pos = Vec2::new(i as f32 * 0.31, i as f32 * 0.47);
            let v = perlin_2d(pos, 42);
            assert!((-1.5..=1.5).contains(&v), "raw noise {} out of range", v);
        }
    }
}
