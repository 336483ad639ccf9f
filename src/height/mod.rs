//! Heightfield sources
//!
//! Provides the read-only heightfield contract consumed by the tessellator,
//! plus an owned in-memory grid implementation and procedural generators.

mod noise;

pub use noise::{sample_fbm_2d, NoiseConfig};

use glam::Vec3;

/// Read-only grid of height samples with derived normals
///
/// Implementations must return stable values for the lifetime of the
/// [`crate::Terrain`] built on top of them; the tessellator assumes the same
/// coordinate always yields the same height.
///
/// Coordinates are grid indices: `0 <= x < width()`, `0 <= z < depth()`.
pub trait HeightSource {
    /// Number of samples along the x axis
    fn width(&self) -> usize;

    /// Number of samples along the z axis
    fn depth(&self) -> usize;

    /// Raw height at a grid coordinate
    fn height(&self, x: usize, z: usize) -> f32;

    /// Surface normal at a grid coordinate
    ///
    /// The default implementation uses central differences over the four
    /// axis neighbors, clamped at the grid border, assuming unit sample
    /// spacing.
    fn normal(&self, x: usize, z: usize) -> Vec3 {
        let xl = self.height(x.saturating_sub(1), z);
        let xr = self.height((x + 1).min(self.width() - 1), z);
        let zd = self.height(x, z.saturating_sub(1));
        let zu = self.height(x, (z + 1).min(self.depth() - 1));

        let dhdx = (xr - xl) * 0.5;
        let dhdz = (zu - zd) * 0.5;
        Vec3::new(-dhdx, 1.0, -dhdz).normalize()
    }
}

impl<H: HeightSource + ?Sized> HeightSource for &H {
    fn width(&self) -> usize {
        (**self).width()
    }

    fn depth(&self) -> usize {
        (**self).depth()
    }

    fn height(&self, x: usize, z: usize) -> f32 {
        (**self).height(x, z)
    }

    fn normal(&self, x: usize, z: usize) -> Vec3 {
        (**self).normal(x, z)
    }
}

/// Owned in-memory heightfield
///
/// Samples are stored row-major (`z * width + x`). This is the simplest way
/// to feed the terrain from decoded image data, streamed chunks, or
/// procedural generation.
///
/// # Example
///
/// ```rust
/// use geomip_terrain::*;
///
/// let grid = HeightGrid::from_fn(33, 33, |x, z| (x + z) as f32 * 0.1);
/// assert_eq!(grid.width(), 33);
/// ```
#[derive(Debug, Clone)]
pub struct HeightGrid {
    heights: Vec<f32>,
    width: usize,
    depth: usize,
}

impl HeightGrid {
    /// Create a grid from raw row-major samples
    ///
    /// Returns `None` if `heights.len() != width * depth` or either
    /// dimension is zero.
    pub fn from_vec(width: usize, depth: usize, heights: Vec<f32>) -> Option<Self> {
        if width == 0 || depth == 0 || heights.len() != width * depth {
            return None;
        }
        Some(Self {
            heights,
            width,
            depth,
        })
    }

    /// Create a grid by evaluating a function at every sample
    pub fn from_fn<F>(width: usize, depth: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f32,
    {
        let mut heights = Vec::with_capacity(width * depth);
        for z in 0..depth {
            for x in 0..width {
                heights.push(f(x, z));
            }
        }
        Self {
            heights,
            width,
            depth,
        }
    }

    /// Create a grid filled with seeded fractal noise
    ///
    /// Deterministic: the same seed, dimensions, and configuration always
    /// produce the same grid. Useful for demos and tests that need varied
    /// but reproducible terrain.
    pub fn from_noise(width: usize, depth: usize, seed: u32, config: &NoiseConfig) -> Self {
        let offsets = noise::octave_offsets(seed, config.octaves);
        Self::from_fn(width, depth, |x, z| {
            noise::sample_fbm_2d_offset(
                glam::Vec2::new(x as f32, z as f32),
                seed,
                config,
                &offsets,
            ) * config.amplitude
        })
    }

    /// Raw samples in row-major order
    #[inline]
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }
}

impl HeightSource for HeightGrid {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    fn height(&self, x: usize, z: usize) -> f32 {
        self.heights[z * self.width + x]
    }
}
