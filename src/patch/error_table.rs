//! Per-patch approximation error model
//!
//! For every LOD level a patch can render at, this table stores how far the
//! coarse mesh deviates from the true heightfield, plus the world-space
//! points needed to project that deviation into screen space each frame.

use glam::Vec3;

use super::{world_point, MAX_LOD, PATCH_STRIDE};
use crate::config::TerrainConfig;
use crate::height::HeightSource;

/// One LOD level's approximation error
#[derive(Debug, Clone, Copy)]
pub(crate) struct LodErrorEntry {
    /// Mean absolute height deviation in world units
    pub error: f32,
    /// World-space position of the patch-center sample
    pub reference: Vec3,
    /// `reference` displaced vertically by `error`
    pub displaced: Vec3,
}

/// Precomputed approximation errors for all LOD levels of one patch
///
/// Computed once at terrain construction; level 0 always has error 0, and
/// entries are clamped so errors never decrease with level.
#[derive(Debug, Clone)]
pub(crate) struct LodErrorTable {
    entries: [LodErrorEntry; MAX_LOD + 1],
}

impl LodErrorTable {
    /// Compute the table for the patch window starting at `origin`
    ///
    /// For each level, every coarse cell of the window is bilinearly
    /// interpolated from its four corners and compared against the true
    /// heights strictly inside the cell; the entry is the mean absolute
    /// deviation, scaled into world units.
    pub fn compute<H: HeightSource>(
        source: &H,
        origin: (usize, usize),
        config: &TerrainConfig,
    ) -> Self {
        let mut errors = [0.0f32; MAX_LOD + 1];

        for level in 1..=MAX_LOD {
            let step = 1usize << level;
            let mut accumulated = 0.0f64;
            let mut samples = 0usize;

            for z0 in (0..PATCH_STRIDE).step_by(step) {
                for x0 in (0..PATCH_STRIDE).step_by(step) {
                    let h00 = source.height(origin.0 + x0, origin.1 + z0);
                    let h10 = source.height(origin.0 + x0 + step, origin.1 + z0);
                    let h01 = source.height(origin.0 + x0, origin.1 + z0 + step);
                    let h11 = source.height(origin.0 + x0 + step, origin.1 + z0 + step);

                    for dz in 1..step {
                        for dx in 1..step {
                            let fx = dx as f32 / step as f32;
                            let fz = dz as f32 / step as f32;
                            let interpolated = h00 * (1.0 - fx) * (1.0 - fz)
                                + h10 * fx * (1.0 - fz)
                                + h01 * (1.0 - fx) * fz
                                + h11 * fx * fz;
                            let actual =
                                source.height(origin.0 + x0 + dx, origin.1 + z0 + dz);
                            accumulated += (interpolated - actual).abs() as f64;
                            samples += 1;
                        }
                    }
                }
            }

            let mean = if samples > 0 {
                (accumulated / samples as f64) as f32
            } else {
                0.0
            };
            errors[level] = mean * config.world_scale.y;
        }

        clamp_monotonic(&mut errors);

        let center = PATCH_STRIDE / 2;
        let center_height = source.height(origin.0 + center, origin.1 + center);
        let reference = world_point(config, origin.0 + center, origin.1 + center, center_height);

        let entries = std::array::from_fn(|level| LodErrorEntry {
            error: errors[level],
            reference,
            displaced: reference + Vec3::Y * errors[level],
        });

        Self { entries }
    }

    #[inline]
    pub fn entry(&self, level: usize) -> &LodErrorEntry {
        &self.entries[level]
    }
}

/// Clamp a sampled error table so deviations never shrink as levels coarsen
///
/// Sampled errors can come out noisy (a coarser level occasionally measuring
/// smaller than a finer one on smooth terrain). Each successive difference is
/// forced up to at least 1.1x the previous difference, which guarantees a
/// non-decreasing table.
pub(crate) fn clamp_monotonic(errors: &mut [f32]) {
    for i in 1..errors.len() {
        let previous_diff = if i >= 2 {
            errors[i - 1] - errors[i - 2]
        } else {
            0.0
        };
        let min_diff = 1.1 * previous_diff;
        if errors[i] - errors[i - 1] < min_diff {
            errors[i] = errors[i - 1] + min_diff;
        }
    }
}
