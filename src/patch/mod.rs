//! Terrain patches
//!
//! The heightfield is carved into fixed-size square patches of 17x17 samples
//! (16 cells per side), each owning its precomputed LOD error table, a world
//! bounding box for culling, and the mesh built at its currently selected
//! detail configuration. Adjacent patches overlap by one sample column/row so
//! their border vertices coincide exactly.

pub(crate) mod error_table;
mod tessellate;

pub use tessellate::{PatchMesh, TerrainVertex};
pub(crate) use tessellate::{build_patch_mesh, BuildParams};

use glam::Vec3;
use parry3d::bounding_volume::Aabb;
use parry3d::math::Point;

use crate::config::TerrainConfig;
use crate::grid::Edge;
use crate::height::HeightSource;
use error_table::LodErrorTable;

/// Samples per patch side
pub const PATCH_SIZE: usize = 17;

/// Cells per patch side
pub const PATCH_STRIDE: usize = PATCH_SIZE - 1;

/// Coarsest LOD level; its stride of `2^MAX_LOD` samples spans a whole
/// patch side, collapsing the patch to a single cell
pub const MAX_LOD: usize = 4;

/// Upper bound on vertices a single patch mesh can emit
pub const MAX_PATCH_VERTICES: usize = PATCH_SIZE * PATCH_SIZE;

/// Upper bound on strip indices a single patch mesh can emit
pub const MAX_PATCH_INDICES: usize = 3 * MAX_PATCH_VERTICES;

/// Map a grid sample to world space
#[inline]
pub(crate) fn world_point(config: &TerrainConfig, gx: usize, gz: usize, height: f32) -> Vec3 {
    config.world_origin + config.world_scale * Vec3::new(gx as f32, height, gz as f32)
}

/// A patch's LOD level together with its four neighbors' levels
///
/// This is the complete input that determines a patch's mesh shape: two
/// builds with equal `LodLevels` over the same source produce identical
/// buffers, so comparing the current value against the newly selected one is
/// the whole rebuild decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodLevels {
    /// The patch's own level
    pub center: usize,
    /// Neighbor levels indexed by [`Edge`]; `None` past the grid border
    pub neighbors: [Option<usize>; 4],
}

impl LodLevels {
    /// All four neighbors at the same level as the patch itself
    pub fn interior(center: usize) -> Self {
        Self {
            center,
            neighbors: [Some(center); 4],
        }
    }

    /// No neighbors on any side
    pub fn border(center: usize) -> Self {
        Self {
            center,
            neighbors: [None; 4],
        }
    }

    /// Sample stride of the patch's own level
    #[inline]
    pub fn step(&self) -> usize {
        1 << self.center
    }

    /// The neighbor level across an edge, if that neighbor exists
    #[inline]
    pub fn neighbor(&self, edge: Edge) -> Option<usize> {
        self.neighbors[edge as usize]
    }

    /// Effective neighbor level for transition stitching
    ///
    /// A missing neighbor is treated as the finest level so border patches
    /// keep full-detail edges and never assume a coarser partner.
    #[inline]
    pub(crate) fn stitch_level(&self, edge: Edge) -> usize {
        self.neighbor(edge).unwrap_or(0)
    }

    /// Bitmask of edges whose effective neighbor is finer than `center`
    pub(crate) fn finer_mask(&self) -> u8 {
        let mut mask = 0u8;
        for edge in Edge::ALL {
            if self.stitch_level(edge) < self.center {
                mask |= edge.mask_bit();
            }
        }
        mask
    }
}

/// One terrain patch and its cached per-frame state
pub struct Patch {
    /// Sample-space origin of the patch window
    origin: (usize, usize),
    bounds: Aabb,
    errors: LodErrorTable,
    /// The configuration the current mesh was built for; `None` until the
    /// first build
    current: Option<LodLevels>,
    pending_lod: usize,
    screen_error: f32,
    mesh: PatchMesh,
}

impl Patch {
    pub(crate) fn new<H: HeightSource>(
        source: &H,
        origin: (usize, usize),
        config: &TerrainConfig,
    ) -> Self {
        Self {
            origin,
            bounds: compute_bounds(source, origin, config),
            errors: LodErrorTable::compute(source, origin, config),
            current: None,
            pending_lod: 0,
            screen_error: 0.0,
            mesh: PatchMesh::default(),
        }
    }

    /// World-space bounding box used for frustum culling
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// The mesh built for the most recent configuration
    #[inline]
    pub fn mesh(&self) -> &PatchMesh {
        &self.mesh
    }

    /// The level of the current mesh, `None` before the first build
    #[inline]
    pub fn current_lod(&self) -> Option<usize> {
        self.current.map(|levels| levels.center)
    }

    /// Projected screen-space error of the most recent level selection
    ///
    /// Exposed for callers that want to drive fade-in effects or their own
    /// hysteresis on top of the greedy selection.
    #[inline]
    pub fn screen_error(&self) -> f32 {
        self.screen_error
    }

    #[inline]
    pub(crate) fn origin(&self) -> (usize, usize) {
        self.origin
    }

    #[inline]
    pub(crate) fn lod_errors(&self) -> &LodErrorTable {
        &self.errors
    }

    #[inline]
    pub(crate) fn pending_lod(&self) -> usize {
        self.pending_lod
    }

    pub(crate) fn set_pending(&mut self, level: usize, screen_error: f32) {
        self.pending_lod = level;
        self.screen_error = screen_error;
    }

    /// Whether the current mesh matches the requested configuration
    pub(crate) fn needs_rebuild(&self, levels: &LodLevels) -> bool {
        self.current.as_ref() != Some(levels)
    }

    /// Rebuild the mesh for a new configuration
    ///
    /// On a capacity overflow the previous mesh is kept and the patch stays
    /// marked with its old configuration; returns whether a rebuild happened.
    pub(crate) fn rebuild<H: HeightSource>(
        &mut self,
        source: &H,
        config: &TerrainConfig,
        levels: LodLevels,
    ) -> bool {
        let params = BuildParams::standard(source, self.origin, config, levels);
        match build_patch_mesh(&params) {
            Some(mesh) => {
                self.mesh = mesh;
                self.current = Some(levels);
                true
            }
            None => {
                log::warn!(
                    "patch at {:?} exceeded mesh capacity for levels {:?}, keeping previous mesh",
                    self.origin,
                    levels
                );
                false
            }
        }
    }
}

fn compute_bounds<H: HeightSource>(
    source: &H,
    origin: (usize, usize),
    config: &TerrainConfig,
) -> Aabb {
    let mut min_height = f32::INFINITY;
    let mut max_height = f32::NEG_INFINITY;
    for z in 0..PATCH_SIZE {
        for x in 0..PATCH_SIZE {
            let h = source.height(origin.0 + x, origin.1 + z);
            min_height = min_height.min(h);
            max_height = max_height.max(h);
        }
    }

    // world_scale components are validated positive, so min stays min.
    let min = world_point(config, origin.0, origin.1, min_height);
    let max = world_point(
        config,
        origin.0 + PATCH_STRIDE,
        origin.1 + PATCH_STRIDE,
        max_height,
    );
    Aabb::new(
        Point::new(min.x, min.y, min.z),
        Point::new(max.x, max.y, max.z),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfigBuilder;
    use crate::height::HeightGrid;

    fn config() -> TerrainConfig {
        TerrainConfigBuilder::new().build()
    }

    #[test]
    fn test_world_point_applies_origin_and_scale() {
        let cfg = TerrainConfigBuilder::new()
            .world_scale(Vec3::new(2.0, 4.0, 2.0))
            .unwrap()
            .world_origin(Vec3::new(-10.0, 1.0, 20.0))
            .build();

        let p = world_point(&cfg, 3, 5, 0.5);
        assert_eq!(p, Vec3::new(-10.0 + 6.0, 1.0 + 2.0, 20.0 + 10.0));
    }

    #[test]
    fn test_lod_levels_step() {
        assert_eq!(LodLevels::interior(0).step(), 1);
        assert_eq!(LodLevels::interior(3).step(), 8);
        assert_eq!(LodLevels::interior(MAX_LOD).step(), PATCH_STRIDE);
    }

    #[test]
    fn test_finer_mask_flags_finer_and_missing_neighbors() {
        let levels = LodLevels {
            center: 2,
            neighbors: [Some(1), Some(2), Some(3), None],
        };
        assert_eq!(
            levels.finer_mask(),
            Edge::Left.mask_bit() | Edge::Top.mask_bit()
        );

        assert_eq!(LodLevels::interior(2).finer_mask(), 0);
        assert_eq!(LodLevels::border(0).finer_mask(), 0);
        assert_eq!(
            LodLevels::border(1).finer_mask(),
            Edge::Left.mask_bit()
                | Edge::Right.mask_bit()
                | Edge::Bottom.mask_bit()
                | Edge::Top.mask_bit()
        );
    }

    #[test]
    fn test_bounds_cover_the_height_range() {
        let grid = HeightGrid::from_fn(17, 17, |x, z| (x as f32 - z as f32) * 0.5);
        let patch = Patch::new(&grid, (0, 0), &config());

        let bounds = patch.bounds();
        assert_eq!(bounds.mins.x, 0.0);
        assert_eq!(bounds.maxs.x, 16.0);
        assert_eq!(bounds.mins.y, -8.0);
        assert_eq!(bounds.maxs.y, 8.0);
        assert_eq!(bounds.maxs.z, 16.0);
    }

    #[test]
    fn test_new_patch_has_no_mesh() {
        let grid = HeightGrid::from_fn(17, 17, |_, _| 0.0);
        let patch = Patch::new(&grid, (0, 0), &config());
        assert!(patch.mesh().is_empty());
        assert_eq!(patch.current_lod(), None);
        assert!(patch.needs_rebuild(&LodLevels::interior(0)));
    }

    #[test]
    fn test_rebuild_only_when_configuration_changes() {
        let grid = HeightGrid::from_fn(17, 17, |x, z| (x * z) as f32 * 0.01);
        let cfg = config();
        let mut patch = Patch::new(&grid, (0, 0), &cfg);

        let levels = LodLevels::interior(1);
        assert!(patch.rebuild(&grid, &cfg, levels));
        assert_eq!(patch.current_lod(), Some(1));
        assert!(!patch.needs_rebuild(&levels));

        // Same center, different neighbor: still a rebuild.
        let stitched = LodLevels {
            center: 1,
            neighbors: [Some(0), Some(1), Some(1), Some(1)],
        };
        assert!(patch.needs_rebuild(&stitched));
    }
}
