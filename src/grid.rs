//! Patch grid and adjacency
//!
//! Patches tile the heightfield row-major; this module owns the tiling and
//! answers the adjacency questions the stitching pass needs.

use crate::config::TerrainConfig;
use crate::height::HeightSource;
use crate::patch::{LodLevels, Patch, PATCH_STRIDE};

/// One side of a patch
///
/// The discriminant doubles as the neighbor-array index and the bit position
/// in transition masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Edge {
    /// Toward negative x
    Left = 0,
    /// Toward positive x
    Right = 1,
    /// Toward negative z
    Bottom = 2,
    /// Toward positive z
    Top = 3,
}

impl Edge {
    /// Every edge, in neighbor-array order
    pub const ALL: [Edge; 4] = [Edge::Left, Edge::Right, Edge::Bottom, Edge::Top];

    /// This edge's bit in a transition mask
    #[inline]
    pub(crate) fn mask_bit(self) -> u8 {
        1 << (self as usize)
    }

    /// The matching edge on the adjacent patch
    pub fn opposite(self) -> Edge {
        match self {
            Edge::Left => Edge::Right,
            Edge::Right => Edge::Left,
            Edge::Bottom => Edge::Top,
            Edge::Top => Edge::Bottom,
        }
    }
}

/// Row-major grid of terrain patches
pub struct PatchGrid {
    patches: Vec<Patch>,
    patches_x: usize,
    patches_z: usize,
}

impl PatchGrid {
    /// Tile a heightfield with patches
    ///
    /// The caller has already validated that both source dimensions are
    /// `n * 16 + 1`.
    pub(crate) fn new<H: HeightSource>(source: &H, config: &TerrainConfig) -> Self {
        let patches_x = (source.width() - 1) / PATCH_STRIDE;
        let patches_z = (source.depth() - 1) / PATCH_STRIDE;

        let mut patches = Vec::with_capacity(patches_x * patches_z);
        for pz in 0..patches_z {
            for px in 0..patches_x {
                let origin = (px * PATCH_STRIDE, pz * PATCH_STRIDE);
                patches.push(Patch::new(source, origin, config));
            }
        }

        Self {
            patches,
            patches_x,
            patches_z,
        }
    }

    /// Number of patches along the x axis
    #[inline]
    pub fn patches_x(&self) -> usize {
        self.patches_x
    }

    /// Number of patches along the z axis
    #[inline]
    pub fn patches_z(&self) -> usize {
        self.patches_z
    }

    /// Total patch count
    #[inline]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// All patches in row-major order
    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// The patch at grid position (x, z)
    pub fn patch(&self, x: usize, z: usize) -> &Patch {
        &self.patches[z * self.patches_x + x]
    }

    #[inline]
    pub(crate) fn patch_at(&self, index: usize) -> &Patch {
        &self.patches[index]
    }

    #[inline]
    pub(crate) fn patch_mut(&mut self, index: usize) -> &mut Patch {
        &mut self.patches[index]
    }

    /// Index of the patch across an edge, if it exists
    pub(crate) fn neighbor(&self, index: usize, edge: Edge) -> Option<usize> {
        let x = index % self.patches_x;
        let z = index / self.patches_x;
        match edge {
            Edge::Left => (x > 0).then(|| index - 1),
            Edge::Right => (x + 1 < self.patches_x).then(|| index + 1),
            Edge::Bottom => (z > 0).then(|| index - self.patches_x),
            Edge::Top => (z + 1 < self.patches_z).then(|| index + self.patches_x),
        }
    }

    /// Assemble the full LOD configuration for one patch from the pending
    /// level selections of the patch and its neighbors
    pub(crate) fn stitch_levels(&self, index: usize) -> LodLevels {
        let center = self.patches[index].pending_lod();
        let neighbors = Edge::ALL.map(|edge| {
            self.neighbor(index, edge)
                .map(|n| self.patches[n].pending_lod())
        });
        LodLevels { center, neighbors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfigBuilder;
    use crate::height::HeightGrid;

    fn grid_3x2() -> PatchGrid {
        let source = HeightGrid::from_fn(49, 33, |x, z| (x + z) as f32 * 0.1);
        PatchGrid::new(&source, &TerrainConfigBuilder::new().build())
    }

    #[test]
    fn test_mask_bits_are_distinct() {
        let mut mask = 0u8;
        for edge in Edge::ALL {
            assert_eq!(mask & edge.mask_bit(), 0);
            mask |= edge.mask_bit();
        }
        assert_eq!(mask, 0b1111);
    }

    #[test]
    fn test_opposite_edges() {
        for edge in Edge::ALL {
            assert_ne!(edge.opposite(), edge);
            assert_eq!(edge.opposite().opposite(), edge);
        }
    }

    #[test]
    fn test_tiling_dimensions() {
        let grid = grid_3x2();
        assert_eq!(grid.patches_x(), 3);
        assert_eq!(grid.patches_z(), 2);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.patch(2, 1).bounds().mins.x, 32.0);
        assert_eq!(grid.patch(2, 1).bounds().mins.z, 16.0);
    }

    #[test]
    fn test_neighbor_adjacency() {
        let grid = grid_3x2();

        // Center of the bottom row.
        assert_eq!(grid.neighbor(1, Edge::Left), Some(0));
        assert_eq!(grid.neighbor(1, Edge::Right), Some(2));
        assert_eq!(grid.neighbor(1, Edge::Bottom), None);
        assert_eq!(grid.neighbor(1, Edge::Top), Some(4));

        // Corners.
        assert_eq!(grid.neighbor(0, Edge::Left), None);
        assert_eq!(grid.neighbor(5, Edge::Right), None);
        assert_eq!(grid.neighbor(5, Edge::Top), None);
        assert_eq!(grid.neighbor(5, Edge::Bottom), Some(2));
    }

    #[test]
    fn test_stitch_levels_reads_pending_selections() {
        let mut grid = grid_3x2();
        grid.patch_mut(1).set_pending(2, 0.0);
        grid.patch_mut(0).set_pending(1, 0.0);
        grid.patch_mut(2).set_pending(3, 0.0);
        grid.patch_mut(4).set_pending(2, 0.0);

        let levels = grid.stitch_levels(1);
        assert_eq!(levels.center, 2);
        assert_eq!(levels.neighbor(Edge::Left), Some(1));
        assert_eq!(levels.neighbor(Edge::Right), Some(3));
        assert_eq!(levels.neighbor(Edge::Bottom), None);
        assert_eq!(levels.neighbor(Edge::Top), Some(2));
    }
}
