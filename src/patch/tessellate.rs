//! Patch mesh generation
//!
//! Turns one patch window of the heightfield into a deduplicated vertex
//! buffer and a single triangle-strip index stream for a requested LOD
//! configuration (the patch's own level plus its four neighbors' levels).
//!
//! The strip is assembled from substrips (plain rows, transition fans)
//! joined by paired degenerate indices, so the whole patch renders as one
//! strip and the index count stays even, which keeps strip winding parity
//! intact across splices.

use bytemuck::{Pod, Zeroable};

use super::{
    world_point, LodLevels, MAX_PATCH_INDICES, MAX_PATCH_VERTICES, PATCH_SIZE, PATCH_STRIDE,
};
use crate::config::TerrainConfig;
use crate::grid::Edge;
use crate::height::HeightSource;

/// A single terrain vertex, laid out for direct buffer upload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    /// World-space position
    pub position: [f32; 3],
    /// Texture coordinate over the whole terrain (0..1 on each axis)
    pub texcoord: [f32; 2],
}

/// Generated mesh for a single patch
///
/// `indices` describes one connected triangle strip, including deliberate
/// degenerate triangles splicing its substrips together. The index count is
/// always even, and at most [`MAX_PATCH_VERTICES`] vertices are emitted
/// (each grid cell contributes one vertex at most).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchMesh {
    /// Deduplicated vertices
    pub vertices: Vec<TerrainVertex>,
    /// Triangle-strip indices into `vertices`
    pub indices: Vec<u32>,
}

impl PatchMesh {
    /// Number of vertices in the mesh
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of strip triangles, degenerates included
    pub fn triangle_count(&self) -> usize {
        self.indices.len().saturating_sub(2)
    }

    /// Check whether the mesh has been generated
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Inputs to one patch mesh build
pub(crate) struct BuildParams<'a, H> {
    pub source: &'a H,
    /// Sample-space origin of the patch window
    pub origin: (usize, usize),
    pub config: &'a TerrainConfig,
    pub levels: LodLevels,
    pub vertex_capacity: usize,
    pub index_capacity: usize,
}

impl<'a, H: HeightSource> BuildParams<'a, H> {
    /// Parameters with the standard worst-case capacities
    pub fn standard(
        source: &'a H,
        origin: (usize, usize),
        config: &'a TerrainConfig,
        levels: LodLevels,
    ) -> Self {
        Self {
            source,
            origin,
            config,
            levels,
            vertex_capacity: MAX_PATCH_VERTICES,
            index_capacity: MAX_PATCH_INDICES,
        }
    }
}

/// Build a patch mesh for one LOD configuration
///
/// Pure: the output depends only on the parameters, so rebuilding with the
/// same levels and source window yields identical buffers. Returns `None`
/// if the configured capacities would be exceeded, in which case the caller
/// keeps whatever mesh it had before.
pub(crate) fn build_patch_mesh<H: HeightSource>(params: &BuildParams<'_, H>) -> Option<PatchMesh> {
    Tessellator::new(params).run()
}

const UNASSIGNED: u32 = u32::MAX;

struct Tessellator<'a, H: HeightSource> {
    params: &'a BuildParams<'a, H>,
    /// Grid cell -> emitted vertex slot; reset for every build
    cache: [u32; MAX_PATCH_VERTICES],
    vertices: Vec<TerrainVertex>,
    indices: Vec<u32>,
    inv_tex: (f32, f32),
}

impl<'a, H: HeightSource> Tessellator<'a, H> {
    fn new(params: &'a BuildParams<'a, H>) -> Self {
        let inv_tex = (
            1.0 / (params.source.width() - 1) as f32,
            1.0 / (params.source.depth() - 1) as f32,
        );
        Self {
            params,
            cache: [UNASSIGNED; MAX_PATCH_VERTICES],
            vertices: Vec::with_capacity(params.vertex_capacity.min(MAX_PATCH_VERTICES)),
            indices: Vec::with_capacity(params.index_capacity.min(MAX_PATCH_INDICES)),
            inv_tex,
        }
    }

    fn run(mut self) -> Option<PatchMesh> {
        let step = self.params.levels.step();
        let mask = self.params.levels.finer_mask();

        if step >= PATCH_STRIDE {
            // Whole patch is a single cell; the mask selects one of the 16
            // edge-transition patterns.
            self.emit_cell(0, 0, PATCH_STRIDE, mask)?;
        } else {
            let cells = PATCH_STRIDE / step;
            let left = mask & Edge::Left.mask_bit() != 0;
            let right = mask & Edge::Right.mask_bit() != 0;

            for row in 0..cells {
                let z = row * step;
                let bottom = row == 0 && mask & Edge::Bottom.mask_bit() != 0;
                let top = row == cells - 1 && mask & Edge::Top.mask_bit() != 0;

                if bottom || top {
                    for col in 0..cells {
                        let mut cell_mask = 0u8;
                        if bottom {
                            cell_mask |= Edge::Bottom.mask_bit();
                        }
                        if top {
                            cell_mask |= Edge::Top.mask_bit();
                        }
                        if col == 0 && left {
                            cell_mask |= Edge::Left.mask_bit();
                        }
                        if col == cells - 1 && right {
                            cell_mask |= Edge::Right.mask_bit();
                        }
                        self.emit_cell(col * step, z, step, cell_mask)?;
                    }
                } else {
                    if left {
                        self.emit_cell(0, z, step, Edge::Left.mask_bit())?;
                    }
                    let x_start = if left { step } else { 0 };
                    let x_end = if right { PATCH_STRIDE - step } else { PATCH_STRIDE };
                    if x_start < x_end {
                        self.emit_row(z, step, x_start, x_end)?;
                    }
                    if right {
                        self.emit_cell(PATCH_STRIDE - step, z, step, Edge::Right.mask_bit())?;
                    }
                }
            }
        }

        self.reduce_borders();

        debug_assert!(self.indices.len() % 2 == 0);
        Some(PatchMesh {
            vertices: self.vertices,
            indices: self.indices,
        })
    }

    /// Emit one horizontal strip of quads spanning `x_start..=x_end`
    fn emit_row(&mut self, z: usize, step: usize, x_start: usize, x_end: usize) -> Option<()> {
        let top = self.vertex_index(x_start, z + step)?;
        let bottom = self.vertex_index(x_start, z)?;
        self.splice(top)?;
        self.push_index(top)?;
        self.push_index(bottom)?;

        let mut x = x_start + step;
        while x <= x_end {
            let top = self.vertex_index(x, z + step)?;
            let bottom = self.vertex_index(x, z)?;
            self.push_index(top)?;
            self.push_index(bottom)?;
            x += step;
        }
        Some(())
    }

    /// Emit one cell, adding half-step transition vertices on finer edges
    ///
    /// A cell with no finer edges is a plain two-triangle quad. Otherwise
    /// the cell perimeter gains a mid vertex on every finer edge and is
    /// covered by a fan from the first such mid vertex, so the finer
    /// neighbor's extra edge vertex always has a matching triangle on this
    /// side.
    fn emit_cell(&mut self, x: usize, z: usize, step: usize, mask: u8) -> Option<()> {
        if mask == 0 {
            let a = self.vertex_index(x, z)?;
            let b = self.vertex_index(x + step, z)?;
            let c = self.vertex_index(x + step, z + step)?;
            let d = self.vertex_index(x, z + step)?;
            return self.substrip(&[d, a, c, b]);
        }

        let half = step / 2;
        let mid_of = |edge: Edge| match edge {
            Edge::Left => (x, z + half),
            Edge::Right => (x + step, z + half),
            Edge::Bottom => (x + half, z),
            Edge::Top => (x + half, z + step),
        };

        // Mask bit positions match Edge::ALL order, and mask != 0 here; the
        // fan pivots on the mid vertex of the first finer edge.
        let pivot_edge = Edge::ALL[mask.trailing_zeros() as usize];

        // Perimeter walk, counter-clockwise from the bottom-left corner,
        // inserting a mid vertex after each corner whose edge is finer.
        let corners = [
            (x, z),
            (x + step, z),
            (x + step, z + step),
            (x, z + step),
        ];
        let walk = [Edge::Bottom, Edge::Right, Edge::Top, Edge::Left];

        let mut perimeter: Vec<(usize, usize)> = Vec::with_capacity(8);
        let mut center_at = 0;
        for (corner, edge) in corners.into_iter().zip(walk) {
            perimeter.push(corner);
            if mask & edge.mask_bit() != 0 {
                if edge == pivot_edge {
                    center_at = perimeter.len();
                }
                perimeter.push(mid_of(edge));
            }
        }
        let center_point = perimeter[center_at];

        let rim: Vec<(usize, usize)> = perimeter[center_at + 1..]
            .iter()
            .chain(perimeter[..center_at].iter())
            .copied()
            .collect();

        let center = self.vertex_index(center_point.0, center_point.1)?;

        // Fan triangles (center, rim[i], rim[i+1]), two per substrip.
        let n = rim.len();
        let mut i = 0;
        while i + 1 < n {
            let r0 = self.vertex_index(rim[i].0, rim[i].1)?;
            let r1 = self.vertex_index(rim[i + 1].0, rim[i + 1].1)?;
            if i + 2 < n {
                let r2 = self.vertex_index(rim[i + 2].0, rim[i + 2].1)?;
                self.substrip(&[r0, center, r1, r2])?;
            } else {
                self.substrip(&[r0, center, r1, r1])?;
            }
            i += 2;
        }
        Some(())
    }

    /// Flatten mid-edge vertices onto the coarser neighbor's silhouette
    ///
    /// Runs for every edge whose present neighbor differs by exactly one
    /// level. Walking the edge at the coarser of the two strides, each mid
    /// vertex that was emitted is forced to the average height of its two
    /// edge neighbors, which is exactly the height the coarser side renders
    /// there. Larger level jumps are left alone; missing neighbors never
    /// trigger the pass.
    fn reduce_borders(&mut self) {
        let levels = self.params.levels;
        for edge in Edge::ALL {
            let Some(neighbor) = levels.neighbor(edge) else {
                continue;
            };
            if neighbor.abs_diff(levels.center) != 1 {
                continue;
            }
            let walk = 1usize << levels.center.max(neighbor);
            let half = walk / 2;

            for t in (0..PATCH_STRIDE).step_by(walk) {
                let (p0, pm, p1) = match edge {
                    Edge::Left => ((0, t), (0, t + half), (0, t + walk)),
                    Edge::Right => (
                        (PATCH_STRIDE, t),
                        (PATCH_STRIDE, t + half),
                        (PATCH_STRIDE, t + walk),
                    ),
                    Edge::Bottom => ((t, 0), (t + half, 0), (t + walk, 0)),
                    Edge::Top => (
                        (t, PATCH_STRIDE),
                        (t + half, PATCH_STRIDE),
                        (t + walk, PATCH_STRIDE),
                    ),
                };

                let (Some(i0), Some(im), Some(i1)) =
                    (self.cached(p0), self.cached(pm), self.cached(p1))
                else {
                    continue;
                };
                let y0 = self.vertices[i0 as usize].position[1];
                let y1 = self.vertices[i1 as usize].position[1];
                self.vertices[im as usize].position[1] = 0.5 * (y0 + y1);
            }
        }
    }

    /// Look up an already-emitted vertex without creating one
    fn cached(&self, point: (usize, usize)) -> Option<u32> {
        let slot = self.cache[point.1 * PATCH_SIZE + point.0];
        (slot != UNASSIGNED).then_some(slot)
    }

    /// Get or create the vertex for a local grid coordinate
    fn vertex_index(&mut self, x: usize, z: usize) -> Option<u32> {
        let slot = z * PATCH_SIZE + x;
        let cached = self.cache[slot];
        if cached != UNASSIGNED {
            return Some(cached);
        }
        if self.vertices.len() >= self.params.vertex_capacity {
            return None;
        }

        let gx = self.params.origin.0 + x;
        let gz = self.params.origin.1 + z;
        let height = self.params.source.height(gx, gz);
        let position = world_point(self.params.config, gx, gz, height);

        let index = self.vertices.len() as u32;
        self.vertices.push(TerrainVertex {
            position: position.to_array(),
            texcoord: [gx as f32 * self.inv_tex.0, gz as f32 * self.inv_tex.1],
        });
        self.cache[slot] = index;
        Some(index)
    }

    /// Append a substrip, splicing it to the running strip
    fn substrip(&mut self, strip: &[u32]) -> Option<()> {
        self.splice(strip[0])?;
        for &index in strip {
            self.push_index(index)?;
        }
        Some(())
    }

    /// Join the running strip to a new substrip with a degenerate pair
    fn splice(&mut self, first: u32) -> Option<()> {
        if let Some(&last) = self.indices.last() {
            self.push_index(last)?;
            self.push_index(first)?;
        }
        Some(())
    }

    fn push_index(&mut self, index: u32) -> Option<()> {
        if self.indices.len() >= self.params.index_capacity {
            return None;
        }
        self.indices.push(index);
        Some(())
    }
}
