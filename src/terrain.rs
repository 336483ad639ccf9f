//! Terrain driver
//!
//! Owns the patch grid and runs the per-frame pipeline: frustum culling,
//! screen-space error LOD selection, change-driven patch rebuilds, and
//! aggregation of all visible patches into one frame mesh.

use glam::{Mat4, Vec2, Vec3};

use crate::camera::CameraState;
use crate::config::TerrainConfig;
use crate::error::{Result, TerrainError};
use crate::grid::PatchGrid;
use crate::height::HeightSource;
use crate::patch::error_table::LodErrorEntry;
use crate::patch::{PatchMesh, TerrainVertex, MAX_LOD, PATCH_SIZE, PATCH_STRIDE};

/// Clip-space w is clamped to this before the perspective divide so points
/// at or behind the eye plane produce large finite errors instead of NaN.
const NEAR_PLANE_EPS: f32 = 1.0e-4;

/// All visible patch meshes of one frame, spliced into a single strip
///
/// Patch substrips are joined with the same paired-degenerate scheme used
/// inside patches, so the whole terrain renders with one draw call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameMesh {
    vertices: Vec<TerrainVertex>,
    indices: Vec<u32>,
}

impl FrameMesh {
    /// Vertex buffer for the frame
    #[inline]
    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// Triangle-strip index buffer for the frame
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Strip triangle count, degenerates included
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len().saturating_sub(2)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Splice one patch mesh onto the end of the strip, rebasing its indices
    fn append(&mut self, mesh: &PatchMesh) {
        if mesh.is_empty() {
            return;
        }
        let base = self.vertices.len() as u32;
        if let Some(&last) = self.indices.last() {
            self.indices.push(last);
            self.indices.push(base + mesh.indices[0]);
        }
        self.vertices.extend_from_slice(&mesh.vertices);
        self.indices.extend(mesh.indices.iter().map(|i| base + i));
    }
}

/// Statistics for the most recent frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Patches that survived frustum culling
    pub visible_patches: usize,
    /// Patches whose mesh was regenerated this frame
    pub rebuilt_patches: usize,
    /// Strip triangles in the frame mesh, degenerates included
    pub triangles: usize,
}

/// A continuously level-of-detailed terrain over a heightfield
///
/// # Example
///
/// ```rust
/// use geomip_terrain::*;
///
/// let grid = HeightGrid::from_noise(33, 33, 42, &NoiseConfig::default());
/// let config = TerrainConfigBuilder::new().build();
/// let mut terrain = Terrain::new(grid, config).unwrap();
///
/// let proj = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 1000.0);
/// let view = Mat4::look_at_rh(Vec3::new(16.0, 40.0, 16.0), Vec3::new(16.0, 0.0, 16.0), Vec3::Z);
/// let mesh = terrain.on_pre_render(&CameraState::from_view_proj(view, proj));
/// assert!(!mesh.is_empty());
/// ```
pub struct Terrain<H: HeightSource> {
    source: H,
    config: TerrainConfig,
    grid: PatchGrid,
    active: Vec<usize>,
    frame: FrameMesh,
    stats: FrameStats,
}

impl<H: HeightSource> Terrain<H> {
    /// Build a terrain over a heightfield
    ///
    /// Both source dimensions must be of the form `16n + 1` with `n >= 1`,
    /// and every sample must be finite. Patch error tables and bounding
    /// boxes are computed here, once.
    pub fn new(source: H, config: TerrainConfig) -> Result<Self> {
        let (width, depth) = (source.width(), source.depth());
        for (axis, dim) in [("width", width), ("depth", depth)] {
            if dim < PATCH_SIZE || (dim - 1) % PATCH_STRIDE != 0 {
                return Err(TerrainError::InvalidHeightSource(format!(
                    "{} must be 16n + 1 with n >= 1, got {}",
                    axis, dim
                )));
            }
        }
        for z in 0..depth {
            for x in 0..width {
                if !source.height(x, z).is_finite() {
                    return Err(TerrainError::InvalidHeightSource(format!(
                        "non-finite height sample at ({}, {})",
                        x, z
                    )));
                }
            }
        }

        let grid = PatchGrid::new(&source, &config);
        log::info!(
            "terrain initialized: {}x{} samples, {}x{} patches",
            width,
            depth,
            grid.patches_x(),
            grid.patches_z()
        );

        Ok(Self {
            source,
            config,
            grid,
            active: Vec::new(),
            frame: FrameMesh::default(),
            stats: FrameStats::default(),
        })
    }

    /// The heightfield this terrain was built over
    #[inline]
    pub fn source(&self) -> &H {
        &self.source
    }

    #[inline]
    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// The patch grid, for per-patch inspection
    #[inline]
    pub fn grid(&self) -> &PatchGrid {
        &self.grid
    }

    /// The frame mesh produced by the last [`Self::on_pre_render`] call
    #[inline]
    pub fn frame_mesh(&self) -> &FrameMesh {
        &self.frame
    }

    /// Statistics for the last [`Self::on_pre_render`] call
    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Grid indices of the patches visible in the last frame
    #[inline]
    pub fn active_patches(&self) -> &[usize] {
        &self.active
    }

    /// Run the per-frame update and return the mesh to draw
    ///
    /// Culls patches against the camera frustum, selects each visible
    /// patch's LOD by projecting its error table into screen space, rebuilds
    /// only the patches whose own or neighboring selection changed, and
    /// splices the visible meshes into one strip.
    ///
    /// Level selection for every visible patch completes before any mesh is
    /// rebuilt, so stitching always sees this frame's selections.
    pub fn on_pre_render(&mut self, camera: &CameraState) -> &FrameMesh {
        let frustum = camera.frustum();

        self.active.clear();
        for index in 0..self.grid.len() {
            if frustum.intersects_aabb(self.grid.patch_at(index).bounds()) {
                self.active.push(index);
            }
        }

        for &index in &self.active {
            let projected: [f32; MAX_LOD + 1] = {
                let errors = self.grid.patch_at(index).lod_errors();
                std::array::from_fn(|level| {
                    projected_error(errors.entry(level), &camera.view_proj)
                })
            };
            let level = select_level(&projected, self.config.max_screen_error);
            self.grid.patch_mut(index).set_pending(level, projected[level]);
        }

        let mut rebuilt = 0usize;
        for position in 0..self.active.len() {
            let index = self.active[position];
            let levels = self.grid.stitch_levels(index);
            if self.grid.patch_at(index).needs_rebuild(&levels)
                && self
                    .grid
                    .patch_mut(index)
                    .rebuild(&self.source, &self.config, levels)
            {
                rebuilt += 1;
            }
        }

        self.frame.clear();
        for &index in &self.active {
            self.frame.append(self.grid.patch_at(index).mesh());
        }

        self.stats = FrameStats {
            visible_patches: self.active.len(),
            rebuilt_patches: rebuilt,
            triangles: self.frame.triangle_count(),
        };
        log::trace!(
            "frame: {} visible, {} rebuilt, {} triangles",
            self.stats.visible_patches,
            self.stats.rebuilt_patches,
            self.stats.triangles
        );

        &self.frame
    }
}

/// Greedy selection: the coarsest level whose projected error fits the budget
///
/// Scans from coarse to fine and takes the first qualifying level; falls back
/// to the finest level when nothing qualifies (which can only happen when
/// every projection is non-finite, since level 0 has zero error).
fn select_level(projected: &[f32], budget: f32) -> usize {
    for level in (0..projected.len()).rev() {
        if projected[level] < budget {
            return level;
        }
    }
    0
}

/// Project one error entry into screen space
///
/// Returns the NDC-space distance between the reference point and the same
/// point displaced vertically by the level's error. Degenerate projections
/// come back as infinity so the level never qualifies.
fn projected_error(entry: &LodErrorEntry, view_proj: &Mat4) -> f32 {
    // Level 0 always lands here: no displacement, nothing to project.
    if entry.error == 0.0 {
        return 0.0;
    }
    let reference = project_ndc(view_proj, entry.reference);
    let displaced = project_ndc(view_proj, entry.displaced);
    let error = reference.distance(displaced);
    if error.is_finite() {
        error
    } else {
        f32::INFINITY
    }
}

fn project_ndc(view_proj: &Mat4, point: Vec3) -> Vec2 {
    let clip = *view_proj * point.extend(1.0);
    let w = clip.w.max(NEAR_PLANE_EPS);
    Vec2::new(clip.x / w, clip.y / w)
}
