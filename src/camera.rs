//! Camera state and frustum culling primitive
//!
//! The terrain only needs two things from the camera each frame: the combined
//! view-projection transform (for screen-space error projection) and a frustum
//! (for patch culling). Both are bundled in [`CameraState`].

use glam::{Mat4, Vec3};
use parry3d::bounding_volume::Aabb;

/// Per-frame camera input to [`crate::Terrain::on_pre_render`]
///
/// # Example
///
/// ```rust
/// use geomip_terrain::*;
/// use glam::Mat4;
///
/// let proj = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 1000.0);
/// let view = Mat4::look_at_rh(Vec3::new(0.0, 50.0, 0.0), Vec3::ZERO, Vec3::Z);
/// let camera = CameraState::from_view_proj(view, proj);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CameraState {
    /// Combined view-projection transform for the current frame
    pub view_proj: Mat4,
}

impl CameraState {
    /// Create from an already-combined view-projection matrix
    pub fn new(view_proj: Mat4) -> Self {
        Self { view_proj }
    }

    /// Combine separate view and projection matrices
    pub fn from_view_proj(view: Mat4, proj: Mat4) -> Self {
        Self {
            view_proj: proj * view,
        }
    }

    /// Extract the culling frustum for this frame
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(self.view_proj)
    }
}

#[derive(Debug, Clone, Copy)]
struct Plane {
    normal: Vec3,
    d: f32,
}

/// View frustum as six inward-facing planes
///
/// Extracted from a combined view-projection matrix with a depth range of
/// [0, 1] (the wgpu/DirectX convention used by `glam`'s `perspective_rh`).
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Plane; 6],
}

// Slack added to the plane test so patches whose silhouette slightly
// overhangs their AABB are not culled a frame early.
const CULL_MARGIN: f32 = 0.5;

impl Frustum {
    /// Extract frustum planes from a combined view-projection matrix
    pub fn from_matrix(view_proj: Mat4) -> Self {
        let m = view_proj.transpose();

        let r0 = m.x_axis;
        let r1 = m.y_axis;
        let r2 = m.z_axis;
        let r3 = m.w_axis;

        let raw = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r2,      // near (z >= 0)
            r3 - r2, // far (z <= w)
        ];

        let planes = raw.map(|p| {
            let n = Vec3::new(p.x, p.y, p.z);
            let inv_len = 1.0 / n.length();
            Plane {
                normal: n * inv_len,
                d: p.w * inv_len,
            }
        });

        Self { planes }
    }

    /// Test whether an AABB is at least partially inside the frustum
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        let c = aabb.center();
        let he = aabb.half_extents();
        let center = Vec3::new(c.x, c.y, c.z);
        let extents = Vec3::new(he.x, he.y, he.z);

        for plane in &self.planes {
            let r = extents.dot(plane.normal.abs());
            let s = plane.normal.dot(center) + plane.d;
            if s + r < -CULL_MARGIN {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parry3d::math::Point;

    fn test_camera(eye: Vec3, target: Vec3) -> CameraState {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_3, 1.0, 0.1, 1000.0);
        let view = Mat4::look_at_rh(eye, target, Vec3::Y);
        CameraState::from_view_proj(view, proj)
    }

    fn unit_box_at(center: Vec3) -> Aabb {
        Aabb::new(
            Point::new(center.x - 1.0, center.y - 1.0, center.z - 1.0),
            Point::new(center.x + 1.0, center.y + 1.0, center.z + 1.0),
        )
    }

    #[test]
    fn test_box_in_front_is_visible() {
        let camera = test_camera(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let frustum = camera.frustum();
        assert!(frustum.intersects_aabb(&unit_box_at(Vec3::ZERO)));
    }

    #[test]
    fn test_box_behind_is_culled() {
        let camera = test_camera(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let frustum = camera.frustum();
        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(0.0, 0.0, 100.0))));
    }

    #[test]
    fn test_box_far_to_the_side_is_culled() {
        let camera = test_camera(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let frustum = camera.frustum();
        assert!(!frustum.intersects_aabb(&unit_box_at(Vec3::new(500.0, 0.0, 0.0))));
    }

    #[test]
    fn test_large_box_straddling_frustum_is_visible() {
        let camera = test_camera(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        let frustum = camera.frustum();
        let aabb = Aabb::new(
            Point::new(-1000.0, -1.0, -1000.0),
            Point::new(1000.0, 1.0, 1000.0),
        );
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_from_view_proj_matches_manual_combine() {
        let proj = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0);
        let view = Mat4::look_at_rh(Vec3::new(3.0, 4.0, 5.0), Vec3::ZERO, Vec3::Y);
        let camera = CameraState::from_view_proj(view, proj);
        assert_eq!(camera.view_proj, proj * view);
    }
}
