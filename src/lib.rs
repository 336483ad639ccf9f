//! Continuous level-of-detail terrain meshing
//!
//! A standalone geomipmapping library: it carves a heightfield into fixed
//! 17x17-sample patches, precomputes per-patch approximation errors for five
//! LOD levels, and each frame culls, selects detail by projected screen-space
//! error, and splices every visible patch into one triangle strip. Engine
//! agnostic, CPU only: the output is plain vertex and index buffers suitable
//! for any renderer (wgpu, Bevy, Godot, etc.)
//!
//! # Quick Start
//!
//! ```rust
//! use geomip_terrain::*;
//!
//! // A deterministic procedural heightfield (any HeightSource works)
//! let heights = HeightGrid::from_noise(65, 65, 42, &NoiseConfig::default());
//!
//! let config = TerrainConfigBuilder::new()
//!     .max_screen_error(0.03).unwrap()
//!     .world_scale(Vec3::new(2.0, 1.0, 2.0)).unwrap()
//!     .build();
//! let mut terrain = Terrain::new(heights, config).unwrap();
//!
//! // Once per frame: cull, pick LODs, rebuild what changed
//! let proj = Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 2000.0);
//! let view = Mat4::look_at_rh(Vec3::new(64.0, 60.0, 64.0), Vec3::new(64.0, 0.0, 64.0), Vec3::Z);
//! let mesh = terrain.on_pre_render(&CameraState::from_view_proj(view, proj));
//!
//! println!("Drawing {} strip triangles", mesh.triangle_count());
//! ```
//!
//! # Features
//!
//! - `serde`: Enables serialization support for configuration types

// Modules
pub mod camera;
pub mod config;
pub mod error;
pub mod grid;
pub mod height;
pub mod patch;
pub mod terrain;

// Re-export core types for convenience
pub use camera::{CameraState, Frustum};
pub use config::{TerrainConfig, TerrainConfigBuilder};
pub use error::{Result, TerrainError};
pub use grid::{Edge, PatchGrid};
pub use height::{sample_fbm_2d, HeightGrid, HeightSource, NoiseConfig};
pub use patch::{
    LodLevels, Patch, PatchMesh, TerrainVertex, MAX_LOD, MAX_PATCH_INDICES, MAX_PATCH_VERTICES,
    PATCH_SIZE, PATCH_STRIDE,
};
pub use terrain::{FrameMesh, FrameStats, Terrain};

// Re-export the math types that appear in the public API
pub use glam::{Mat4, Vec3};
