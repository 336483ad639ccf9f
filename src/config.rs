//! Terrain configuration and builder
//!
//! This module provides configuration types for terrain construction and
//! per-frame level-of-detail selection.

use glam::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerrainError};

/// Configuration for a terrain instance
///
/// The configuration is fixed for the lifetime of a [`crate::Terrain`]: the
/// error budget drives LOD selection every frame, and the world placement
/// determines where the heightfield grid lands in world space.
///
/// # Example
///
/// ```rust
/// use geomip_terrain::*;
///
/// let config = TerrainConfigBuilder::new()
///     .max_screen_error(0.03)
///     .unwrap()
///     .world_scale(Vec3::new(2.0, 40.0, 2.0))
///     .unwrap()
///     .build();
/// assert_eq!(config.max_screen_error, 0.03);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainConfig {
    /// Screen-space error budget for LOD selection
    ///
    /// Measured as a displacement in normalized device coordinates after
    /// projecting a patch's world-space approximation error through the
    /// camera transform. Each frame every visible patch picks the coarsest
    /// tessellation whose projected error stays below this budget. Smaller
    /// values mean finer meshes and more triangles.
    pub max_screen_error: f32,

    /// Scale applied to grid coordinates and heights when placing vertices
    ///
    /// `x`/`z` scale the sample spacing, `y` scales the raw height values.
    pub world_scale: Vec3,

    /// World-space position of the grid sample (0, 0)
    pub world_origin: Vec3,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfigBuilder::new().build()
    }
}

/// Builder for creating a [`TerrainConfig`] with validation
///
/// # Example
///
/// ```rust
/// use geomip_terrain::*;
///
/// // Defaults: budget 0.05, unit scale, origin at zero
/// let config = TerrainConfigBuilder::new().build();
///
/// // Customize
/// let config = TerrainConfigBuilder::new()
///     .max_screen_error(0.02)
///     .unwrap()
///     .world_origin(Vec3::new(-256.0, 0.0, -256.0))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct TerrainConfigBuilder {
    max_screen_error: f32,
    world_scale: Vec3,
    world_origin: Vec3,
}

impl TerrainConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - max_screen_error: 0.05 (NDC units)
    /// - world_scale: (1, 1, 1)
    /// - world_origin: (0, 0, 0)
    pub fn new() -> Self {
        Self {
            max_screen_error: 0.05,
            world_scale: Vec3::ONE,
            world_origin: Vec3::ZERO,
        }
    }

    /// Set the screen-space error budget
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the budget is not finite or not positive.
    pub fn max_screen_error(mut self, budget: f32) -> Result<Self> {
        if !budget.is_finite() || budget <= 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "screen error budget must be positive and finite (got {})",
                budget
            )));
        }
        self.max_screen_error = budget;
        Ok(self)
    }

    /// Set the world scale applied to grid coordinates and heights
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if any component is not finite or not positive.
    pub fn world_scale(mut self, scale: Vec3) -> Result<Self> {
        if !scale.is_finite() || scale.min_element() <= 0.0 {
            return Err(TerrainError::InvalidConfig(format!(
                "world scale components must be positive and finite (got {})",
                scale
            )));
        }
        self.world_scale = scale;
        Ok(self)
    }

    /// Set the world-space position of grid sample (0, 0)
    pub fn world_origin(mut self, origin: Vec3) -> Self {
        self.world_origin = origin;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TerrainConfig {
        TerrainConfig {
            max_screen_error: self.max_screen_error,
            world_scale: self.world_scale,
            world_origin: self.world_origin,
        }
    }
}

impl Default for TerrainConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = TerrainConfigBuilder::new().build();
        assert_eq!(config.max_screen_error, 0.05);
        assert_eq!(config.world_scale, Vec3::ONE);
        assert_eq!(config.world_origin, Vec3::ZERO);
    }

    #[test]
    fn test_builder_custom() {
        let config = TerrainConfigBuilder::new()
            .max_screen_error(0.01)
            .unwrap()
            .world_scale(Vec3::new(4.0, 100.0, 4.0))
            .unwrap()
            .world_origin(Vec3::new(-64.0, 10.0, -64.0))
            .build();

        assert_eq!(config.max_screen_error, 0.01);
        assert_eq!(config.world_scale, Vec3::new(4.0, 100.0, 4.0));
        assert_eq!(config.world_origin, Vec3::new(-64.0, 10.0, -64.0));
    }

    #[test]
    fn test_invalid_screen_error() {
        assert!(TerrainConfigBuilder::new().max_screen_error(0.0).is_err());
        assert!(TerrainConfigBuilder::new().max_screen_error(-1.0).is_err());
        assert!(TerrainConfigBuilder::new()
            .max_screen_error(f32::NAN)
            .is_err());
        assert!(TerrainConfigBuilder::new()
            .max_screen_error(f32::INFINITY)
            .is_err());
    }

    #[test]
    fn test_invalid_world_scale() {
        assert!(TerrainConfigBuilder::new()
            .world_scale(Vec3::new(1.0, 0.0, 1.0))
            .is_err());
        assert!(TerrainConfigBuilder::new()
            .world_scale(Vec3::new(-1.0, 1.0, 1.0))
            .is_err());
        assert!(TerrainConfigBuilder::new()
            .world_scale(Vec3::new(1.0, f32::NAN, 1.0))
            .is_err());
    }

    #[test]
    fn test_default_config() {
        let config = TerrainConfig::default();
        assert_eq!(config, TerrainConfigBuilder::new().build());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_serialization() {
        let config = TerrainConfigBuilder::new()
            .max_screen_error(0.02)
            .unwrap()
            .build();

        let json = serde_json::to_string(&config).unwrap();
        let restored: TerrainConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, restored);
    }
}
