//! Error types for terrain construction

use std::fmt;

/// Errors that can occur while building a terrain
#[derive(Debug, Clone)]
pub enum TerrainError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// The height source cannot be tiled into patches
    InvalidHeightSource(String),
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerrainError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            TerrainError::InvalidHeightSource(msg) => write!(f, "invalid height source: {}", msg),
        }
    }
}

impl std::error::Error for TerrainError {}

/// Result type alias for terrain operations
pub type Result<T> = std::result::Result<T, TerrainError>;
