//! Error types for carvox

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Voxel ({x}, {y}, {z}) is outside a volume of size {size}")]
    OutOfBounds { x: i32, y: i32, z: i32, size: i32 },
}
