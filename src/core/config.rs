//! Volume and meshing configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Result, VoxelValue, EMPTY, MAX_DEPTH};

/// Vertex count at which a 16-bit index buffer runs out.
pub const U16_VERTEX_LIMIT: usize = 1 << 16;

/// Largest mesh chunk: 256 voxels per side. The mesher keeps two
/// `(2^level + 2)²` cross-section buffers per chunk.
pub const MAX_SUB_MESH_LEVEL: u8 = 8;

/// Default vertex smoothing offsets, indexed by the number of solid cells
/// (0..=8) around a quad corner. Positive values pull the corner toward the
/// more solid side of the face.
pub const DEFAULT_SMOOTHING: [f32; 9] = [0.0, 0.375, 0.25, 0.125, 0.0, -0.125, -0.25, -0.375, 0.0];

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Configuration for a [`crate::voxel::volume::VoxelVolume`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Root depth: the volume spans `2^depth` voxels per side.
    pub depth: u8,
    /// Mesh chunks span `2^sub_mesh_level` voxels per side.
    pub sub_mesh_level: u8,
    /// Value of every voxel on construction and after `clear()`.
    pub fill: VoxelValue,
    /// Mesh extraction parameters.
    pub meshing: MeshingConfig,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            depth: 6,       // 64 voxels per side
            sub_mesh_level: 4, // 16^3 chunks, 64 of them
            fill: EMPTY,
            meshing: MeshingConfig::default(),
        }
    }
}

impl VolumeConfig {
    /// Config with the given geometry and default meshing.
    pub fn new(depth: u8, sub_mesh_level: u8) -> Self {
        Self {
            depth,
            sub_mesh_level,
            ..Self::default()
        }
    }

    /// Builder-style override of the initial fill value.
    pub fn with_fill(mut self, fill: VoxelValue) -> Self {
        self.fill = fill;
        self
    }

    /// Builder-style override of the meshing parameters.
    pub fn with_meshing(mut self, meshing: MeshingConfig) -> Self {
        self.meshing = meshing;
        self
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the geometric and meshing constraints.
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 || self.depth > MAX_DEPTH {
            return Err(Error::InvalidConfig(format!(
                "depth must be in 1..={MAX_DEPTH}, got {}",
                self.depth
            )));
        }
        if self.sub_mesh_level > self.depth {
            return Err(Error::InvalidConfig(format!(
                "sub_mesh_level {} exceeds depth {}",
                self.sub_mesh_level, self.depth
            )));
        }
        if self.sub_mesh_level > MAX_SUB_MESH_LEVEL {
            return Err(Error::InvalidConfig(format!(
                "sub_mesh_level must be at most {MAX_SUB_MESH_LEVEL}, got {}",
                self.sub_mesh_level
            )));
        }
        if self.meshing.smoothing.iter().any(|o| !o.is_finite() || o.abs() >= 0.5) {
            return Err(Error::InvalidConfig(
                "smoothing offsets must be finite and within (-0.5, 0.5)".into(),
            ));
        }
        if let BundlePolicy::SplitAt { max_vertices } = self.meshing.bundle_policy {
            if max_vertices < 4 {
                return Err(Error::InvalidConfig(format!(
                    "bundle max_vertices must hold at least one quad, got {max_vertices}"
                )));
            }
        }
        Ok(())
    }

    /// Side length of the volume in voxels.
    pub fn size(&self) -> i32 {
        1 << self.depth
    }

    /// Side length of one mesh chunk in voxels.
    pub fn chunk_size(&self) -> i32 {
        1 << self.sub_mesh_level
    }
}

// ---------------------------------------------------------------------------
// Meshing
// ---------------------------------------------------------------------------

/// Parameters of the chunk mesher.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshingConfig {
    /// Corner offsets indexed by neighbour solid count. All zeros disables smoothing.
    pub smoothing: [f32; 9],
    /// How vertex output of one chunk is split into bundles.
    pub bundle_policy: BundlePolicy,
    /// Extract a `gen_mesh` batch on the rayon pool. Sink calls stay on the caller's thread.
    pub parallel: bool,
}

impl Default for MeshingConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            bundle_policy: BundlePolicy::default(),
            parallel: false,
        }
    }
}

impl MeshingConfig {
    /// Exact voxel geometry, no corner smoothing.
    pub fn unsmoothed() -> Self {
        Self {
            smoothing: [0.0; 9],
            ..Self::default()
        }
    }
}

/// Policy for chunks whose mesh outgrows one bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BundlePolicy {
    /// Start a new bundle before the current one exceeds `max_vertices`.
    SplitAt { max_vertices: usize },
    /// Single bundle per chunk; consumers must use 32-bit indices.
    Unbounded,
}

impl Default for BundlePolicy {
    fn default() -> Self {
        BundlePolicy::SplitAt { max_vertices: U16_VERTEX_LIMIT }
    }
}

impl BundlePolicy {
    /// Vertex capacity of a single bundle.
    pub fn max_vertices(&self) -> usize {
        match self {
            BundlePolicy::SplitAt { max_vertices } => *max_vertices,
            BundlePolicy::Unbounded => usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = VolumeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.size(), 64);
        assert_eq!(config.chunk_size(), 16);
    }

    #[test]
    fn test_rejects_chunk_larger_than_volume() {
        let config = VolumeConfig::new(3, 4);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_depth() {
        assert!(VolumeConfig::new(0, 0).validate().is_err());
        assert!(VolumeConfig::new(MAX_DEPTH + 1, 2).validate().is_err());
        assert!(VolumeConfig::new(MAX_DEPTH, 2).validate().is_ok());
    }

    #[test]
    fn test_rejects_oversized_chunks() {
        assert!(VolumeConfig::new(MAX_DEPTH, MAX_SUB_MESH_LEVEL).validate().is_ok());
        let config = VolumeConfig::new(MAX_DEPTH, MAX_SUB_MESH_LEVEL + 1);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        assert!(VolumeConfig::new(MAX_DEPTH, MAX_DEPTH).validate().is_err());
    }

    #[test]
    fn test_rejects_large_smoothing() {
        let mut config = VolumeConfig::new(4, 2);
        config.meshing.smoothing[1] = 0.75;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = VolumeConfig::from_json_str(r#"{ "depth": 5, "sub_mesh_level": 3 }"#).unwrap();
        assert_eq!(config.depth, 5);
        assert_eq!(config.sub_mesh_level, 3);
        assert_eq!(config.fill, EMPTY);
        assert_eq!(config.meshing, MeshingConfig::default());
    }

    #[test]
    fn test_bundle_policy_json() {
        let json = r#"{
            "depth": 4,
            "sub_mesh_level": 2,
            "meshing": { "bundle_policy": { "kind": "unbounded" }, "parallel": true }
        }"#;
        let config = VolumeConfig::from_json_str(json).unwrap();
        assert_eq!(config.meshing.bundle_policy, BundlePolicy::Unbounded);
        assert!(config.meshing.parallel);

        let round = VolumeConfig::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(round, config);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            VolumeConfig::from_json_str("{ depth: }"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "depth": 3, "sub_mesh_level": 1, "fill": 2 }}"#).unwrap();

        let config = VolumeConfig::load(file.path()).unwrap();
        assert_eq!(config.size(), 8);
        assert_eq!(config.chunk_size(), 2);
        assert_eq!(config.fill, 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = VolumeConfig::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
