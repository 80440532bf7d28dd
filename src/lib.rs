//! Carvox - a destructible sparse-voxel volume with incremental greedy meshing

pub mod core;
pub mod math;
pub mod voxel;
pub mod mesh;

pub use crate::core::{BundlePolicy, Error, MeshingConfig, Result, VolumeConfig};
pub use crate::mesh::{MeshAttributes, MeshSink};
pub use crate::voxel::{BrushPrimitive, OctreeNode, RegionClassifier, RegionHint, VoxelVolume};
