//! Voxel data structures and operations

pub mod svo;
pub mod brush;
pub mod volume;

pub use svo::{OctreeNode, RegionClassifier, RegionHint};
pub use brush::BrushPrimitive;
pub use volume::VoxelVolume;
