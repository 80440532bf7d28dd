//! Sparse voxel octree: a recursively subdivided cube with one value per
//! uniform region, lazily split on write and compacted on the way back up.

pub mod node;
pub mod classifier;
pub mod rotate;
pub mod slice;

pub use node::OctreeNode;
pub use classifier::{Padded, RegionClassifier, RegionHint};
