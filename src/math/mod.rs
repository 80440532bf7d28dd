//! Integer geometry helpers

pub mod aabb;
pub mod morton;

pub use aabb::{octant_offset, Aabb};
pub use morton::ChunkKey;
