//! Surface extraction: chunk meshing, smoothing and the renderer-facing
//! attribute bundles.

pub mod attributes;
pub mod smoothing;
pub mod mesher;

pub use attributes::{MeshAttributes, MeshSink};
pub use mesher::ChunkMesher;
