//! Carving brushes: shapes that classify octree regions for CSG-style edits.

pub mod primitive;

pub use primitive::BrushPrimitive;
