//! Mesh attribute bundles handed to the renderer integration.

use crate::core::types::{IVec3, Vec3};

/// One bundle of chunk geometry.
///
/// Positions are relative to the chunk origin. `materials` is parallel to
/// `positions` (one id per vertex, shared by the 4 corners of a quad) and
/// `indices` holds triangle triples.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshAttributes {
    pub positions: Vec<[f32; 3]>,
    pub materials: Vec<u8>,
    pub indices: Vec<u32>,
}

impl MeshAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Quads emitted into this bundle (4 vertices each)
    pub fn quad_count(&self) -> usize {
        self.positions.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Append a quad with corners in `u, v` order and return its first vertex.
    ///
    /// Corners go around the quad counter-clockwise when seen from the side
    /// `u × v` points to; `flip` reverses the winding so the quad faces the
    /// other way.
    pub fn push_quad(&mut self, corners: [Vec3; 4], material: u8, flip: bool) -> usize {
        let base = self.positions.len();
        self.positions.extend(corners.iter().map(|c| c.to_array()));
        self.materials.extend([material; 4]);

        let b = base as u32;
        if flip {
            self.indices.extend([b, b + 2, b + 1, b, b + 3, b + 2]);
        } else {
            self.indices.extend([b, b + 1, b + 2, b, b + 2, b + 3]);
        }
        base
    }

    /// Corner `i` (0..4) of the quad starting at `base`
    pub fn corner(&self, base: usize, i: usize) -> Vec3 {
        Vec3::from_array(self.positions[base + i])
    }

    /// Overwrite corner `i` of the quad starting at `base`
    pub fn set_corner(&mut self, base: usize, i: usize, p: Vec3) {
        self.positions[base + i] = p.to_array();
    }

    /// Raw position bytes for vertex buffer upload
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw 32-bit index bytes for index buffer upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Indices narrowed to 16 bits, if every vertex is addressable
    pub fn indices_u16(&self) -> Option<Vec<u16>> {
        if self.positions.len() > u16::MAX as usize + 1 {
            return None;
        }
        Some(self.indices.iter().map(|&i| i as u16).collect())
    }
}

/// Renderer integration: turns attribute bundles into drawable objects.
///
/// The volume calls `create` once per bundle when a chunk is built and hands
/// every handle back to `dispose` exactly once when the chunk is invalidated,
/// cleared or the volume is dropped. `create` must copy what it needs; the
/// attribute buffers are discarded afterwards.
pub trait MeshSink {
    type Handle;

    fn create(&mut self, attributes: &MeshAttributes, origin: IVec3) -> Self::Handle;

    fn dispose(&mut self, handle: Self::Handle);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> [Vec3; 4] {
        [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ]
    }

    /// Normal of triangle (a, b, c) by the right-hand rule
    fn normal(m: &MeshAttributes, tri: usize) -> Vec3 {
        let [a, b, c] = [0, 1, 2].map(|i| Vec3::from_array(m.positions[m.indices[tri * 3 + i] as usize]));
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn test_push_quad_winding() {
        let mut m = MeshAttributes::new();
        m.push_quad(unit_quad(), 3, false);
        assert_eq!(m.vertex_count(), 4);
        assert_eq!(m.triangle_count(), 2);
        assert_eq!(normal(&m, 0), Vec3::Z);
        assert_eq!(normal(&m, 1), Vec3::Z);

        let base = m.push_quad(unit_quad(), 3, true);
        assert_eq!(base, 4);
        assert_eq!(normal(&m, 2), -Vec3::Z);
        assert_eq!(normal(&m, 3), -Vec3::Z);
        assert_eq!(m.materials, vec![3; 8]);
    }

    #[test]
    fn test_set_corner() {
        let mut m = MeshAttributes::new();
        let base = m.push_quad(unit_quad(), 1, false);
        m.set_corner(base, 1, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(m.corner(base, 1), Vec3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_byte_views() {
        let mut m = MeshAttributes::new();
        m.push_quad(unit_quad(), 1, false);
        assert_eq!(m.position_bytes().len(), 4 * 12);
        assert_eq!(m.index_bytes().len(), 6 * 4);
        assert_eq!(m.indices_u16(), Some(vec![0, 1, 2, 0, 2, 3]));
    }
}
