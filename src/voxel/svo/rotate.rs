//! Quarter-turn rotation of an octree in place.
//!
//! Rotating a cube by 90° permutes its octants along two 4-cycles and rotates
//! each octant's content the same way, so the whole operation is a fixed slot
//! permutation applied recursively. No values are rewritten.
//!
//! For a cube of side `n`, a voxel at `p` moves to:
//! - about X: `(x, n-1-z, y)`
//! - about Y: `(z, y, n-1-x)`
//! - about Z: `(n-1-y, x, z)`

use super::node::OctreeNode;
use crate::core::types::Axis;

/// Per-axis octant cycles `[a, b, c, d]`: content of slot a moves to b, b to c,
/// c to d and d back to a.
const ROTATION_CYCLES: [[[usize; 4]; 2]; 3] = [
    // X: (y, z) bits -> (1 - z, y)
    [[0, 2, 6, 4], [1, 3, 7, 5]],
    // Y: (z, x) bits -> (1 - x, z)
    [[0, 4, 5, 1], [2, 6, 7, 3]],
    // Z: (x, y) bits -> (1 - y, x)
    [[0, 1, 3, 2], [4, 5, 7, 6]],
];

impl OctreeNode {
    /// Rotate the subtree a quarter turn about `axis`.
    ///
    /// Four rotations about the same axis restore the original tree.
    pub fn rotate90(&mut self, axis: Axis) {
        let Some(children) = self.children_mut() else {
            return;
        };
        for [a, b, c, d] in ROTATION_CYCLES[axis.index()] {
            children.swap(a, b);
            children.swap(a, c);
            children.swap(a, d);
        }
        for child in children.iter_mut() {
            child.rotate90(axis);
        }
    }
}
