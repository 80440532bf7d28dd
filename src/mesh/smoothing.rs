//! Corner smoothing for voxel faces.
//!
//! A quad corner on plane `k` touches four cells on each side of the plane.
//! Where the two sides hold different amounts of solid, the corner sits on
//! an edge or a corner of the voxel surface and is pulled along the face
//! normal by a table offset, softening the stair-stepping of a pure voxel mesh.

use crate::core::types::{is_solid, VoxelValue};

/// Offset of the corner at grid point `(u, v)` between two padded
/// cross-sections, in units along the face normal (positive toward `next`).
///
/// `prev` and `next` are `(n + 2)²` buffers with row `stride`; chunk cell
/// `(u, v)` lives at padded index `(v + 1) * stride + u + 1`, so the four
/// cells around corner `(u, v)` are the padded cells `(u..=u+1, v..=v+1)`.
pub fn corner_offset(
    table: &[f32; 9],
    prev: &[VoxelValue],
    next: &[VoxelValue],
    stride: usize,
    u: usize,
    v: usize,
) -> f32 {
    let cells = [v * stride + u, v * stride + u + 1, (v + 1) * stride + u, (v + 1) * stride + u + 1];
    let count = |buf: &[VoxelValue]| cells.iter().filter(|&&i| is_solid(buf[i])).count();
    let (behind, ahead) = (count(prev), count(next));

    if behind == ahead {
        return 0.0;
    }
    let offset = table[behind + ahead];
    if ahead > behind { offset } else { -offset }
}
