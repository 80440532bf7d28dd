//! Axis-aligned cross-sections of an octree.
//!
//! A cross-section normal to `axis` is laid out in a flat buffer with the
//! in-plane axes `u = axis.u()` running along a row and `v = axis.v()` selecting
//! the row: cell `(u, v)` lives at `v * stride + u`. Only the four children
//! crossing the plane are visited at each level, and a uniform node fills its
//! whole square in one go.

use super::node::OctreeNode;
use crate::core::types::{Axis, IVec2, VoxelValue};

impl OctreeNode {
    /// Write the full `size × size` cross-section at local `plane` into
    /// `buf[pos..]` with row `stride`.
    ///
    /// `plane` must be in `[0, size)`.
    pub fn slice(&self, buf: &mut [VoxelValue], pos: usize, stride: usize, plane: u32, axis: Axis) {
        debug_assert!((plane as i32) < self.size());
        let size = self.size();
        self.write_plane(&mut buf[pos..], stride, plane as i32, axis, IVec2::ZERO, IVec2::splat(size));
    }

    /// Write the window `[min, min + extent)` of the cross-section at local
    /// `plane` into `buf` with row `stride`; window cell `(0, 0)` lands at `buf[0]`.
    ///
    /// The window may reach outside the node (negative `min`, or beyond
    /// `size`); those cells, and the whole window when `plane` is outside the
    /// node, are left untouched so the caller can pre-fill them.
    pub fn slice2(
        &self,
        buf: &mut [VoxelValue],
        stride: usize,
        plane: i32,
        axis: Axis,
        min: IVec2,
        extent: IVec2,
    ) {
        if plane < 0 || plane >= self.size() {
            return;
        }
        self.write_plane(buf, stride, plane, axis, -min, extent);
    }

    /// `at` is this node's lowest `(u, v)` cell in buffer coordinates.
    fn write_plane(
        &self,
        buf: &mut [VoxelValue],
        stride: usize,
        plane: i32,
        axis: Axis,
        at: IVec2,
        extent: IVec2,
    ) {
        let size = self.size();
        let lo = at.max(IVec2::ZERO);
        let hi = (at + IVec2::splat(size)).min(extent);
        if hi.x <= lo.x || hi.y <= lo.y {
            return;
        }

        let Some(children) = self.children() else {
            for v in lo.y..hi.y {
                let row = v as usize * stride;
                buf[row + lo.x as usize..row + hi.x as usize].fill(self.value());
            }
            return;
        };

        let half = size / 2;
        let a_bit = usize::from(plane >= half);
        let (a, u, v) = (axis.index(), axis.u().index(), axis.v().index());
        for ub in 0..2usize {
            for vb in 0..2usize {
                let index = (a_bit << a) | (ub << u) | (vb << v);
                let child_at = at + IVec2::new(ub as i32, vb as i32) * half;
                children[index].write_plane(buf, stride, plane - a_bit as i32 * half, axis, child_at, extent);
            }
        }
    }
}
