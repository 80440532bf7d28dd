//! Surface topology scan: which mesh chunks can carry visible faces.
//!
//! Face ownership: a chunk meshes the planes strictly inside it and its
//! positive face on each axis. Its negative face belongs to the neighbour
//! below, except on the volume's lower boundary where no such neighbour
//! exists and the chunk owns it too. Every face plane of the volume therefore
//! has exactly one owner.
//!
//! A uniform region (childless node) can only carry faces on its own boundary,
//! and only where the slab of voxels just outside differs in emptiness. The
//! [`BoundaryMask`] records exactly those sides, so whole uniform branches with
//! no owned visible side are pruned without descending.

use crate::core::types::{is_solid, Axis, IVec3, VoxelValue};
use crate::math::{octant_offset, Aabb};
use crate::voxel::svo::OctreeNode;

/// Per-side visibility of a region's boundary.
///
/// Bit `axis * 2 + side` is set when the face on that side may carry quads:
/// side 0 is the negative face, side 1 the positive one. Outside the volume
/// counts as air.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BoundaryMask(pub u8);

impl BoundaryMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b11_1111);

    #[inline]
    fn bit(axis: Axis, positive: bool) -> u8 {
        1 << (axis.index() * 2 + usize::from(positive))
    }

    /// Mask with one side added
    pub fn with_side(self, axis: Axis, positive: bool) -> Self {
        Self(self.0 | Self::bit(axis, positive))
    }

    pub fn has_side(self, axis: Axis, positive: bool) -> bool {
        self.0 & Self::bit(axis, positive) != 0
    }

    /// True if either side on `axis` is set
    pub fn has_axis(self, axis: Axis) -> bool {
        self.has_side(axis, false) || self.has_side(axis, true)
    }

    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Sides a region at `origin` is responsible for meshing
    pub fn owned(origin: IVec3) -> Self {
        Axis::ALL.into_iter().fold(Self::NONE, |mask, axis| {
            let mask = mask.with_side(axis, true);
            if origin[axis.index()] == 0 {
                mask.with_side(axis, false)
            } else {
                mask
            }
        })
    }

    /// Boundary mask of the uniform cube `[origin, origin + size)`, probing
    /// the one-voxel slab outside each face.
    pub fn of_uniform(root: &OctreeNode, origin: IVec3, size: i32, empty: bool) -> Self {
        let world = root.size();
        let mut mask = Self::NONE;
        for axis in Axis::ALL {
            let a = axis.index();
            for positive in [false, true] {
                let plane = if positive { origin[a] + size } else { origin[a] - 1 };
                let outside_empty = if plane < 0 || plane >= world {
                    Some(true)
                } else {
                    let mut min = origin;
                    let mut max = origin + IVec3::splat(size);
                    min[a] = plane;
                    max[a] = plane + 1;
                    root.region_emptiness(IVec3::ZERO, &Aabb::new(min, max))
                };
                if outside_empty != Some(empty) {
                    mask = mask.with_side(axis, positive);
                }
            }
        }
        mask
    }
}

/// A mesh chunk that may carry visible faces
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkCandidate {
    /// Lowest voxel of the chunk
    pub origin: IVec3,
    /// Visible sides; [`BoundaryMask::ALL`] for chunks with internal detail
    pub mask: BoundaryMask,
}

/// Subtree being scanned: a real node, or a virtual octant of a uniform node
#[derive(Clone, Copy)]
enum Region<'a> {
    Node(&'a OctreeNode),
    Uniform { depth: u8, value: VoxelValue },
}

impl<'a> Region<'a> {
    fn of(node: &'a OctreeNode) -> Self {
        if node.is_leaf() {
            Region::Uniform { depth: node.depth(), value: node.value() }
        } else {
            Region::Node(node)
        }
    }
}

/// Find every chunk of side `2^sub_mesh_level` that may carry visible faces.
///
/// Reads the tree only; callers decide what to do with the candidates.
pub fn scan(root: &OctreeNode, sub_mesh_level: u8) -> Vec<ChunkCandidate> {
    debug_assert!(sub_mesh_level <= root.depth());
    scan_region(root, Region::of(root), IVec3::ZERO, sub_mesh_level)
}

fn scan_region(root: &OctreeNode, region: Region<'_>, origin: IVec3, level: u8) -> Vec<ChunkCandidate> {
    match region {
        Region::Node(node) => {
            if node.depth() == level {
                return vec![ChunkCandidate { origin, mask: BoundaryMask::ALL }];
            }
            let half = node.size() / 2;
            let mut found = Vec::new();
            for (i, child) in node.children().into_iter().flatten().enumerate() {
                found.extend(scan_region(root, Region::of(child), origin + octant_offset(i) * half, level));
            }
            found
        }
        Region::Uniform { depth, value } => {
            let size = 1 << depth;
            let mask = BoundaryMask::of_uniform(root, origin, size, !is_solid(value));
            if mask.intersection(BoundaryMask::owned(origin)).is_empty() {
                return Vec::new();
            }
            if depth == level {
                return vec![ChunkCandidate { origin, mask }];
            }
            let half = size / 2;
            (0..8)
                .flat_map(|i| {
                    let child = Region::Uniform { depth: depth - 1, value };
                    scan_region(root, child, origin + octant_offset(i) * half, level)
                })
                .collect()
        }
    }
}
