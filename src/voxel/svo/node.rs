//! Sparse voxel octree node
//!
//! A node spans a cube of side `2^depth` and stores one value for the whole
//! cube until a finer write forces it to split. Children are always allocated
//! and freed as a batch of 8, indexed by `x_bit | y_bit << 1 | z_bit << 2` at
//! the node's mid-plane.
//!
//! Invariant: a node with children is never collapsible, i.e. its 8 children
//! are never all childless with one shared value. Every mutation restores this
//! on the way back up ("compaction").

use super::classifier::{RegionClassifier, RegionHint};
use crate::core::types::{is_solid, IVec3, VoxelValue};
use crate::math::{octant_offset, Aabb};

/// Octree node owning its subtree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OctreeNode {
    /// Cube side is `2^depth`
    depth: u8,
    /// Value of every voxel in the cube while childless
    value: VoxelValue,
    /// Either no children or exactly 8 of `depth - 1`
    children: Option<Box<[OctreeNode; 8]>>,
}

/// Child index of voxel `(x, y, z)` inside a node of `depth >= 1`
#[inline]
fn child_index(x: u32, y: u32, z: u32, depth: u8) -> usize {
    let bit = depth - 1;
    (((x >> bit) & 1) | (((y >> bit) & 1) << 1) | (((z >> bit) & 1) << 2)) as usize
}

impl OctreeNode {
    /// Create a childless node of uniform value
    pub fn new(depth: u8, value: VoxelValue) -> Self {
        Self { depth, value, children: None }
    }

    /// Cube side is `2^depth`
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Side length in voxels
    pub fn size(&self) -> i32 {
        1 << self.depth
    }

    /// Uniform value; meaningless while the node has children
    pub fn value(&self) -> VoxelValue {
        self.value
    }

    /// Check if this node is childless (uniform)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// The 8 children, if any
    pub fn children(&self) -> Option<&[OctreeNode; 8]> {
        self.children.as_deref()
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut [OctreeNode; 8]> {
        self.children.as_deref_mut()
    }

    /// Count nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .map_or(0, |c| c.iter().map(OctreeNode::node_count).sum())
    }

    /// Read the value at a local voxel coordinate.
    ///
    /// Coordinates must lie in `[0, 2^depth)`; this is not checked.
    pub fn get(&self, x: u32, y: u32, z: u32) -> VoxelValue {
        let mut node = self;
        while let Some(children) = &node.children {
            node = &children[child_index(x, y, z, node.depth)];
        }
        node.value
    }

    /// Write the value at a local voxel coordinate. Returns whether anything changed.
    ///
    /// Coordinates must lie in `[0, 2^depth)`; only debug builds check it.
    pub fn set(&mut self, x: u32, y: u32, z: u32, value: VoxelValue) -> bool {
        debug_assert!(x < 1 << self.depth && y < 1 << self.depth && z < 1 << self.depth);
        self.set_at(x, y, z, value)
    }

    /// Recursive step of `set`; coordinates stay relative to the top-level node
    fn set_at(&mut self, x: u32, y: u32, z: u32, value: VoxelValue) -> bool {
        if self.depth == 0 {
            let changed = self.value != value;
            self.value = value;
            return changed;
        }
        if self.children.is_none() && self.value == value {
            return false;
        }

        self.split();
        let index = child_index(x, y, z, self.depth);
        let changed = match self.children.as_deref_mut() {
            Some(children) => children[index].set_at(x, y, z, value),
            None => false,
        };
        if changed {
            self.compact();
        }
        changed
    }

    /// Bulk mutation: write `value` everywhere `classifier` includes.
    ///
    /// `origin` is the volume coordinate of this node's lowest voxel. Returns
    /// whether any voxel changed.
    pub fn apply<C>(&mut self, classifier: &C, origin: IVec3, value: VoxelValue) -> bool
    where
        C: RegionClassifier + ?Sized,
    {
        // Nothing to change whatever the shape says
        if self.children.is_none() && self.value == value {
            return false;
        }

        let size = self.size();
        match classifier.classify(origin, size) {
            RegionHint::Excluded => false,
            hint if hint.needs_subdivision() && self.depth > 0 => {
                let split = self.split();
                let half = size / 2;
                let mut changed = false;
                if let Some(children) = self.children.as_deref_mut() {
                    for (i, child) in children.iter_mut().enumerate() {
                        changed |= child.apply(classifier, origin + octant_offset(i) * half, value);
                    }
                }
                if changed || split {
                    self.compact();
                }
                changed
            }
            // Included, or Partial at voxel resolution
            _ => {
                self.children = None;
                self.value = value;
                true
            }
        }
    }

    /// Materialize 8 children carrying this node's value. Returns true if a split happened.
    fn split(&mut self) -> bool {
        if self.children.is_some() || self.depth == 0 {
            return false;
        }
        let child = OctreeNode::new(self.depth - 1, self.value);
        self.children = Some(Box::new(std::array::from_fn(|_| child.clone())));
        true
    }

    /// Collapse into a childless node if all 8 children are childless and equal.
    /// Returns true if the node collapsed.
    pub fn compact(&mut self) -> bool {
        let uniform = match self.children.as_deref() {
            Some(children) => {
                let first = children[0].value;
                children.iter().all(|c| c.children.is_none() && c.value == first).then_some(first)
            }
            None => None,
        };
        match uniform {
            Some(value) => {
                self.children = None;
                self.value = value;
                true
            }
            None => false,
        }
    }

    /// Find the node covering the cube of `2^depth` at local `origin`.
    ///
    /// Stops early at a childless ancestor, which then covers the cube uniformly.
    pub fn node_at(&self, origin: IVec3, depth: u8) -> &OctreeNode {
        let (x, y, z) = (origin.x as u32, origin.y as u32, origin.z as u32);
        let mut node = self;
        while node.depth > depth {
            match &node.children {
                Some(children) => node = &children[child_index(x, y, z, node.depth)],
                None => break,
            }
        }
        node
    }

    /// Emptiness shared by every voxel of `region`, or `None` if it is mixed.
    ///
    /// `origin` is this node's lowest voxel; `region` must be non-empty and
    /// inside the node. Only children overlapping the region are visited.
    pub fn region_emptiness(&self, origin: IVec3, region: &Aabb) -> Option<bool> {
        let Some(children) = &self.children else {
            return Some(!is_solid(self.value));
        };
        let bounds = Aabb::cube(origin, self.size());
        let mut shared = None;
        for (i, child) in children.iter().enumerate() {
            let octant = bounds.child_octant(i);
            if !octant.intersects(region) {
                continue;
            }
            let empty = child.region_emptiness(octant.min, region)?;
            match shared {
                None => shared = Some(empty),
                Some(prev) if prev != empty => return None,
                Some(_) => {}
            }
        }
        shared
    }

    /// Check the compaction invariant over the whole subtree
    pub fn is_compact(&self) -> bool {
        match self.children() {
            None => true,
            Some(children) => {
                let collapsible = children
                    .iter()
                    .all(|c| c.is_leaf() && c.value == children[0].value);
                !collapsible && children.iter().all(|c| c.depth + 1 == self.depth && c.is_compact())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_classifier(region: Aabb) -> impl Fn(IVec3, i32) -> RegionHint {
        move |origin: IVec3, size: i32| {
            let cube = Aabb::cube(origin, size);
            if region.contains(&cube) {
                RegionHint::Included
            } else if region.intersects(&cube) {
                RegionHint::Partial
            } else {
                RegionHint::Excluded
            }
        }
    }

    #[test]
    fn test_uniform_get() {
        let node = OctreeNode::new(3, 4);
        assert_eq!(node.get(0, 0, 0), 4);
        assert_eq!(node.get(7, 7, 7), 4);
        assert!(node.is_leaf());
    }

    #[test]
    fn test_set_get_roundtrip() {
        let mut node = OctreeNode::new(3, 0);
        assert!(node.set(1, 2, 3, 5));
        assert_eq!(node.get(1, 2, 3), 5);
        // Neighbours untouched
        assert_eq!(node.get(1, 2, 2), 0);
        assert_eq!(node.get(0, 2, 3), 0);
        assert!(node.is_compact());
    }

    #[test]
    fn test_set_get_high_coordinates() {
        // Every axis has bits set below the top level
        let mut node = OctreeNode::new(4, 0);
        let points = [(7, 6, 5), (15, 15, 15), (9, 14, 3), (8, 8, 8)];
        for (i, &(x, y, z)) in points.iter().enumerate() {
            assert!(node.set(x, y, z, i as u8 + 1));
        }
        for (i, &(x, y, z)) in points.iter().enumerate() {
            assert_eq!(node.get(x, y, z), i as u8 + 1, "at {x},{y},{z}");
        }
        assert_eq!(node.get(7, 6, 4), 0);
        assert_eq!(node.get(14, 15, 15), 0);
        assert!(node.is_compact());
    }

    #[test]
    fn test_set_same_value_is_noop() {
        let mut node = OctreeNode::new(3, 2);
        assert!(!node.set(4, 4, 4, 2));
        assert!(node.is_leaf());

        assert!(node.set(4, 4, 4, 1));
        assert!(!node.set(4, 4, 4, 1));
    }

    #[test]
    fn test_set_splits_lazily() {
        let mut node = OctreeNode::new(3, 0);
        node.set(0, 0, 0, 1);
        // One path of splits: 1 root + 3 levels of 8 children
        assert_eq!(node.node_count(), 1 + 8 * 3);
    }

    #[test]
    fn test_set_compacts_uniform_cube() {
        let mut node = OctreeNode::new(2, 0);
        for x in 0..2 {
            for y in 0..2 {
                for z in 0..2 {
                    node.set(x, y, z, 7);
                }
            }
        }
        // The low octant collapsed back into one child
        let children = node.children().unwrap();
        assert!(children[0].is_leaf());
        assert_eq!(children[0].value(), 7);

        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    node.set(x, y, z, 7);
                }
            }
        }
        assert!(node.is_leaf());
        assert_eq!(node.value(), 7);
        assert_eq!(node.node_count(), 1);
    }

    #[test]
    fn test_apply_excluded_is_noop() {
        let mut node = OctreeNode::new(3, 0);
        node.set(3, 3, 3, 2);
        let before = node.clone();

        let changed = node.apply(&|_: IVec3, _: i32| RegionHint::Excluded, IVec3::ZERO, 9);
        assert!(!changed);
        assert_eq!(node, before);
    }

    #[test]
    fn test_apply_included_snaps_root() {
        let mut node = OctreeNode::new(3, 0);
        node.set(3, 3, 3, 2);

        assert!(node.apply(&|_: IVec3, _: i32| RegionHint::Included, IVec3::ZERO, 1));
        assert!(node.is_leaf());
        assert_eq!(node.get(3, 3, 3), 1);

        // Already uniform at the target value
        assert!(!node.apply(&|_: IVec3, _: i32| RegionHint::Included, IVec3::ZERO, 1));
    }

    #[test]
    fn test_apply_box_region() {
        let mut node = OctreeNode::new(3, 0);
        let region = Aabb::new(IVec3::new(1, 0, 0), IVec3::new(5, 3, 8));
        assert!(node.apply(&cube_classifier(region), IVec3::ZERO, 3));

        for x in 0..8 {
            for y in 0..8 {
                for z in 0..8 {
                    let expected = if region.contains_point(IVec3::new(x, y, z)) { 3 } else { 0 };
                    assert_eq!(node.get(x as u32, y as u32, z as u32), expected, "at {x},{y},{z}");
                }
            }
        }
        assert!(node.is_compact());
    }

    #[test]
    fn test_apply_partial_without_change_stays_compact() {
        let mut node = OctreeNode::new(3, 0);
        // Partial at the root, but every voxel is excluded at depth 0
        let never = |_: IVec3, size: i32| if size > 1 { RegionHint::Partial } else { RegionHint::Excluded };
        assert!(!node.apply(&never, IVec3::ZERO, 1));
        assert!(node.is_leaf());
    }

    #[test]
    fn test_apply_carve_back_compacts() {
        let mut node = OctreeNode::new(3, 0);
        let region = Aabb::cube(IVec3::new(2, 2, 2), 3);
        node.apply(&cube_classifier(region), IVec3::ZERO, 1);
        assert!(!node.is_leaf());

        node.apply(&cube_classifier(region), IVec3::ZERO, 0);
        assert!(node.is_leaf());
        assert_eq!(node.value(), 0);
    }

    #[test]
    fn test_node_at() {
        let mut node = OctreeNode::new(3, 0);
        node.set(5, 5, 5, 1);

        let chunk = node.node_at(IVec3::splat(4), 2);
        assert_eq!(chunk.depth(), 2);
        assert!(!chunk.is_leaf());

        // Uniform region returns the childless ancestor
        let chunk = node.node_at(IVec3::ZERO, 1);
        assert_eq!(chunk.depth(), 2);
        assert!(chunk.is_leaf());
    }

    #[test]
    fn test_region_emptiness() {
        let mut node = OctreeNode::new(3, 0);
        node.set(5, 5, 5, 1);

        let slab = Aabb::new(IVec3::new(0, 0, 0), IVec3::new(8, 8, 1));
        assert_eq!(node.region_emptiness(IVec3::ZERO, &slab), Some(true));

        let around = Aabb::cube(IVec3::splat(4), 2);
        assert_eq!(node.region_emptiness(IVec3::ZERO, &around), None);

        let single = Aabb::cube(IVec3::splat(5), 1);
        assert_eq!(node.region_emptiness(IVec3::ZERO, &single), Some(false));
    }
}
