//! Integer axis-aligned bounding box

use crate::core::types::{IVec3, Vec3};

/// Half-open voxel box `[min, max)` in volume coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aabb {
    pub min: IVec3,
    pub max: IVec3,
}

impl Aabb {
    /// Create AABB from min and (exclusive) max corners
    pub fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    /// Cube of side `size` with its lowest corner at `origin`
    pub fn cube(origin: IVec3, size: i32) -> Self {
        Self {
            min: origin,
            max: origin + IVec3::splat(size),
        }
    }

    /// Get size (max - min)
    pub fn size(&self) -> IVec3 {
        self.max - self.min
    }

    /// True if the box holds no voxels
    pub fn is_empty(&self) -> bool {
        self.max.cmple(self.min).any()
    }

    /// Grow by `amount` voxels on every side
    pub fn padded(&self, amount: i32) -> Aabb {
        Aabb {
            min: self.min - IVec3::splat(amount),
            max: self.max + IVec3::splat(amount),
        }
    }

    /// Check if voxel is inside AABB
    pub fn contains_point(&self, p: IVec3) -> bool {
        p.cmpge(self.min).all() && p.cmplt(self.max).all()
    }

    /// Check if `other` lies entirely inside this box
    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.cmpge(self.min).all() && other.max.cmple(self.max).all()
    }

    /// Check if two AABBs share at least one voxel
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmplt(other.max).all() && other.min.cmplt(self.max).all()
    }

    /// Overlap of two boxes (may be empty)
    pub fn intersection(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    /// Point of the closed continuous box nearest to `p`
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min.as_vec3(), self.max.as_vec3())
    }

    /// The 8 corners of the closed continuous box, indexed like octants
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min.as_vec3(), self.max.as_vec3());
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 != 0 { hi.x } else { lo.x },
                if i & 2 != 0 { hi.y } else { lo.y },
                if i & 4 != 0 { hi.z } else { lo.z },
            )
        })
    }

    /// Get child octant for octree subdivision of a cubic box
    /// index: 0-7 representing xyz octant (bit 0=x, bit 1=y, bit 2=z)
    pub fn child_octant(&self, index: usize) -> Aabb {
        let half = self.size() / 2;
        let min = self.min + octant_offset(index) * half;
        Aabb { min, max: min + half }
    }
}

/// Unit offset (0 or 1 per axis) of octant `index`
#[inline]
pub fn octant_offset(index: usize) -> IVec3 {
    IVec3::new((index & 1) as i32, ((index >> 1) & 1) as i32, ((index >> 2) & 1) as i32)
}
