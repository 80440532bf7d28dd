use crate::core::types::{IVec3, Vec3};
use crate::math::Aabb;
use crate::voxel::svo::{RegionClassifier, RegionHint};

/// Carving shapes, in volume coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrushPrimitive {
    /// Ball of `radius` around `center`
    Sphere { center: Vec3, radius: f32 },
    /// Half-open voxel box `[min, max)`
    Box { min: IVec3, max: IVec3 },
}

impl BrushPrimitive {
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        BrushPrimitive::Sphere { center, radius }
    }

    pub fn aabb(min: IVec3, max: IVec3) -> Self {
        BrushPrimitive::Box { min, max }
    }

    /// Axis-aligned cube with its lowest voxel at `corner`
    pub fn cube(corner: IVec3, size: i32) -> Self {
        BrushPrimitive::Box { min: corner, max: corner + IVec3::splat(size) }
    }

    /// A single voxel
    pub fn voxel(p: IVec3) -> Self {
        Self::cube(p, 1)
    }

    /// Conservative voxel bounds of everything the shape can touch
    pub fn bounds(&self) -> Aabb {
        match *self {
            BrushPrimitive::Sphere { center, radius } => Aabb::new(
                (center - Vec3::splat(radius)).floor().as_ivec3(),
                (center + Vec3::splat(radius)).ceil().as_ivec3() + IVec3::ONE,
            ),
            BrushPrimitive::Box { min, max } => Aabb::new(min, max),
        }
    }
}

impl RegionClassifier for BrushPrimitive {
    fn classify(&self, origin: IVec3, size: i32) -> RegionHint {
        let cube = Aabb::cube(origin, size);
        match *self {
            BrushPrimitive::Sphere { center, radius } => {
                // A non-positive radius covers nothing
                if radius <= 0.0 || cube.closest_point(center).distance_squared(center) >= radius * radius {
                    return RegionHint::Excluded;
                }
                let r2 = radius * radius;
                if cube.corners().iter().all(|c| c.distance_squared(center) <= r2) {
                    RegionHint::Included
                } else {
                    // Voxel-sized partials are snapped by the octree
                    RegionHint::Partial
                }
            }
            BrushPrimitive::Box { min, max } => {
                let region = Aabb::new(min, max);
                if region.is_empty() || !region.intersects(&cube) {
                    RegionHint::Excluded
                } else if region.contains(&cube) {
                    RegionHint::Included
                } else {
                    RegionHint::Partial
                }
            }
        }
    }
}
