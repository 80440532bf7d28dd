//! Region classification driving bulk octree mutation.
//!
//! A classifier answers one question about an axis-aligned voxel cube: is it
//! entirely outside the target shape, entirely inside, or straddling its
//! boundary. The octree uses the answer to snap whole subtrees at once, so a
//! carve costs roughly the shape's surface area rather than its volume.

use crate::core::types::IVec3;

/// Classification of a cubic region against a target shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionHint {
    /// Region is entirely outside - leave it alone
    Excluded,
    /// Region is entirely inside - snap it to the new value
    Included,
    /// Region is partially inside - must subdivide further
    Partial,
}

impl RegionHint {
    /// Returns true if the region is touched at all
    pub fn overlaps(&self) -> bool {
        !matches!(self, RegionHint::Excluded)
    }

    /// Returns true if this region needs subdivision
    pub fn needs_subdivision(&self) -> bool {
        matches!(self, RegionHint::Partial)
    }
}

/// Trait for cubic region classification.
///
/// `classify(origin, size)` is asked about the cube `[origin, origin + size)`
/// on each axis. Implementations must be monotone: if a cube is `Included`,
/// every sub-cube must be `Included` as well, and likewise for `Excluded`.
/// Octree compaction relies on it.
pub trait RegionClassifier {
    fn classify(&self, origin: IVec3, size: i32) -> RegionHint;
}

impl<F> RegionClassifier for F
where
    F: Fn(IVec3, i32) -> RegionHint,
{
    fn classify(&self, origin: IVec3, size: i32) -> RegionHint {
        self(origin, size)
    }
}

/// Classifier that dilates every queried cube by `pad` voxels before asking
/// `inner`. Used to find mesh chunks whose surface may read a changed voxel.
pub struct Padded<'a, C: RegionClassifier + ?Sized> {
    inner: &'a C,
    pad: i32,
}

impl<'a, C: RegionClassifier + ?Sized> Padded<'a, C> {
    pub fn new(inner: &'a C, pad: i32) -> Self {
        Self { inner, pad }
    }
}

impl<C: RegionClassifier + ?Sized> RegionClassifier for Padded<'_, C> {
    fn classify(&self, origin: IVec3, size: i32) -> RegionHint {
        self.inner.classify(origin - IVec3::splat(self.pad), size + 2 * self.pad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_voxel(p: IVec3) -> impl Fn(IVec3, i32) -> RegionHint {
        move |origin: IVec3, size: i32| {
            let inside = p.cmpge(origin).all() && p.cmplt(origin + IVec3::splat(size)).all();
            match (inside, size) {
                (false, _) => RegionHint::Excluded,
                (true, 1) => RegionHint::Included,
                (true, _) => RegionHint::Partial,
            }
        }
    }

    #[test]
    fn test_closure_is_classifier() {
        let c = single_voxel(IVec3::new(3, 3, 3));
        assert_eq!(c.classify(IVec3::ZERO, 8), RegionHint::Partial);
        assert_eq!(c.classify(IVec3::splat(3), 1), RegionHint::Included);
        assert_eq!(c.classify(IVec3::ZERO, 2), RegionHint::Excluded);
    }

    #[test]
    fn test_padding_reaches_neighbours() {
        let c = single_voxel(IVec3::new(4, 0, 0));
        // Cube [0,4) does not contain x=4, but its one-voxel dilation does
        assert_eq!(c.classify(IVec3::ZERO, 4), RegionHint::Excluded);
        assert!(Padded::new(&c, 1).classify(IVec3::ZERO, 4).overlaps());
        assert!(!Padded::new(&c, 1).classify(IVec3::new(8, 0, 0), 4).overlaps());
    }

    #[test]
    fn test_hint_predicates() {
        assert!(RegionHint::Partial.needs_subdivision());
        assert!(!RegionHint::Included.needs_subdivision());
        assert!(RegionHint::Included.overlaps());
        assert!(!RegionHint::Excluded.overlaps());
    }
}
