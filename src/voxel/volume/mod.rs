//! Editable voxel volume with an incrementally rebuilt chunk mesh cache.
//!
//! Edits go straight into the octree and conservatively invalidate every
//! cached chunk whose one-voxel-padded cube the edit's shape touches.
//! [`VoxelVolume::make_mesh`] rescans the surface topology and queues the
//! chunks that need geometry; [`VoxelVolume::gen_mesh`] builds a bounded
//! number of them, so rebuild cost can be spread across frames.

pub mod cache;
pub mod topology;

use rayon::prelude::*;

use crate::core::config::VolumeConfig;
use crate::core::error::Error;
use crate::core::types::{Axis, IVec3, Result, Vec3, VoxelValue, EMPTY};
use crate::math::ChunkKey;
use crate::mesh::{ChunkMesher, MeshSink};
use crate::voxel::brush::BrushPrimitive;
use crate::voxel::svo::{OctreeNode, RegionClassifier};

pub use cache::{BuiltChunk, ChunkCache, PendingChunk};
pub use topology::{BoundaryMask, ChunkCandidate};

/// Voxel volume owning its octree, its mesh cache and the renderer sink
pub struct VoxelVolume<S: MeshSink> {
    tree: OctreeNode,
    config: VolumeConfig,
    cache: ChunkCache<S::Handle>,
    sink: S,
}

impl<S: MeshSink> VoxelVolume<S> {
    /// Create a volume filled with `config.fill`.
    pub fn new(config: VolumeConfig, sink: S) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "Creating volume: size {}, chunk size {}",
            config.size(),
            config.chunk_size()
        );
        Ok(Self {
            tree: OctreeNode::new(config.depth, config.fill),
            config,
            cache: ChunkCache::new(),
            sink,
        })
    }

    /// Side length in voxels
    pub fn size(&self) -> i32 {
        self.tree.size()
    }

    pub fn config(&self) -> &VolumeConfig {
        &self.config
    }

    pub fn tree(&self) -> &OctreeNode {
        &self.tree
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn in_bounds(&self, p: IVec3) -> bool {
        p.cmpge(IVec3::ZERO).all() && p.cmplt(IVec3::splat(self.size())).all()
    }

    /// Read a voxel. Points outside the volume read as [`EMPTY`].
    pub fn get(&self, x: i32, y: i32, z: i32) -> VoxelValue {
        if !self.in_bounds(IVec3::new(x, y, z)) {
            return EMPTY;
        }
        self.tree.get(x as u32, y as u32, z as u32)
    }

    /// Write a voxel. Returns whether anything changed; points outside the
    /// volume are refused.
    pub fn set(&mut self, x: i32, y: i32, z: i32, value: VoxelValue) -> bool {
        let p = IVec3::new(x, y, z);
        if !self.in_bounds(p) {
            return false;
        }
        let changed = self.tree.set(x as u32, y as u32, z as u32, value);
        if changed {
            self.invalidate(&BrushPrimitive::voxel(p));
        }
        changed
    }

    /// Like [`set`](Self::set), but reports out-of-range points as an error.
    pub fn try_set(&mut self, x: i32, y: i32, z: i32, value: VoxelValue) -> Result<bool> {
        if !self.in_bounds(IVec3::new(x, y, z)) {
            return Err(Error::OutOfBounds { x, y, z, size: self.size() });
        }
        Ok(self.set(x, y, z, value))
    }

    /// Write `value` everywhere `classifier` includes. Returns whether the tree changed.
    pub fn apply<C>(&mut self, classifier: &C, value: VoxelValue) -> bool
    where
        C: RegionClassifier + ?Sized,
    {
        let changed = self.tree.apply(classifier, IVec3::ZERO, value);
        if changed {
            self.invalidate(classifier);
        }
        changed
    }

    /// Fill a ball. Any voxel the ball overlaps is written.
    pub fn sphere(&mut self, center: Vec3, radius: f32, value: VoxelValue) -> bool {
        self.apply(&BrushPrimitive::sphere(center, radius), value)
    }

    /// Fill the half-open box `[min, max)`.
    pub fn cuboid(&mut self, min: IVec3, max: IVec3, value: VoxelValue) -> bool {
        self.apply(&BrushPrimitive::aabb(min, max), value)
    }

    pub fn cube(&mut self, corner: IVec3, size: i32, value: VoxelValue) -> bool {
        self.apply(&BrushPrimitive::cube(corner, size), value)
    }

    /// Rotate the whole volume a quarter turn about `axis`.
    ///
    /// Every cached chunk is dropped.
    pub fn rotate90(&mut self, axis: Axis) {
        self.tree.rotate90(axis);
        let dropped = self.cache.clear(|h| self.sink.dispose(h));
        log::debug!("Rotated volume about {axis:?}, dropped {dropped} chunks");
    }

    fn invalidate<C>(&mut self, classifier: &C)
    where
        C: RegionClassifier + ?Sized,
    {
        let level = self.config.sub_mesh_level;
        self.cache.invalidate(classifier, level, |h| self.sink.dispose(h));
    }

    /// Key of the chunk containing voxel `p`
    pub fn chunk_key(&self, p: IVec3) -> ChunkKey {
        ChunkKey::from_origin(p, self.config.sub_mesh_level)
    }

    /// Scan the surface topology and queue every visible chunk that is not
    /// built yet. Returns the number of chunks queued.
    pub fn make_mesh(&mut self) -> usize {
        let level = self.config.sub_mesh_level;
        let candidates = topology::scan(&self.tree, level);
        let total = candidates.len();

        let mut queued = 0;
        for ChunkCandidate { origin, mask } in candidates {
            let key = ChunkKey::from_origin(origin, level);
            if self.cache.enqueue(key, PendingChunk { origin, mask }) {
                queued += 1;
            }
        }
        log::debug!(
            "Topology scan: {total} visible chunks, {queued} queued, {} pending",
            self.cache.pending_len()
        );
        queued
    }

    /// Build up to `limit` pending chunks (all of them for `None`), lowest
    /// keys first. Returns the number of chunks built.
    ///
    /// Every bundle is handed to the sink on the calling thread; with
    /// `meshing.parallel` the extraction itself runs on the rayon pool.
    pub fn gen_mesh(&mut self, limit: Option<usize>) -> usize {
        let taken = self.cache.take_pending(limit);
        if taken.is_empty() {
            return 0;
        }

        let level = self.config.sub_mesh_level;
        let mesher = ChunkMesher::new(&self.config.meshing);
        let tree = &self.tree;
        let build = |(key, chunk): &(ChunkKey, PendingChunk)| {
            (*key, chunk.origin, mesher.mesh_chunk(tree, chunk.origin, level, chunk.mask))
        };
        let meshed: Vec<_> = if self.config.meshing.parallel {
            taken.par_iter().map(&build).collect()
        } else {
            taken.iter().map(&build).collect()
        };

        let count = meshed.len();
        for (key, origin, bundles) in meshed {
            let handles: Vec<S::Handle> = bundles.iter().map(|b| self.sink.create(b, origin)).collect();
            log::trace!(
                "Built chunk at {origin}: {} bundles, {} vertices",
                handles.len(),
                bundles.iter().map(|b| b.vertex_count()).sum::<usize>()
            );
            self.cache.insert_built(key, BuiltChunk { origin, handles });
        }
        count
    }

    /// Every live mesh handle
    pub fn meshes(&self) -> impl Iterator<Item = &S::Handle> + '_ {
        self.cache.handles()
    }

    pub fn get_meshes(&self) -> Vec<&S::Handle> {
        self.meshes().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.cache.pending_len()
    }

    pub fn built_len(&self) -> usize {
        self.cache.built_len()
    }

    pub fn is_built(&self, key: ChunkKey) -> bool {
        self.cache.is_built(key)
    }

    pub fn is_pending(&self, key: ChunkKey) -> bool {
        self.cache.is_pending(key)
    }

    /// How many times the chunk was invalidated after being built
    pub fn generation(&self, key: ChunkKey) -> u32 {
        self.cache.generation(key)
    }

    pub fn cache(&self) -> &ChunkCache<S::Handle> {
        &self.cache
    }

    /// Dispose every mesh and reset the volume to a uniform `config.fill`.
    pub fn clear(&mut self) {
        self.dispose();
        self.tree = OctreeNode::new(self.config.depth, self.config.fill);
    }

    /// Dispose every mesh and forget all pending builds. The tree is kept.
    pub fn dispose(&mut self) {
        let dropped = self.cache.clear(|h| self.sink.dispose(h));
        if dropped > 0 {
            log::debug!("Disposed {dropped} chunks");
        }
    }
}

impl<S: MeshSink> Drop for VoxelVolume<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
