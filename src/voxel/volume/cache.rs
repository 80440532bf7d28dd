//! Per-chunk mesh cache with geometry-driven invalidation.

use std::collections::{BTreeMap, HashMap};

use super::topology::BoundaryMask;
use crate::core::types::IVec3;
use crate::math::ChunkKey;
use crate::voxel::svo::{Padded, RegionClassifier};

/// Deferred build of one chunk
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingChunk {
    /// Lowest voxel of the chunk
    pub origin: IVec3,
    /// Visible sides found by the topology scan
    pub mask: BoundaryMask,
}

/// Built chunk: renderer handles for its bundles (possibly none)
#[derive(Debug)]
pub struct BuiltChunk<H> {
    pub origin: IVec3,
    pub handles: Vec<H>,
}

/// Tracks which chunks are built and which await a build.
///
/// A key is never in both maps. Pending entries are ordered by key so
/// budgeted builds proceed deterministically along the Z-order curve.
#[derive(Debug)]
pub struct ChunkCache<H> {
    /// Chunks with live renderer handles
    built: HashMap<ChunkKey, BuiltChunk<H>>,
    /// Chunks waiting for `gen_mesh`
    pending: BTreeMap<ChunkKey, PendingChunk>,
    /// Generation counters, bumped each time a chunk is invalidated
    generations: HashMap<ChunkKey, u32>,
}

impl<H> ChunkCache<H> {
    /// Create a new cache with empty state.
    pub fn new() -> Self {
        Self {
            built: HashMap::new(),
            pending: BTreeMap::new(),
            generations: HashMap::new(),
        }
    }

    /// Queue a chunk for building. Returns false if it is already built or queued.
    pub fn enqueue(&mut self, key: ChunkKey, chunk: PendingChunk) -> bool {
        if self.built.contains_key(&key) || self.pending.contains_key(&key) {
            return false;
        }
        self.pending.insert(key, chunk);
        true
    }

    /// Take up to `limit` pending chunks (all of them for `None`), lowest keys first.
    pub fn take_pending(&mut self, limit: Option<usize>) -> Vec<(ChunkKey, PendingChunk)> {
        let count = limit.map_or(self.pending.len(), |n| n.min(self.pending.len()));
        let mut taken = Vec::with_capacity(count);
        for _ in 0..count {
            match self.pending.pop_first() {
                Some(entry) => taken.push(entry),
                None => break,
            }
        }
        taken
    }

    /// Record a finished build.
    pub fn insert_built(&mut self, key: ChunkKey, chunk: BuiltChunk<H>) {
        debug_assert!(!self.pending.contains_key(&key));
        let replaced = self.built.insert(key, chunk);
        debug_assert!(replaced.is_none(), "chunk {key:?} built twice");
    }

    /// Drop every chunk whose one-voxel-padded cube `classifier` touches.
    ///
    /// Built handles are passed to `dispose` exactly once each; pending
    /// builds are simply forgotten. Returns the number of chunks dropped.
    pub fn invalidate<C>(&mut self, classifier: &C, sub_mesh_level: u8, mut dispose: impl FnMut(H)) -> usize
    where
        C: RegionClassifier + ?Sized,
    {
        let size = 1 << sub_mesh_level;
        let padded = Padded::new(classifier, 1);

        let stale: Vec<ChunkKey> = self
            .built
            .iter()
            .filter(|(_, c)| padded.classify(c.origin, size).overlaps())
            .map(|(k, _)| *k)
            .collect();
        for key in &stale {
            if let Some(chunk) = self.built.remove(key) {
                chunk.handles.into_iter().for_each(&mut dispose);
            }
            self.bump(*key);
        }

        let before = self.pending.len();
        self.pending.retain(|_, c| !padded.classify(c.origin, size).overlaps());
        let dropped_pending = before - self.pending.len();

        if !stale.is_empty() || dropped_pending > 0 {
            log::debug!(
                "Invalidated {} built and {} pending chunks",
                stale.len(),
                dropped_pending
            );
        }
        stale.len() + dropped_pending
    }

    /// Drop everything, disposing every built handle exactly once.
    pub fn clear(&mut self, mut dispose: impl FnMut(H)) -> usize {
        let count = self.built.len() + self.pending.len();
        let keys: Vec<ChunkKey> = self.built.keys().copied().collect();
        for key in keys {
            self.bump(key);
        }
        for (_, chunk) in self.built.drain() {
            chunk.handles.into_iter().for_each(&mut dispose);
        }
        self.pending.clear();
        count
    }

    fn bump(&mut self, key: ChunkKey) {
        let generation = self.generations.entry(key).or_insert(0);
        *generation = generation.wrapping_add(1);
    }

    /// Get the invalidation counter for a chunk.
    ///
    /// Increments each time a built chunk is dropped; lets a renderer detect
    /// stale handles it cached elsewhere.
    pub fn generation(&self, key: ChunkKey) -> u32 {
        self.generations.get(&key).copied().unwrap_or(0)
    }

    pub fn is_built(&self, key: ChunkKey) -> bool {
        self.built.contains_key(&key)
    }

    pub fn is_pending(&self, key: ChunkKey) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn built_len(&self) -> usize {
        self.built.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn built_keys(&self) -> impl Iterator<Item = ChunkKey> + '_ {
        self.built.keys().copied()
    }

    /// All live renderer handles
    pub fn handles(&self) -> impl Iterator<Item = &H> + '_ {
        self.built.values().flat_map(|c| c.handles.iter())
    }
}

impl<H> Default for ChunkCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::brush::BrushPrimitive;

    fn pending(origin: IVec3) -> PendingChunk {
        PendingChunk { origin, mask: BoundaryMask::ALL }
    }

    fn key(origin: IVec3) -> ChunkKey {
        ChunkKey::from_origin(origin, 2)
    }

    fn built(cache: &mut ChunkCache<u32>, origin: IVec3, handles: Vec<u32>) {
        cache.insert_built(key(origin), BuiltChunk { origin, handles });
    }

    #[test]
    fn test_new() {
        let cache: ChunkCache<u32> = ChunkCache::new();
        assert_eq!(cache.built_len(), 0);
        assert_eq!(cache.pending_len(), 0);
        assert_eq!(cache.handles().count(), 0);
    }

    #[test]
    fn test_enqueue_skips_built_and_duplicates() {
        let mut cache: ChunkCache<u32> = ChunkCache::new();
        built(&mut cache, IVec3::ZERO, vec![1]);

        assert!(!cache.enqueue(key(IVec3::ZERO), pending(IVec3::ZERO)));
        assert!(cache.enqueue(key(IVec3::X * 4), pending(IVec3::X * 4)));
        assert!(!cache.enqueue(key(IVec3::X * 4), pending(IVec3::X * 4)));
        assert_eq!(cache.pending_len(), 1);
    }

    #[test]
    fn test_take_pending_respects_limit() {
        let mut cache: ChunkCache<u32> = ChunkCache::new();
        for x in 0..5 {
            let origin = IVec3::new(x * 4, 0, 0);
            cache.enqueue(key(origin), pending(origin));
        }

        assert_eq!(cache.take_pending(Some(2)).len(), 2);
        assert_eq!(cache.pending_len(), 3);
        assert_eq!(cache.take_pending(Some(0)).len(), 0);
        assert_eq!(cache.take_pending(None).len(), 3);
        assert_eq!(cache.pending_len(), 0);
    }

    #[test]
    fn test_take_pending_in_key_order() {
        let mut cache: ChunkCache<u32> = ChunkCache::new();
        for origin in [IVec3::splat(4), IVec3::ZERO, IVec3::new(4, 0, 0)] {
            cache.enqueue(key(origin), pending(origin));
        }
        let keys: Vec<ChunkKey> = cache.take_pending(None).into_iter().map(|(k, _)| k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_invalidate_disposes_overlapping_once() {
        let mut cache: ChunkCache<u32> = ChunkCache::new();
        built(&mut cache, IVec3::ZERO, vec![10, 11]);
        built(&mut cache, IVec3::new(4, 0, 0), vec![20]);
        built(&mut cache, IVec3::new(12, 12, 12), vec![30]);
        cache.enqueue(key(IVec3::new(0, 4, 0)), pending(IVec3::new(0, 4, 0)));

        let mut disposed = Vec::new();
        // Voxel (4, 1, 1): inside chunk x=4, in the padding of chunk x=0 and y=4
        let n = cache.invalidate(&BrushPrimitive::voxel(IVec3::new(4, 1, 1)), 2, |h| disposed.push(h));
        disposed.sort();

        assert_eq!(n, 2);
        assert_eq!(disposed, vec![10, 11, 20]);
        assert!(!cache.is_built(key(IVec3::ZERO)));
        assert!(cache.is_built(key(IVec3::new(12, 12, 12))));
        // Chunk (0, 4, 0) pads to y >= 3; voxel y = 1 is out of reach
        assert!(cache.is_pending(key(IVec3::new(0, 4, 0))));
        assert_eq!(cache.generation(key(IVec3::ZERO)), 1);
        assert_eq!(cache.generation(key(IVec3::new(12, 12, 12))), 0);
    }

    #[test]
    fn test_invalidate_drops_pending() {
        let mut cache: ChunkCache<u32> = ChunkCache::new();
        cache.enqueue(key(IVec3::ZERO), pending(IVec3::ZERO));
        let n = cache.invalidate(&BrushPrimitive::voxel(IVec3::ONE), 2, |_| panic!("nothing built"));
        assert_eq!(n, 1);
        assert_eq!(cache.pending_len(), 0);
    }

    #[test]
    fn test_clear_disposes_everything() {
        let mut cache: ChunkCache<u32> = ChunkCache::new();
        built(&mut cache, IVec3::ZERO, vec![1, 2]);
        built(&mut cache, IVec3::new(4, 0, 0), vec![]);
        cache.enqueue(key(IVec3::splat(4)), pending(IVec3::splat(4)));

        let mut disposed = Vec::new();
        assert_eq!(cache.clear(|h| disposed.push(h)), 3);
        disposed.sort();
        assert_eq!(disposed, vec![1, 2]);
        assert_eq!(cache.built_len() + cache.pending_len(), 0);
        assert_eq!(cache.generation(key(IVec3::ZERO)), 1);
    }
}
