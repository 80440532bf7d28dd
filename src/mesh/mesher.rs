//! Greedy, smoothed quad extraction for one mesh chunk.
//!
//! For each axis the mesher sweeps the chunk plane by plane, keeping two
//! padded cross-sections: the layer behind the plane and the layer ahead of
//! it. A cell has a face on the plane exactly when one of the two layers is
//! solid there. Faces along a row are merged greedily into strips while they
//! share orientation and material and their smoothed edges stay straight.

use crate::core::config::MeshingConfig;
use crate::core::types::{is_solid, Axis, IVec2, IVec3, Vec3, VoxelValue, EMPTY};
use crate::voxel::svo::OctreeNode;
use crate::voxel::volume::topology::BoundaryMask;

use super::attributes::MeshAttributes;
use super::smoothing::corner_offset;

/// Minimum cosine between run edges for two faces to merge
const MERGE_COSINE: f32 = 0.99;

/// Builds attribute bundles for mesh chunks
pub struct ChunkMesher<'a> {
    config: &'a MeshingConfig,
}

/// Splits output into bundles according to the bundle policy
struct BundleWriter {
    done: Vec<MeshAttributes>,
    current: MeshAttributes,
    max_vertices: usize,
}

impl BundleWriter {
    fn new(max_vertices: usize) -> Self {
        Self {
            done: Vec::new(),
            current: MeshAttributes::new(),
            max_vertices,
        }
    }

    /// Push a quad, closing the current bundle first if it would overflow.
    /// The returned base always refers to `current`.
    fn push_quad(&mut self, corners: [Vec3; 4], material: u8, flip: bool) -> usize {
        if self.current.vertex_count() + 4 > self.max_vertices && !self.current.is_empty() {
            self.done.push(std::mem::take(&mut self.current));
        }
        self.current.push_quad(corners, material, flip)
    }

    fn finish(mut self) -> Vec<MeshAttributes> {
        if !self.current.is_empty() {
            self.done.push(self.current);
        }
        self.done
    }
}

/// The quad that the next face on the row may extend
#[derive(Clone, Copy)]
struct Run {
    diff: i32,
    base: usize,
}

impl<'a> ChunkMesher<'a> {
    pub fn new(config: &'a MeshingConfig) -> Self {
        Self { config }
    }

    /// Mesh the chunk of side `2^level` at `origin`.
    ///
    /// `root` is the whole volume; the chunk's own subtree is looked up to
    /// decide whether it is uniform. Positions are relative to `origin`.
    pub fn mesh_chunk(
        &self,
        root: &OctreeNode,
        origin: IVec3,
        level: u8,
        mask: BoundaryMask,
    ) -> Vec<MeshAttributes> {
        let n = 1usize << level;
        let stride = n + 2;
        let uniform = root.node_at(origin, level).is_leaf();
        let owned = mask.intersection(BoundaryMask::owned(origin));

        let mut writer = BundleWriter::new(self.config.bundle_policy.max_vertices());
        let mut prev = vec![EMPTY; stride * stride];
        let mut next = vec![EMPTY; stride * stride];

        for axis in Axis::ALL {
            // Shell-only: a uniform chunk has no interior faces
            if uniform && !owned.has_axis(axis) {
                continue;
            }
            let a = axis.index();
            let k_lo = if origin[a] == 0 { 0 } else { 1 };

            sample_layer(root, &mut prev, origin, n, axis, k_lo - 1);
            for k in k_lo..=n as i32 {
                sample_layer(root, &mut next, origin, n, axis, k);
                self.emit_plane(&mut writer, &prev, &next, n, axis, k);
                std::mem::swap(&mut prev, &mut next);
            }
        }

        let bundles = writer.finish();
        if bundles.len() > 1 {
            log::warn!(
                "Chunk at {origin} split into {} bundles ({:?})",
                bundles.len(),
                self.config.bundle_policy
            );
        }
        bundles
    }

    /// Emit the faces of plane `k` between layers `k - 1` (`prev`) and `k` (`next`).
    fn emit_plane(
        &self,
        writer: &mut BundleWriter,
        prev: &[VoxelValue],
        next: &[VoxelValue],
        n: usize,
        axis: Axis,
        k: i32,
    ) {
        let stride = n + 2;
        let table = &self.config.smoothing;
        let corner = |u: usize, v: usize| {
            let mut p = Vec3::ZERO;
            p[axis.index()] = k as f32 + corner_offset(table, prev, next, stride, u, v);
            p[axis.u().index()] = u as f32;
            p[axis.v().index()] = v as f32;
            p
        };

        for v in 0..n {
            let mut run: Option<Run> = None;
            for u in 0..n {
                let cell = (v + 1) * stride + u + 1;
                let (behind, ahead) = (prev[cell], next[cell]);
                if is_solid(behind) == is_solid(ahead) {
                    run = None;
                    continue;
                }

                // Positive: solid ahead, so the face looks back toward -axis
                let diff = ahead as i32 - behind as i32;
                let quad = [corner(u, v), corner(u + 1, v), corner(u + 1, v + 1), corner(u, v + 1)];

                if let Some(r) = run.filter(|r| r.diff == diff) {
                    if extends(&writer.current, r.base, &quad) {
                        writer.current.set_corner(r.base, 1, quad[1]);
                        writer.current.set_corner(r.base, 2, quad[2]);
                        continue;
                    }
                }

                let base = writer.push_quad(quad, diff.unsigned_abs() as u8, diff > 0);
                run = Some(Run { diff, base });
            }
        }
    }
}

/// True if `quad` continues the strip ending at the quad at `base`: both run
/// edges (bottom and top) keep their direction.
fn extends(mesh: &MeshAttributes, base: usize, quad: &[Vec3; 4]) -> bool {
    let bottom = mesh.corner(base, 1) - mesh.corner(base, 0);
    let top = mesh.corner(base, 2) - mesh.corner(base, 3);
    cosine(bottom, quad[1] - quad[0]) > MERGE_COSINE && cosine(top, quad[2] - quad[3]) > MERGE_COSINE
}

fn cosine(a: Vec3, b: Vec3) -> f32 {
    let denom = a.length() * b.length();
    if denom == 0.0 {
        return 0.0;
    }
    a.dot(b) / denom
}

/// Fill `buf` with the padded cross-section of chunk layer `layer` along
/// `axis`. Everything outside the volume reads as air.
fn sample_layer(root: &OctreeNode, buf: &mut [VoxelValue], origin: IVec3, n: usize, axis: Axis, layer: i32) {
    buf.fill(EMPTY);
    let stride = n + 2;
    let plane = origin[axis.index()] + layer;
    let min = IVec2::new(origin[axis.u().index()], origin[axis.v().index()]) - IVec2::ONE;
    root.slice2(buf, stride, plane, axis, min, IVec2::splat(stride as i32));
}
