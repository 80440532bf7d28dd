//! Morton encoding (Z-order curve) for chunk keys

use crate::core::types::IVec3;

/// Spread bits of a 21-bit integer into every third bit of a 64-bit integer
fn spread_bits(x: u32) -> u64 {
    let mut x = x as u64 & 0x1fffff;
    x = (x | (x << 32)) & 0x1f00000000ffff;
    x = (x | (x << 16)) & 0x1f0000ff0000ff;
    x = (x | (x << 8)) & 0x100f00f00f00f00f;
    x = (x | (x << 4)) & 0x10c30c30c30c30c3;
    x = (x | (x << 2)) & 0x1249249249249249;
    x
}

/// Compact every third bit of a 64-bit integer into a 21-bit integer
fn compact_bits(x: u64) -> u32 {
    let mut x = x & 0x1249249249249249;
    x = (x | (x >> 2)) & 0x10c30c30c30c30c3;
    x = (x | (x >> 4)) & 0x100f00f00f00f00f;
    x = (x | (x >> 8)) & 0x1f0000ff0000ff;
    x = (x | (x >> 16)) & 0x1f00000000ffff;
    x = (x | (x >> 32)) & 0x1fffff;
    x as u32
}

/// Linearized chunk coordinate.
///
/// Chunk coordinates are voxel coordinates divided by the chunk size, so they
/// are non-negative and fit the 21-bit lanes for any supported depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkKey(pub u64);

impl ChunkKey {
    /// Key of the chunk at chunk coordinate `coord`
    pub fn from_coord(coord: IVec3) -> Self {
        debug_assert!(coord.cmpge(IVec3::ZERO).all(), "negative chunk coordinate {coord}");
        Self(spread_bits(coord.x as u32) | (spread_bits(coord.y as u32) << 1) | (spread_bits(coord.z as u32) << 2))
    }

    /// Key of the chunk whose lowest voxel is `origin`
    pub fn from_origin(origin: IVec3, sub_mesh_level: u8) -> Self {
        Self::from_coord(origin >> (sub_mesh_level as i32))
    }

    /// Chunk coordinate
    pub fn coord(self) -> IVec3 {
        IVec3::new(
            compact_bits(self.0) as i32,
            compact_bits(self.0 >> 1) as i32,
            compact_bits(self.0 >> 2) as i32,
        )
    }

    /// Lowest voxel of the chunk
    pub fn origin(self, sub_mesh_level: u8) -> IVec3 {
        self.coord() << (sub_mesh_level as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for c in [0, 1, 10, 1000, 65535] {
            let coord = IVec3::new(c, 65535 - c, c / 2);
            assert_eq!(ChunkKey::from_coord(coord).coord(), coord, "Failed for {coord}");
        }
    }

    #[test]
    fn test_ordering() {
        // Morton codes should interleave bits
        assert_eq!(ChunkKey::from_coord(IVec3::ZERO).0, 0);
        assert_eq!(ChunkKey::from_coord(IVec3::X).0, 1);
        assert_eq!(ChunkKey::from_coord(IVec3::Y).0, 2);
        assert_eq!(ChunkKey::from_coord(IVec3::Z).0, 4);
        assert_eq!(ChunkKey::from_coord(IVec3::ONE).0, 7);
    }

    #[test]
    fn test_origin_uses_chunk_size() {
        let key = ChunkKey::from_origin(IVec3::new(16, 0, 48), 4);
        assert_eq!(key.coord(), IVec3::new(1, 0, 3));
        assert_eq!(key.origin(4), IVec3::new(16, 0, 48));
    }
}
