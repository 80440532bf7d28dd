//! Core type aliases and shared small types

pub use glam::{IVec2, IVec3, UVec3, Vec3};

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Value stored per voxel. The structure gives it no meaning; by convention
/// 0 is air and positive values are solid kinds.
pub type VoxelValue = u8;

/// Air.
pub const EMPTY: VoxelValue = 0;

/// Deepest supported tree. Keeps every coordinate inside an `i32` and every
/// chunk coordinate inside a 21-bit Morton lane.
pub const MAX_DEPTH: u8 = 16;

/// Returns true for any non-air value
#[inline]
pub fn is_solid(value: VoxelValue) -> bool {
    value != EMPTY
}

/// World axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index (0, 1, 2)
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// First in-plane axis of a cross-section normal to `self`.
    #[inline]
    pub fn u(self) -> Axis {
        Self::ALL[(self.index() + 1) % 3]
    }

    /// Second in-plane axis. `u × v` points along `self`.
    #[inline]
    pub fn v(self) -> Axis {
        Self::ALL[(self.index() + 2) % 3]
    }

    /// Get unit vector for this axis
    pub fn to_ivec3(self) -> IVec3 {
        match self {
            Axis::X => IVec3::X,
            Axis::Y => IVec3::Y,
            Axis::Z => IVec3::Z,
        }
    }
}
