//! The closed set of voxel types a model cell can hold.
//!
//! Every type is bound to a byte code in a contiguous range starting at 0,
//! so a chunk can store one voxel per byte and reverse the mapping with a
//! plain array index. `None` is code 0: zero-initialized chunk memory
//! represents unset space.

use serde::{Deserialize, Serialize};

/// One voxel type per model cell, stored on disk as its byte code.
///
/// `None` marks a cell that was never written; `Air` is an explicit
/// "nothing here" written by a producer (e.g. carving a tunnel).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoxelType {
    /// Unset cell; the value every chunk starts with.
    #[default]
    None = 0,
    Stone = 1,
    Soil = 2,
    Water = 3,
    Wood = 4,
    SoilWithGrass = 5,
    Sand = 6,
    Gravel = 7,
    Glass = 8,
    Air = 9,
    UnbreakableStone = 10,
}

/// A byte read from a region payload that maps to no [`VoxelType`].
#[derive(Debug, thiserror::Error)]
#[error("unknown voxel code: {0}")]
pub struct UnknownVoxelCode(pub u8);

/// Dense reverse-lookup table, indexed directly by byte code.
const VOXEL_TYPES: [VoxelType; VoxelType::COUNT] = [
    VoxelType::None,
    VoxelType::Stone,
    VoxelType::Soil,
    VoxelType::Water,
    VoxelType::Wood,
    VoxelType::SoilWithGrass,
    VoxelType::Sand,
    VoxelType::Gravel,
    VoxelType::Glass,
    VoxelType::Air,
    VoxelType::UnbreakableStone,
];

impl VoxelType {
    /// Number of voxel types; codes occupy `0..COUNT` with no gaps.
    pub const COUNT: usize = 11;

    /// The byte code this type is stored as.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Reverse lookup from a byte code.
    pub fn from_code(code: u8) -> Result<Self, UnknownVoxelCode> {
        VOXEL_TYPES
            .get(code as usize)
            .copied()
            .ok_or(UnknownVoxelCode(code))
    }

    /// All voxel types in code order.
    pub fn all() -> &'static [VoxelType] {
        &VOXEL_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_contiguous_from_zero() {
        // The on-disk format relies on codes having no gaps between the
        // minimum and maximum value.
        for (index, voxel) in VoxelType::all().iter().enumerate() {
            assert_eq!(voxel.code() as usize, index);
        }
        assert_eq!(VoxelType::all().len(), VoxelType::COUNT);
    }

    #[test]
    fn test_reverse_lookup_round_trips() {
        for &voxel in VoxelType::all() {
            assert_eq!(VoxelType::from_code(voxel.code()).unwrap(), voxel);
        }
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        assert!(VoxelType::from_code(VoxelType::COUNT as u8).is_err());
        assert!(VoxelType::from_code(u8::MAX).is_err());
    }

    #[test]
    fn test_default_is_none() {
        assert_eq!(VoxelType::default(), VoxelType::None);
        assert_eq!(VoxelType::None.code(), 0);
    }
}
