//! Model size constants and the nominal world extent.

use static_assertions::const_assert_eq;

use crate::coords::{
    BlockPos, CHUNK_LEN_BLOCKS, MODEL_HEIGHT_BLOCKS, REGION_LEN_CHUNKS,
};

/// Blocks in one chunk (16 × 16 × 256).
pub const CHUNK_SIZE_BLOCKS: usize =
    (CHUNK_LEN_BLOCKS * CHUNK_LEN_BLOCKS * MODEL_HEIGHT_BLOCKS) as usize;

/// Chunks in one region (32 × 32).
pub const REGION_SIZE_CHUNKS: usize = (REGION_LEN_CHUNKS * REGION_LEN_CHUNKS) as usize;

/// Blocks in one region.
pub const REGION_SIZE_BLOCKS: usize = REGION_SIZE_CHUNKS * CHUNK_SIZE_BLOCKS;

/// Bytes one block occupies on disk. Valid only while a voxel is one byte.
pub const DISK_BLOCK_SIZE_BYTES: usize = 1;

/// Uncompressed bytes of one serialized chunk.
pub const DISK_CHUNK_SIZE_BYTES: usize = CHUNK_SIZE_BLOCKS * DISK_BLOCK_SIZE_BYTES;

/// Uncompressed bytes of one serialized region. Exactly 64 MiB; this is a
/// correctness check on the grid geometry, not a tunable.
pub const DISK_REGION_SIZE_BYTES: usize = REGION_SIZE_CHUNKS * DISK_CHUNK_SIZE_BYTES;

/// Approximate resident memory of one region, used as the cache line size.
pub const DISK_REGION_SIZE_MB: usize = DISK_REGION_SIZE_BYTES / 1024 / 1024;

/// Default budget for resident regions.
pub const DEFAULT_MAX_CACHE_SIZE_MB: usize = 1024;

const_assert_eq!(DISK_REGION_SIZE_BYTES, 64 * 1024 * 1024);
const_assert_eq!(DISK_REGION_SIZE_MB, 64);

// Circumference of Earth is 40 075 017 m around the equator (x) and
// 40 007 863 m around the poles (z). Centering the model splits each range
// evenly between positive and negative coordinates.

/// Western, bottom and Northern model border (all sides inclusive).
pub const MIN_BLOCK_POS: BlockPos = BlockPos {
    x: -20_037_508,
    y: 0,
    z: -20_003_931,
};

/// Eastern, top and Southern model border (all sides inclusive).
pub const MAX_BLOCK_POS: BlockPos = BlockPos {
    x: 20_037_508,
    y: MODEL_HEIGHT_BLOCKS - 1,
    z: 20_003_931,
};

impl BlockPos {
    /// Whether the position lies within the nominal world extent.
    ///
    /// x and z are soft limits: a store will warn about positions outside
    /// them but still accept the write. y is a hard limit enforced by the
    /// chunk grid itself.
    pub fn is_within_limits(&self) -> bool {
        (MIN_BLOCK_POS.x..=MAX_BLOCK_POS.x).contains(&self.x)
            && (MIN_BLOCK_POS.y..=MAX_BLOCK_POS.y).contains(&self.y)
            && (MIN_BLOCK_POS.z..=MAX_BLOCK_POS.z).contains(&self.z)
    }
}
