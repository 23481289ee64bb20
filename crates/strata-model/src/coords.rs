//! Decomposition of global block coordinates into the region/chunk grid.
//!
//! A horizontal coordinate splits into (region index, chunk-local-to-region
//! index, block-local-to-chunk index) and recomposes losslessly. All of the
//! division here rounds toward negative infinity (`div_euclid`): truncating
//! division would misplace every negative coordinate, e.g. global block -1
//! belongs to chunk -1 at local offset 15, not to chunk 0.

use serde::{Deserialize, Serialize};

/// Side length of a chunk, in blocks.
pub const CHUNK_LEN_BLOCKS: i32 = 16;

/// Side length of a region, in chunks.
pub const REGION_LEN_CHUNKS: i32 = 32;

/// Side length of a region, in blocks.
pub const REGION_LEN_BLOCKS: i32 = REGION_LEN_CHUNKS * CHUNK_LEN_BLOCKS;

/// Vertical extent of the model, in blocks. Unlike x and z this is a hard
/// limit: y is always in `0..MODEL_HEIGHT_BLOCKS`.
pub const MODEL_HEIGHT_BLOCKS: i32 = 256;

/// Global index of the chunk containing a global block coordinate.
pub fn chunk_index(global_block: i32) -> i32 {
    global_block.div_euclid(CHUNK_LEN_BLOCKS)
}

/// Index of the region containing a global block coordinate.
pub fn region_index(global_block: i32) -> i32 {
    chunk_index(global_block).div_euclid(REGION_LEN_CHUNKS)
}

/// Chunk index within its region, always in `0..REGION_LEN_CHUNKS`.
pub fn local_chunk(global_block: i32) -> i32 {
    chunk_index(global_block).rem_euclid(REGION_LEN_CHUNKS)
}

/// Block index within its chunk, always in `0..CHUNK_LEN_BLOCKS`.
pub fn local_block(global_block: i32) -> i32 {
    global_block.rem_euclid(CHUNK_LEN_BLOCKS)
}

/// Recomposes a global block coordinate from its decomposition.
///
/// Inverse of [`region_index`] / [`local_chunk`] / [`local_block`] for every
/// representable `i32`, including `i32::MIN` and `i32::MAX`.
pub fn global_block(region: i32, local_chunk: i32, local_block: i32) -> i32 {
    (region * REGION_LEN_CHUNKS + local_chunk) * CHUNK_LEN_BLOCKS + local_block
}

/// Position of one block in the global model grid.
///
/// Axis orientation: x increases towards East, y towards the sky, z towards
/// South. One unit is one block side. The position names the lowest corner
/// of the block on all three axes, so a block at (5, 20, 10) spans
/// x 5..6, y 20..21, z 10..11.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}
