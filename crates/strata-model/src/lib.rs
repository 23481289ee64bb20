//! In-memory voxel model: voxel types, coordinate decomposition, chunks and
//! regions. Persistence and caching live in `strata-store`.

pub mod chunk;
pub mod coords;
pub mod limits;
pub mod region;
pub mod voxel;

pub use chunk::{Chunk, ChunkIter, PayloadError};
pub use coords::{
    BlockPos, CHUNK_LEN_BLOCKS, MODEL_HEIGHT_BLOCKS, REGION_LEN_BLOCKS, REGION_LEN_CHUNKS,
    chunk_index, global_block, local_block, local_chunk, region_index,
};
pub use region::{Region, RegionIter};
pub use voxel::{UnknownVoxelCode, VoxelType};
