//! A 32 × 32 grid of chunks: the unit of disk persistence and cache
//! residency.

use std::io::{Read, Write};
use std::time::Instant;

use crate::chunk::{Chunk, ChunkIter, PayloadError};
use crate::coords::{BlockPos, CHUNK_LEN_BLOCKS, REGION_LEN_CHUNKS, local_block, local_chunk};
use crate::limits::REGION_SIZE_CHUNKS;
use crate::voxel::VoxelType;

/// A horizontally square 512 × 512 × 256 portion of the model.
///
/// The region addresses cells by *global* position and derives the
/// chunk-local indices itself, so callers never translate coordinates.
/// It tracks when it was last touched (for cache eviction ordering) and
/// whether its contents diverged from the last persisted state.
pub struct Region {
    /// Chunks in `chunk_x * 32 + chunk_z` order, matching the disk layout.
    chunks: Vec<Chunk>,
    last_access: Instant,
    dirty: bool,
}

impl Region {
    /// Creates a region with every cell set to [`VoxelType::None`].
    ///
    /// A fresh region is clean: it matches a never-persisted file.
    pub fn new() -> Self {
        Self {
            chunks: (0..REGION_SIZE_CHUNKS).map(|_| Chunk::new()).collect(),
            last_access: Instant::now(),
            dirty: false,
        }
    }

    fn chunk_slot(pos: BlockPos) -> usize {
        (local_chunk(pos.x) * REGION_LEN_CHUNKS + local_chunk(pos.z)) as usize
    }

    /// Returns the voxel at `pos` and refreshes the access time.
    ///
    /// Panics if `pos.y` is outside `0..256`.
    pub fn get(&mut self, pos: BlockPos) -> VoxelType {
        self.last_access = Instant::now();
        self.chunks[Self::chunk_slot(pos)].get(
            local_block(pos.x) as usize,
            local_block(pos.z) as usize,
            pos.y as usize,
        )
    }

    /// Sets the voxel at `pos`, refreshing the access time and marking the
    /// region dirty iff the stored value actually changed.
    ///
    /// Panics if `pos.y` is outside `0..256`.
    pub fn set(&mut self, pos: BlockPos, voxel: VoxelType) {
        self.last_access = Instant::now();
        let changed = self.chunks[Self::chunk_slot(pos)].set(
            local_block(pos.x) as usize,
            local_block(pos.z) as usize,
            pos.y as usize,
            voxel,
        );
        if changed {
            self.dirty = true;
        }
    }

    /// Highest y holding a non-[`VoxelType::None`] voxel in the column at
    /// the given global x/z, or `None` for an untouched column.
    pub fn highest_voxel_y(&mut self, x: i32, z: i32) -> Option<i32> {
        self.last_access = Instant::now();
        let slot = (local_chunk(x) * REGION_LEN_CHUNKS + local_chunk(z)) as usize;
        self.chunks[slot].highest_set_y(local_block(x) as usize, local_block(z) as usize)
    }

    /// When this region was last read or written in memory.
    pub fn last_access(&self) -> Instant {
        self.last_access
    }

    /// Whether in-memory contents may differ from the last persisted state.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The chunk at region-local chunk coordinates, for buffered reads.
    pub fn chunk(&self, chunk_x: usize, chunk_z: usize) -> &Chunk {
        &self.chunks[chunk_x * REGION_LEN_CHUNKS as usize + chunk_z]
    }

    /// Writes every chunk's payload in `chunk_x` outer / `chunk_z` inner
    /// order. Clears the dirty flag after the full write succeeds.
    pub fn write_to(&mut self, sink: &mut impl Write) -> std::io::Result<()> {
        for chunk in &self.chunks {
            chunk.write_to(sink)?;
        }
        self.dirty = false;
        Ok(())
    }

    /// Overwrites this region from a serialized payload, chunks in the
    /// same order as [`Region::write_to`]. Clears the dirty flag.
    pub fn read_from(&mut self, source: &mut impl Read) -> Result<(), PayloadError> {
        for chunk in &mut self.chunks {
            chunk.read_from(source)?;
        }
        self.dirty = false;
        Ok(())
    }

    /// Cursor over all cells as `((x, z, y), voxel)` with region-local
    /// x and z in `0..512`: chunks in layout order, each chunk in its own
    /// layout order.
    pub fn iter(&self) -> RegionIter<'_> {
        RegionIter {
            chunks: &self.chunks,
            chunk_slot: 0,
            inner: self.chunks[0].iter(),
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator flattening chunk iteration across a whole region.
pub struct RegionIter<'a> {
    chunks: &'a [Chunk],
    chunk_slot: usize,
    inner: ChunkIter<'a>,
}

impl Iterator for RegionIter<'_> {
    type Item = ((usize, usize, usize), VoxelType);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(((x, z, y), voxel)) = self.inner.next() {
                let chunk_x = self.chunk_slot / REGION_LEN_CHUNKS as usize;
                let chunk_z = self.chunk_slot % REGION_LEN_CHUNKS as usize;
                let len = CHUNK_LEN_BLOCKS as usize;
                return Some(((chunk_x * len + x, chunk_z * len + z, y), voxel));
            }
            if self.chunk_slot + 1 >= self.chunks.len() {
                return None;
            }
            self.chunk_slot += 1;
            self.inner = self.chunks[self.chunk_slot].iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::{CHUNK_SIZE_BLOCKS, DISK_REGION_SIZE_BYTES};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_voxel(rng: &mut ChaCha8Rng) -> VoxelType {
        let code = rng.random_range(0..VoxelType::COUNT as u8);
        VoxelType::from_code(code).unwrap()
    }

    #[test]
    fn test_new_region_is_all_none_and_clean() {
        let region = Region::new();
        assert!(!region.is_dirty());
        assert!(region.iter().all(|(_, voxel)| voxel == VoxelType::None));
    }

    #[test]
    fn test_dirty_only_after_an_actual_change() {
        let mut region = Region::new();

        region.get(BlockPos::new(12, 4, 34));
        assert!(!region.is_dirty());

        // Writing the value a cell already holds is not a change.
        region.set(BlockPos::new(132, 4, 3214), VoxelType::None);
        assert!(!region.is_dirty());

        region.set(BlockPos::new(123, 1, 234), VoxelType::Water);
        assert!(region.is_dirty());
    }

    #[test]
    fn test_dirty_clears_on_write_and_read() {
        let mut region = Region::new();
        region.set(BlockPos::new(1, 1, 1), VoxelType::Stone);
        assert!(region.is_dirty());

        let mut buf = Vec::with_capacity(DISK_REGION_SIZE_BYTES);
        region.write_to(&mut buf).unwrap();
        assert!(!region.is_dirty());
        assert_eq!(region.get(BlockPos::new(1, 1, 1)), VoxelType::Stone);

        let mut loaded = Region::new();
        loaded.set(BlockPos::new(2, 2, 2), VoxelType::Sand);
        loaded.read_from(&mut buf.as_slice()).unwrap();
        assert!(!loaded.is_dirty());
        assert_eq!(loaded.get(BlockPos::new(1, 1, 1)), VoxelType::Stone);
        assert_eq!(loaded.get(BlockPos::new(2, 2, 2)), VoxelType::None);
    }

    #[test]
    fn test_access_time_refreshes_on_get_and_set() {
        let mut region = Region::new();
        let created = region.last_access();

        let before_set = Instant::now();
        region.set(BlockPos::new(123, 1, 234), VoxelType::Water);
        assert!(region.last_access() >= before_set);
        assert!(region.last_access() >= created);

        let before_get = Instant::now();
        region.get(BlockPos::new(12, 4, 34));
        assert!(region.last_access() >= before_get);
    }

    #[test]
    fn test_get_and_set_address_the_same_cell() {
        let mut region = Region::new();
        region.set(BlockPos::new(0, 1, 0), VoxelType::SoilWithGrass);
        assert_eq!(region.get(BlockPos::new(0, 1, 0)), VoxelType::SoilWithGrass);
        // Global coordinates well outside region (0, 0) resolve through the
        // same local decomposition.
        region.set(BlockPos::new(231, 52, 49_382), VoxelType::Gravel);
        assert_eq!(region.get(BlockPos::new(231, 52, 49_382)), VoxelType::Gravel);
    }

    #[test]
    fn test_stream_round_trip_with_random_fill() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut original = Region::new();
        // Fill a scattering of cells across several chunks.
        for _ in 0..10_000 {
            let pos = BlockPos::new(
                rng.random_range(0..512),
                rng.random_range(0..256),
                rng.random_range(0..512),
            );
            original.set(pos, random_voxel(&mut rng));
        }

        let mut buf = Vec::with_capacity(DISK_REGION_SIZE_BYTES);
        original.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), DISK_REGION_SIZE_BYTES);

        let mut restored = Region::new();
        restored.read_from(&mut buf.as_slice()).unwrap();
        for chunk_x in 0..32 {
            for chunk_z in 0..32 {
                assert_eq!(
                    restored.chunk(chunk_x, chunk_z).as_bytes(),
                    original.chunk(chunk_x, chunk_z).as_bytes()
                );
            }
        }
    }

    #[test]
    fn test_iteration_visits_chunks_z_inner_x_outer() {
        let mut region = Region::new();
        // First cell of chunk (0, 1) and of chunk (1, 0).
        region.set(BlockPos::new(0, 0, 16), VoxelType::Stone);
        region.set(BlockPos::new(16, 0, 0), VoxelType::Soil);

        // Chunk (0, 1) is the second chunk visited, chunk (1, 0) the 33rd.
        assert_eq!(
            region.iter().nth(CHUNK_SIZE_BLOCKS),
            Some(((0, 16, 0), VoxelType::Stone))
        );
        assert_eq!(
            region.iter().nth(32 * CHUNK_SIZE_BLOCKS),
            Some(((16, 0, 0), VoxelType::Soil))
        );
    }

    #[test]
    fn test_highest_voxel_y_per_column() {
        let mut region = Region::new();
        assert_eq!(region.highest_voxel_y(100, 100), None);
        region.set(BlockPos::new(100, 0, 100), VoxelType::UnbreakableStone);
        region.set(BlockPos::new(100, 63, 100), VoxelType::Soil);
        assert_eq!(region.highest_voxel_y(100, 100), Some(63));
        assert_eq!(region.highest_voxel_y(101, 100), None);
    }
}
