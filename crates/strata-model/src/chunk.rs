//! Dense voxel storage for one 16 × 16 × 256 column of the model.

use std::io::{Read, Write};

use crate::limits::{CHUNK_SIZE_BLOCKS, DISK_CHUNK_SIZE_BYTES};
use crate::voxel::{UnknownVoxelCode, VoxelType};

/// A corrupt or unreadable chunk payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The underlying reader or writer failed.
    #[error("chunk payload i/o failed")]
    Io(#[from] std::io::Error),
    /// The payload holds a byte that maps to no voxel type.
    #[error("chunk payload is corrupt: {0}")]
    InvalidVoxel(#[from] UnknownVoxelCode),
}

/// One continuous block of memory holding a 16 × 16 × 256 voxel grid.
///
/// Local coordinates: x and z in `0..16`, y in `0..256`. Cells are laid out
/// with y varying fastest, then z, then x, so a vertical column is one
/// contiguous 256-byte run. All cells start as [`VoxelType::None`].
///
/// Accessors panic when an index is out of range; the vertical extent is a
/// hard model limit, not a soft one.
pub struct Chunk {
    /// Flat `(x * 16 + z) * 256 + y` byte array; every byte is a valid
    /// voxel code.
    voxels: Box<[u8]>,
}

impl Chunk {
    /// Creates a chunk with every cell set to [`VoxelType::None`].
    pub fn new() -> Self {
        Self {
            voxels: vec![VoxelType::None.code(); CHUNK_SIZE_BLOCKS].into_boxed_slice(),
        }
    }

    fn index(x: usize, z: usize, y: usize) -> usize {
        assert!(x < 16 && z < 16 && y < 256, "chunk-local index out of range");
        (x * 16 + z) * 256 + y
    }

    /// Returns the voxel at chunk-local `(x, z, y)`.
    pub fn get(&self, x: usize, z: usize, y: usize) -> VoxelType {
        let code = self.voxels[Self::index(x, z, y)];
        VoxelType::from_code(code).expect("chunk bytes hold valid voxel codes")
    }

    /// Sets the voxel at chunk-local `(x, z, y)`.
    ///
    /// Returns true iff the stored byte actually changed.
    pub fn set(&mut self, x: usize, z: usize, y: usize, voxel: VoxelType) -> bool {
        let cell = &mut self.voxels[Self::index(x, z, y)];
        let changed = *cell != voxel.code();
        *cell = voxel.code();
        changed
    }

    /// Highest y with a non-[`VoxelType::None`] voxel in the `(x, z)`
    /// column, or `None` for an untouched column.
    pub fn highest_set_y(&self, x: usize, z: usize) -> Option<i32> {
        let base = Self::index(x, z, 0);
        let column = &self.voxels[base..base + 256];
        column
            .iter()
            .rposition(|&code| code != VoxelType::None.code())
            .map(|y| y as i32)
    }

    /// The raw payload bytes, in iteration order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.voxels
    }

    /// Writes the flat byte array verbatim. No header: the length is
    /// implied by the fixed grid dimensions.
    pub fn write_to(&self, sink: &mut impl Write) -> std::io::Result<()> {
        sink.write_all(&self.voxels)
    }

    /// Overwrites this chunk from the next [`DISK_CHUNK_SIZE_BYTES`] bytes
    /// of `source`, validating every byte against the voxel code table.
    pub fn read_from(&mut self, source: &mut impl Read) -> Result<(), PayloadError> {
        source.read_exact(&mut self.voxels)?;
        for &code in self.voxels.iter() {
            VoxelType::from_code(code)?;
        }
        Ok(())
    }

    /// Cursor over all cells in layout order: for each x, for each z, y
    /// ascending.
    pub fn iter(&self) -> ChunkIter<'_> {
        ChunkIter {
            voxels: &self.voxels,
            offset: 0,
        }
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over `((x, z, y), voxel)` in chunk layout order.
pub struct ChunkIter<'a> {
    voxels: &'a [u8],
    offset: usize,
}

impl Iterator for ChunkIter<'_> {
    type Item = ((usize, usize, usize), VoxelType);

    fn next(&mut self) -> Option<Self::Item> {
        let code = *self.voxels.get(self.offset)?;
        let x = self.offset / (16 * 256);
        let z = (self.offset / 256) % 16;
        let y = self.offset % 256;
        self.offset += 1;
        let voxel = VoxelType::from_code(code).expect("chunk bytes hold valid voxel codes");
        Some(((x, z, y), voxel))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.voxels.len() - self.offset;
        (remaining, Some(remaining))
    }
}
