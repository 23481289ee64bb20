//! The disk-bound voxel store.
//!
//! A store binds to one directory and pages 64 MiB regions between memory
//! and gzip-compressed region files, keeping resident memory under the
//! configured cache budget. Callers address voxels by global position and
//! never see chunks, regions or compression.
//!
//! Single-owner design: one store instance exclusively owns its directory,
//! and all calls must come from one logical owner. There is no file
//! locking and no internal synchronization; pointing two instances at the
//! same directory, or sharing one across threads without external
//! synchronization, is unsupported. There is also no implicit close: call
//! [`VoxelStore::flush`] before dropping the store or dirty resident
//! regions are lost (eviction during normal operation always persists
//! dirty data first).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::{debug, info, warn};

use strata_model::chunk::PayloadError;
use strata_model::limits::DISK_REGION_SIZE_MB;
use strata_model::{
    BlockPos, CHUNK_LEN_BLOCKS, REGION_LEN_BLOCKS, REGION_LEN_CHUNKS, Region, VoxelType,
    region_index,
};

use crate::cache::{BoundedCache, CacheStore};
use crate::error::StoreError;
use crate::options::StoreOptions;
use crate::region_file::{RegionKey, parse_region_file_name, region_file_name};

fn region_file_path(directory: &Path, key: RegionKey) -> PathBuf {
    directory.join(region_file_name(key))
}

fn load_region(directory: &Path, key: RegionKey) -> Result<Region, StoreError> {
    let path = region_file_path(directory, key);
    let mut region = Region::new();
    if !path.exists() {
        debug!(%key, "no region file yet, starting empty");
        return Ok(region);
    }
    if !path.is_file() {
        return Err(StoreError::NotAFile(path));
    }
    let file = File::open(&path).map_err(|source| StoreError::RegionIo {
        path: path.clone(),
        source,
    })?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    region.read_from(&mut decoder).map_err(|error| match error {
        PayloadError::Io(source) => StoreError::RegionIo {
            path: path.clone(),
            source,
        },
        PayloadError::InvalidVoxel(source) => StoreError::CorruptRegion {
            path: path.clone(),
            source,
        },
    })?;
    debug!(%key, path = %path.display(), "loaded region file");
    Ok(region)
}

/// Writes the region out as one gzip stream, if it holds unsaved changes.
fn persist_region(directory: &Path, key: RegionKey, region: &mut Region) -> Result<(), StoreError> {
    if !region.is_dirty() {
        return Ok(());
    }
    let path = region_file_path(directory, key);
    let io_err = |source| StoreError::RegionIo {
        path: path.clone(),
        source,
    };
    let file = File::create(&path).map_err(io_err)?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    region.write_to(&mut encoder).map_err(io_err)?;
    let mut writer = encoder.finish().map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    debug!(%key, path = %path.display(), "written region file");
    Ok(())
}

/// Paging strategy binding the region cache to a model directory.
struct RegionPager {
    directory: PathBuf,
}

impl CacheStore<RegionKey, Region> for RegionPager {
    type Error = StoreError;

    fn line_size_mb(&self) -> usize {
        DISK_REGION_SIZE_MB
    }

    fn is_older_than(&self, a: &Region, b: &Region) -> bool {
        a.last_access() < b.last_access()
    }

    fn load(&mut self, key: &RegionKey) -> Result<Region, StoreError> {
        load_region(&self.directory, *key)
    }

    fn on_evict(&mut self, key: &RegionKey, mut region: Region) -> Result<(), StoreError> {
        persist_region(&self.directory, *key, &mut region)
    }
}

/// A voxel model too large for memory, backed by a directory of region
/// files.
///
/// Opening an existing directory resumes the model stored in it, so
/// progress persists across instances and program runs.
pub struct VoxelStore {
    cache: BoundedCache<RegionKey, Region, RegionPager>,
}

impl VoxelStore {
    /// Opens the model in `directory` with default options, creating the
    /// directory if needed.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with(directory, StoreOptions::default())
    }

    /// Opens the model in `directory`.
    ///
    /// The path must be a directory or creatable as one. With
    /// `options.overwrite` set, every file matching the region naming
    /// pattern is deleted before first use; all other files are left
    /// untouched.
    pub fn open_with(
        directory: impl Into<PathBuf>,
        options: StoreOptions,
    ) -> Result<Self, StoreError> {
        let directory = directory.into();
        if directory.exists() {
            if !directory.is_dir() {
                return Err(StoreError::NotADirectory(directory));
            }
            if options.overwrite {
                remove_existing_region_files(&directory)?;
            }
        } else {
            std::fs::create_dir_all(&directory).map_err(|source| StoreError::CreateDirectory {
                path: directory.clone(),
                source,
            })?;
        }
        let pager = RegionPager { directory };
        Ok(Self {
            cache: BoundedCache::new(pager, options.max_cache_size_mb),
        })
    }

    /// The directory this store is bound to.
    pub fn directory(&self) -> &Path {
        &self.cache.store().directory
    }

    /// Returns the voxel at `pos`, paging its region in if necessary.
    ///
    /// Panics if `pos.y` is outside `0..256`.
    pub fn get_voxel(&mut self, pos: BlockPos) -> Result<VoxelType, StoreError> {
        Ok(self.cache.get(key_of(pos))?.get(pos))
    }

    /// Sets the voxel at `pos`, paging its region in if necessary.
    ///
    /// Positions outside the nominal world limits are accepted with a
    /// warning. Panics if `pos.y` is outside `0..256`.
    pub fn set_voxel(&mut self, pos: BlockPos, voxel: VoxelType) -> Result<(), StoreError> {
        if !pos.is_within_limits() {
            warn!(?pos, ?voxel, "set_voxel outside the nominal world limits");
        }
        self.cache.get(key_of(pos))?.set(pos, voxel);
        Ok(())
    }

    /// Highest y holding a non-[`VoxelType::None`] voxel in the column at
    /// global `(x, z)`, or `None` for an untouched column.
    pub fn highest_voxel_y(&mut self, x: i32, z: i32) -> Result<Option<i32>, StoreError> {
        let key = RegionKey::new(region_index(x), region_index(z));
        Ok(self.cache.get(key)?.highest_voxel_y(x, z))
    }

    /// Persists every dirty resident region without evicting anything.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.cache
            .for_each_resident_mut(|pager, key, region| {
                persist_region(&pager.directory, *key, region)
            })
    }

    /// Current cache budget in MB.
    pub fn max_cache_size_mb(&self) -> usize {
        self.cache.max_size_mb()
    }

    /// Changes the cache budget, evicting (and persisting) regions
    /// immediately if the new budget is smaller than the resident set.
    pub fn set_max_cache_size_mb(&mut self, max_size_mb: usize) -> Result<(), StoreError> {
        self.cache.set_max_size_mb(max_size_mb)
    }

    /// Number of regions currently held in memory.
    pub fn resident_region_count(&self) -> usize {
        self.cache.len()
    }

    /// Lazy cursor over every voxel of the model in deterministic order:
    /// regions ascending by key (x, then z), each region chunk by chunk,
    /// each chunk y-fastest. Covers the union of resident regions and
    /// region files on disk; a region's data is only paged in when its
    /// turn arrives.
    pub fn iter(&mut self) -> Result<VoxelIter<'_>, StoreError> {
        let keys = self.discover_region_keys()?;
        Ok(VoxelIter {
            store: self,
            keys: keys.into_iter(),
            cursor: None,
        })
    }

    /// Union of resident region keys and keys recovered from region file
    /// names, sorted ascending.
    fn discover_region_keys(&self) -> Result<std::collections::BTreeSet<RegionKey>, StoreError> {
        let directory = self.directory();
        let mut keys: std::collections::BTreeSet<RegionKey> =
            self.cache.resident_keys().copied().collect();
        let list_err = |source| StoreError::ListDirectory {
            path: directory.to_path_buf(),
            source,
        };
        for entry in std::fs::read_dir(directory).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            match parse_region_file_name(&name) {
                Some(key) => {
                    keys.insert(key);
                }
                None => warn!(file = %name, "ignoring unrecognized file in model directory"),
            }
        }
        Ok(keys)
    }
}

fn key_of(pos: BlockPos) -> RegionKey {
    RegionKey::new(region_index(pos.x), region_index(pos.z))
}

fn remove_existing_region_files(directory: &Path) -> Result<(), StoreError> {
    let list_err = |source| StoreError::ListDirectory {
        path: directory.to_path_buf(),
        source,
    };
    let mut region_files = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        if parse_region_file_name(&entry.file_name().to_string_lossy()).is_some() {
            region_files.push(entry.path());
        }
    }
    info!(
        count = region_files.len(),
        "overwrite mode: removing existing region files"
    );
    for path in region_files {
        std::fs::remove_file(&path).map_err(|source| StoreError::RemoveRegionFile {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "removed existing region file");
    }
    Ok(())
}

/// Buffered position within one chunk of the region being visited.
struct ChunkCursor {
    key: RegionKey,
    chunk_x: usize,
    chunk_z: usize,
    /// Copy of the chunk's payload; one 64 KiB buffer at a time keeps the
    /// iterator independent of cache eviction.
    bytes: Box<[u8]>,
    offset: usize,
}

impl ChunkCursor {
    fn cell(&self) -> (BlockPos, VoxelType) {
        let code = self.bytes[self.offset];
        let local_x = (self.offset / (16 * 256)) as i32;
        let local_z = ((self.offset / 256) % 16) as i32;
        let y = (self.offset % 256) as i32;
        let x = self.key.x * REGION_LEN_BLOCKS + self.chunk_x as i32 * CHUNK_LEN_BLOCKS + local_x;
        let z = self.key.z * REGION_LEN_BLOCKS + self.chunk_z as i32 * CHUNK_LEN_BLOCKS + local_z;
        let voxel = VoxelType::from_code(code).expect("chunk bytes hold valid voxel codes");
        (BlockPos::new(x, y, z), voxel)
    }
}

/// Lazy cursor over every voxel of a [`VoxelStore`], produced by
/// [`VoxelStore::iter`].
///
/// Items are `Result` because a region may still have to be paged in from
/// disk when its turn arrives.
pub struct VoxelIter<'a> {
    store: &'a mut VoxelStore,
    keys: std::collections::btree_set::IntoIter<RegionKey>,
    cursor: Option<ChunkCursor>,
}

impl VoxelIter<'_> {
    /// Advances to the next chunk buffer, crossing into the next region
    /// when the current one is exhausted. Returns false at the end.
    fn advance(&mut self) -> Result<bool, StoreError> {
        match self.cursor.take() {
            Some(cursor) => {
                let next = if cursor.chunk_z + 1 < REGION_LEN_CHUNKS as usize {
                    Some((cursor.chunk_x, cursor.chunk_z + 1))
                } else if cursor.chunk_x + 1 < REGION_LEN_CHUNKS as usize {
                    Some((cursor.chunk_x + 1, 0))
                } else {
                    None
                };
                match next {
                    Some((chunk_x, chunk_z)) => {
                        self.refill(cursor.key, chunk_x, chunk_z)?;
                        Ok(true)
                    }
                    None => self.advance_region(),
                }
            }
            None => self.advance_region(),
        }
    }

    fn advance_region(&mut self) -> Result<bool, StoreError> {
        match self.keys.next() {
            Some(key) => {
                self.refill(key, 0, 0)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn refill(&mut self, key: RegionKey, chunk_x: usize, chunk_z: usize) -> Result<(), StoreError> {
        let region = self.store.cache.get(key)?;
        self.cursor = Some(ChunkCursor {
            key,
            chunk_x,
            chunk_z,
            bytes: region.chunk(chunk_x, chunk_z).as_bytes().into(),
            offset: 0,
        });
        Ok(())
    }
}

impl Iterator for VoxelIter<'_> {
    type Item = Result<(BlockPos, VoxelType), StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.nth(0)
    }

    /// Skipping is O(chunks crossed), not O(voxels skipped): whole buffers
    /// are stepped over without decoding.
    fn nth(&mut self, mut n: usize) -> Option<Self::Item> {
        loop {
            if let Some(cursor) = &mut self.cursor {
                let remaining = cursor.bytes.len() - cursor.offset;
                if n < remaining {
                    cursor.offset += n;
                    let item = cursor.cell();
                    cursor.offset += 1;
                    return Some(Ok(item));
                }
                n -= remaining;
            }
            match self.advance() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(error) => return Some(Err(error)),
            }
        }
    }
}
