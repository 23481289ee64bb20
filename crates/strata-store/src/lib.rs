//! Disk-bound voxel storage.
//!
//! This crate turns the in-memory model types of `strata-model` into a
//! persistent store: a [`VoxelStore`] binds to a directory, pages 64 MiB
//! regions in and out of a memory-bounded [`BoundedCache`], and persists
//! each region as one gzip-compressed file named after its region key.
//!
//! ```no_run
//! use strata_model::{BlockPos, VoxelType};
//! use strata_store::VoxelStore;
//!
//! # fn main() -> Result<(), strata_store::StoreError> {
//! let mut store = VoxelStore::open("world")?;
//! store.set_voxel(BlockPos::new(-17, 5, -513), VoxelType::Stone)?;
//! store.flush()?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod options;
pub mod region_file;
pub mod store;

pub use cache::{BoundedCache, CacheStore};
pub use error::StoreError;
pub use options::{OptionsError, StoreOptions};
pub use region_file::{RegionKey, parse_region_file_name, region_file_name};
pub use store::{VoxelIter, VoxelStore};
