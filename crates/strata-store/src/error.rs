//! Store error types.

use std::path::PathBuf;

use strata_model::UnknownVoxelCode;

/// Errors that can occur while bootstrapping a model directory or paging
/// regions to and from disk.
///
/// Transient I/O failures are surfaced immediately; the store never
/// retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The model path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The model directory could not be created.
    #[error("failed to create model directory {path}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The model directory could not be listed during region discovery.
    #[error("failed to list model directory {path}")]
    ListDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A path matching a region key exists but is not a regular file.
    #[error("cannot read region file: {0}")]
    NotAFile(PathBuf),

    /// An existing region file could not be removed in overwrite mode.
    #[error("failed to remove region file {path}")]
    RemoveRegionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading, writing, compressing or decompressing a region file failed.
    #[error("i/o failure on region file {path}")]
    RegionIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A region file decompressed cleanly but holds an invalid voxel code.
    #[error("corrupt region file {path}")]
    CorruptRegion {
        path: PathBuf,
        #[source]
        source: UnknownVoxelCode,
    },
}
