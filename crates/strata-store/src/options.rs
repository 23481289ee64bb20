//! Store construction options, persistable as a RON file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_model::limits::DEFAULT_MAX_CACHE_SIZE_MB;

/// Options a [`VoxelStore`](crate::VoxelStore) is opened with.
///
/// `max_cache_size_mb` is the only runtime tunable of the engine; the
/// overwrite flag only matters at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
    /// Memory budget for resident regions, in MB.
    pub max_cache_size_mb: usize,
    /// Remove all existing region files from the directory on open.
    /// Unrecognized files are left alone.
    pub overwrite: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_cache_size_mb: DEFAULT_MAX_CACHE_SIZE_MB,
            overwrite: false,
        }
    }
}

/// Errors that can occur when loading or saving [`StoreOptions`].
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    /// Failed to read the options file from disk.
    #[error("failed to read store options: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to write the options file to disk.
    #[error("failed to write store options: {0}")]
    Write(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse store options: {0}")]
    Parse(#[source] ron::error::SpannedError),

    /// Failed to serialize options to RON.
    #[error("failed to serialize store options: {0}")]
    Serialize(#[source] ron::Error),
}

impl StoreOptions {
    /// Loads options from a RON file.
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path).map_err(OptionsError::Read)?;
        ron::from_str(&content).map_err(OptionsError::Parse)
    }

    /// Loads options from a RON file, falling back to defaults when the
    /// file does not exist. A present-but-invalid file is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self, OptionsError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Saves options as pretty-printed RON.
    pub fn save(&self, path: &Path) -> Result<(), OptionsError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(OptionsError::Serialize)?;
        std::fs::write(path, content).map_err(OptionsError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StoreOptions::default();
        assert_eq!(options.max_cache_size_mb, 1024);
        assert!(!options.overwrite);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.ron");
        let options = StoreOptions {
            max_cache_size_mb: 256,
            overwrite: true,
        };
        options.save(&path).unwrap();
        assert_eq!(StoreOptions::load(&path).unwrap(), options);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let parsed: StoreOptions = ron::from_str("(max_cache_size_mb: 128)").unwrap();
        assert_eq!(parsed.max_cache_size_mb, 128);
        assert!(!parsed.overwrite);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = StoreOptions::load_or_default(&dir.path().join("absent.ron")).unwrap();
        assert_eq!(loaded, StoreOptions::default());
    }

    #[test]
    fn test_invalid_content_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.ron");
        std::fs::write(&path, "(max_cache_size_mb: \"lots\")").unwrap();
        assert!(matches!(
            StoreOptions::load_or_default(&path),
            Err(OptionsError::Parse(_))
        ));
    }
}
