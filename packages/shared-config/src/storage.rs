//! Upload storage configuration types

use std::path::{Path, PathBuf};

use crate::{get_env_or_default, ConfigResult};

/// Directory for original uploads, relative to the upload root.
pub const ORIGINALS_DIR: &str = "originals";

/// Directory for generated preview files, relative to the upload root.
pub const PREVIEWS_DIR: &str = "previews";

/// Upload storage configuration
///
/// All file paths persisted in the database are relative to `upload_root`
/// so the serving layer can prefix them uniformly.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for uploaded and derived files
    pub upload_root: PathBuf,
}

impl StorageConfig {
    /// Load storage configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            upload_root: PathBuf::from(get_env_or_default("UPLOAD_ROOT", "./uploads")),
        })
    }

    /// Create a configuration with a custom root (useful for testing)
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: root.into(),
        }
    }

    /// Absolute directory for original uploads
    pub fn originals_dir(&self) -> PathBuf {
        self.upload_root.join(ORIGINALS_DIR)
    }

    /// Absolute directory for generated previews
    pub fn previews_dir(&self) -> PathBuf {
        self.upload_root.join(PREVIEWS_DIR)
    }

    /// Resolve a database-relative path against the upload root
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.upload_root.join(relative)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: PathBuf::from("./uploads"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_under_root() {
        let config = StorageConfig::with_root("/data/uploads");
        assert_eq!(config.originals_dir(), PathBuf::from("/data/uploads/originals"));
        assert_eq!(config.previews_dir(), PathBuf::from("/data/uploads/previews"));
    }

    #[test]
    fn test_resolve_relative_path() {
        let config = StorageConfig::with_root("/data/uploads");
        assert_eq!(
            config.resolve("previews/abc.mp3"),
            PathBuf::from("/data/uploads/previews/abc.mp3")
        );
    }
}
