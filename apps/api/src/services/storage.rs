//! Upload storage: file persistence and content hashing
//!
//! Originals land at `originals/<uuid>.<ext>` under the upload root; only
//! the root-relative path is persisted so the serving layer can prefix
//! paths uniformly. The SHA-256 of the original bytes is recorded at
//! upload time and later feeds download certificates.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use loopcast_shared_config::{StorageConfig, ORIGINALS_DIR};

use crate::error::{ApiError, ApiResult};
use crate::models::r#loop::SUPPORTED_EXTENSIONS;

/// A stored original upload
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Path relative to the upload root
    pub relative_path: String,
    /// Hex SHA-256 of the file contents
    pub file_hash: String,
}

/// Lowercased extension of an uploaded filename
pub fn file_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Whether the pipeline accepts this container format
pub fn is_supported_extension(ext: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&ext)
}

/// Hex SHA-256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Certificate hash binding a download to a loop, user, file content and
/// point in time
pub fn certificate_hash(
    loop_id: Uuid,
    user_id: Uuid,
    file_hash: &str,
    timestamp: &str,
) -> String {
    sha256_hex(format!("{}:{}:{}:{}", loop_id, user_id, file_hash, timestamp).as_bytes())
}

/// Persist an original upload under the upload root
pub async fn store_original(
    storage: &StorageConfig,
    extension: &str,
    bytes: &[u8],
) -> ApiResult<StoredUpload> {
    let originals = storage.originals_dir();
    tokio::fs::create_dir_all(&originals).await?;

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let absolute = originals.join(&file_name);

    tokio::fs::write(&absolute, bytes).await.map_err(|e| {
        tracing::error!(error = %e, path = %absolute.display(), "Failed to persist upload");
        ApiError::Storage(format!("failed to persist upload: {}", e))
    })?;

    Ok(StoredUpload {
        relative_path: format!("{}/{}", ORIGINALS_DIR, file_name),
        file_hash: sha256_hex(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("kick.WAV"), Some("wav".to_string()));
        assert_eq!(file_extension("take.1.flac"), Some("flac".to_string()));
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn test_supported_extensions() {
        for ext in ["wav", "mp3", "ogg", "flac", "aiff", "aif"] {
            assert!(is_supported_extension(ext), "{} should be supported", ext);
        }
        assert!(!is_supported_extension("webm"));
        assert!(!is_supported_extension("exe"));
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        // SHA-256 of the empty string
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_certificate_hash_is_stable_and_distinct() {
        let loop_id = Uuid::parse_str("6f2c0e1a-9a1f-4c53-8dd0-1f9a5f3c2b10").unwrap();
        let user_id = Uuid::parse_str("0e7c5a44-2f7b-4e6a-9a93-53d2c35f9f01").unwrap();

        let a = certificate_hash(loop_id, user_id, "abc", "2024-01-01T00:00:00Z");
        let b = certificate_hash(loop_id, user_id, "abc", "2024-01-01T00:00:00Z");
        let c = certificate_hash(loop_id, user_id, "abc", "2024-01-01T00:00:01Z");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn test_store_original_writes_relative_path() {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageConfig::with_root(root.path());

        let stored = store_original(&storage, "wav", b"fake audio bytes")
            .await
            .unwrap();

        assert!(stored.relative_path.starts_with("originals/"));
        assert!(stored.relative_path.ends_with(".wav"));
        let on_disk = std::fs::read(storage.resolve(&stored.relative_path)).unwrap();
        assert_eq!(on_disk, b"fake audio bytes");
        assert_eq!(stored.file_hash, sha256_hex(b"fake audio bytes"));
    }
}
