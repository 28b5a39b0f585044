//! Entry snapshot persistence
//!
//! Saves and loads the whole entry collection as a single JSON file.
//! Uses atomic writes (write to temp file, then rename) to prevent corruption.
//!
//! Storage location: `~/.local/share/toonhub/` (configurable via `Config`)
//!
//! Files:
//! - `entries.json` - The serialized entry collection, newest first

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::ContentEntry;
use crate::storage::error::{StorageError, StorageResult};

/// Persistence layer for the entry snapshot
///
/// Provides atomic file operations for saving/loading the collection.
pub struct SnapshotPersistence {
    config: Config,
}

impl SnapshotPersistence {
    /// Create a new persistence handler with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if a snapshot exists on disk
    pub fn exists(&self) -> bool {
        self.config.entries_path().exists()
    }

    /// Save the entry collection to disk using atomic write
    ///
    /// This writes to a temporary file first, then renames it to the target
    /// path, so the snapshot is never left in a partially-written state.
    pub fn save(&self, entries: &[ContentEntry]) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|source| StorageError::Encode { source })?;

        atomic_write(&self.config.entries_path(), &bytes)
    }

    /// Load the entry collection from disk
    ///
    /// Returns `None` if the snapshot file doesn't exist.
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn load(&self) -> StorageResult<Option<Vec<ContentEntry>>> {
        let path = self.config.entries_path();

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(|source| StorageError::ReadError {
            path: path.clone(),
            source,
        })?;

        let entries = serde_json::from_slice(&bytes).map_err(|source| {
            StorageError::InvalidSnapshot {
                path: path.clone(),
                source,
            }
        })?;

        Ok(Some(entries))
    }

    /// Move a snapshot that failed to parse out of the way
    ///
    /// The store calls this before falling back to an empty collection so
    /// the unreadable data is preserved for manual recovery. Returns the
    /// backup path when the rename succeeds.
    pub fn backup_corrupt(&self) -> Option<PathBuf> {
        let path = self.config.entries_path();
        let mut backup = path.clone().into_os_string();
        backup.push(".corrupt.backup");
        let backup = PathBuf::from(backup);

        fs::rename(&path, &backup).ok().map(|_| backup)
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    atomic_write_with_mode(path, data, None)
}

/// Atomic write for secret-bearing files
///
/// Same as `atomic_write`, but on Unix the file is restricted to the owner
/// (mode 0600) before any data is written; the rename carries the mode over
/// to the target path.
pub(crate) fn atomic_write_private(path: &Path, data: &[u8]) -> StorageResult<()> {
    atomic_write_with_mode(path, data, Some(0o600))
}

fn atomic_write_with_mode(path: &Path, data: &[u8], mode: Option<u32>) -> StorageResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    // Create temp file in the same directory (for atomic rename)
    let temp_path = path.with_extension("tmp");

    // Write to temp file
    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    #[cfg(unix)]
    {
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(mode))
                .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    // Sync to disk before rename
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    // Atomic rename
    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ContentEntry, ShortLink};
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    fn sample_entry(title: &str) -> ContentEntry {
        let mut entry = ContentEntry::new(title, Category::Anime, "u1", "erin");
        entry.links = vec![ShortLink::new("", "https://drive.google.com/x")];
        entry
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = SnapshotPersistence::new(test_config(&temp_dir));

        // Initially no snapshot
        assert!(!persistence.exists());
        assert!(persistence.load().unwrap().is_none());

        // Save a collection
        let entries = vec![sample_entry("Demon Slayer"), sample_entry("Spirited Away")];
        persistence.save(&entries).unwrap();
        assert!(persistence.exists());

        // Load and verify
        let loaded = persistence.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].title, "Demon Slayer");
        assert_eq!(loaded, entries);
    }

    #[test]
    fn test_save_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = SnapshotPersistence::new(test_config(&temp_dir));

        persistence.save(&[sample_entry("First")]).unwrap();
        persistence
            .save(&[sample_entry("Second"), sample_entry("First")])
            .unwrap();

        let loaded = persistence.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].title, "Second");
    }

    #[test]
    fn test_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::write(config.entries_path(), b"{ not json").unwrap();

        let persistence = SnapshotPersistence::new(config);
        let err = persistence.load().unwrap_err();
        assert!(matches!(err, StorageError::InvalidSnapshot { .. }));
    }

    #[test]
    fn test_backup_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::write(config.entries_path(), b"{ not json").unwrap();

        let persistence = SnapshotPersistence::new(config);
        let backup = persistence.backup_corrupt().unwrap();

        assert!(backup.exists());
        assert!(!persistence.exists());
        assert!(backup.to_string_lossy().ends_with(".corrupt.backup"));
    }

    #[test]
    fn test_backup_corrupt_without_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let persistence = SnapshotPersistence::new(test_config(&temp_dir));

        assert!(persistence.backup_corrupt().is_none());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir
            .path()
            .join("a")
            .join("b")
            .join("c")
            .join("file.txt");

        atomic_write(&nested_path, b"test data").unwrap();

        assert!(nested_path.exists());
        let content = fs::read_to_string(&nested_path).unwrap();
        assert_eq!(content, "test data");
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("entries.json");

        atomic_write(&path, b"[]").unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_atomic_write_private_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        atomic_write_private(&path, b"{\"access_token\":\"t\"}").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
