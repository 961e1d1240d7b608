//! Filesystem backend - one JSON file per key

use crate::{KeyValueBackend, StorageError, StorageResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const EXTENSION: &str = "json";

/// Stores each key as `<url-encoded key>.json` under a directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    storage_dir: PathBuf,
}

impl FileBackend {
    /// Create the backend, creating `storage_dir` if needed
    pub fn new<P: AsRef<Path>>(storage_dir: P) -> StorageResult<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        info!("File storage initialized at: {}", storage_dir.display());

        Ok(Self { storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self
            .storage_dir
            .join(format!("{}.{}", urlencoding::encode(key), EXTENSION)))
    }
}

impl KeyValueBackend for FileBackend {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        // Write-then-rename so a crash never leaves a half-written entry
        let tmp_path = path.with_extension("tmp");
        std::fs::write(&tmp_path, value)?;
        std::fs::rename(&tmp_path, &path)?;

        debug!("Stored key {:?} at {}", key, path.display());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed key {:?} from {}", key, path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();

        for entry in std::fs::read_dir(&self.storage_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match urlencoding::decode(stem) {
                Ok(key) => keys.push(key.into_owned()),
                Err(e) => warn!("Skipping undecodable entry {}: {}", path.display(), e),
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a").join("b");
        let backend = FileBackend::new(&dir).unwrap();

        assert!(dir.is_dir());
        assert!(backend.keys().unwrap().is_empty());
    }

    #[test]
    fn test_missing_key_reads_as_absent() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path()).unwrap();

        assert_eq!(backend.get_item("nope").unwrap(), None);
        backend.remove_item("nope").unwrap();
    }

    #[test]
    fn test_awkward_keys_roundtrip_through_keys() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path()).unwrap();

        let awkward = ["portal:auth_token", "ui/sidebar state", "..", "ünïcode"];
        for key in awkward {
            backend.set_item(key, "1").unwrap();
        }

        let mut expected: Vec<String> = awkward.iter().map(|k| k.to_string()).collect();
        expected.sort();
        assert_eq!(backend.keys().unwrap(), expected);

        for key in awkward {
            assert_eq!(backend.get_item(key).unwrap().as_deref(), Some("1"));
        }
    }

    #[test]
    fn test_empty_key_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path()).unwrap();

        assert!(matches!(
            backend.set_item("", "1"),
            Err(StorageError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_foreign_files_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path()).unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();
        backend.set_item("kept", "1").unwrap();

        assert_eq!(backend.keys().unwrap(), vec!["kept"]);
    }
}
