use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::BlobError;
use crate::naming::is_valid_stored_name;
use crate::traits::BlobStore;

/// FileStore is a BlobStore implementation backed by the local filesystem.
///
/// Keys are flat names mapped to files directly under `base_dir`:
///   key "1718000000000-3fa9c2d1-report.pdf" → `{base_dir}/1718000000000-3fa9c2d1-report.pdf`
///
/// The same directory is served read-only over HTTP at `/uploads/`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new FileStore rooted at `base_dir`.
    /// The directory is created if it doesn't exist.
    pub fn open(base_dir: &Path) -> Result<Self, BlobError> {
        fs::create_dir_all(base_dir).map_err(|e| BlobError::Io(e.to_string()))?;
        tracing::debug!(path = %base_dir.display(), "opened file blob store");
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Directory holding the blobs.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a key to a filesystem path. Rejects keys that could escape base_dir.
    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        if !is_valid_stored_name(key) {
            return Err(BlobError::InvalidName(key.to_string()));
        }
        Ok(self.base_dir.join(key))
    }
}

impl BlobStore for FileStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        fs::write(&path, data).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.resolve(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BlobError::Io(e.to_string())),
        }
    }

    fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(key, "blob already gone");
                Ok(())
            }
            Err(e) => Err(BlobError::Io(e.to_string())),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let path = self.resolve(key)?;
        Ok(path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tmp() -> (FileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("uploads")).unwrap();
        (store, dir)
    }

    #[test]
    fn put_get_delete() {
        let (store, _dir) = open_tmp();
        store.put("a.txt", b"hello").unwrap();
        assert!(store.exists("a.txt").unwrap());
        assert_eq!(store.get("a.txt").unwrap(), Some(b"hello".to_vec()));

        store.delete("a.txt").unwrap();
        assert!(!store.exists("a.txt").unwrap());
        assert_eq!(store.get("a.txt").unwrap(), None);
    }

    #[test]
    fn delete_missing_is_ok() {
        let (store, _dir) = open_tmp();
        store.delete("never-written.bin").unwrap();
    }

    #[test]
    fn save_generates_distinct_names() {
        let (store, _dir) = open_tmp();
        let a = store.save(b"one", "scan.pdf").unwrap();
        let b = store.save(b"two", "scan.pdf").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.get(&a).unwrap(), Some(b"one".to_vec()));
        assert_eq!(store.get(&b).unwrap(), Some(b"two".to_vec()));
        assert!(store.base_dir().join(&a).is_file());
    }

    #[test]
    fn traversal_rejected() {
        let (store, _dir) = open_tmp();
        assert!(matches!(
            store.put("../escape.txt", b"x"),
            Err(BlobError::InvalidName(_))
        ));
        assert!(store.get("sub/dir.txt").is_err());
        assert!(store.delete("..").is_err());
    }
}
