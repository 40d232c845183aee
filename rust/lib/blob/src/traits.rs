use crate::error::BlobError;
use crate::naming::stored_name;

/// BlobStore stores uploaded file contents (service records, photos).
///
/// Keys are flat stored names produced by [`stored_name`]. The default
/// implementation (`FileStore`) maps keys to files in one directory.
/// Can be swapped for object-storage backends by implementing this trait.
pub trait BlobStore: Send + Sync {
    /// Store a blob. Overwrites if the key already exists.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError>;

    /// Retrieve a blob. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError>;

    /// Delete a blob. No-op if the key does not exist.
    fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Check whether a blob exists.
    fn exists(&self, key: &str) -> Result<bool, BlobError>;

    /// Save an upload under a freshly generated stored name and return it.
    fn save(&self, data: &[u8], original_name: &str) -> Result<String, BlobError> {
        let key = stored_name(original_name);
        self.put(&key, data)?;
        Ok(key)
    }
}
