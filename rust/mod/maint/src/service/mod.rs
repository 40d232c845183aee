pub mod schema;
pub mod device;
pub mod attachment;
pub mod fault;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use royalcare_blob::BlobStore;
use royalcare_core::{Claims, ServiceError};
use royalcare_sql::{Row, SQLStore};

/// Default cap on files per upload request.
pub const DEFAULT_MAX_UPLOAD_FILES: usize = 10;

/// Maintenance service: device registry, attachments and the fault ledger.
pub struct MaintService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) blob: Arc<dyn BlobStore>,
    pub(crate) max_upload_files: usize,
}

impl MaintService {
    pub fn new(sql: Arc<dyn SQLStore>, blob: Arc<dyn BlobStore>) -> Result<Self, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Self {
            sql,
            blob,
            max_upload_files: DEFAULT_MAX_UPLOAD_FILES,
        })
    }

    pub fn with_max_upload_files(mut self, max: usize) -> Self {
        self.max_upload_files = max.max(1);
        self
    }

    pub fn max_upload_files(&self) -> usize {
        self.max_upload_files
    }
}

// ── Helpers ──

pub(crate) fn storage_err(e: royalcare_sql::SQLError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, ServiceError> {
    serde_json::to_string(value).map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Decode the `data` column of a row and stamp it with the row's `id`.
pub(crate) fn decode_row<T: DeserializeOwned>(
    row: &Row,
    set_id: impl FnOnce(&mut T, i64),
) -> Result<T, ServiceError> {
    let id = row
        .get_i64("id")
        .ok_or_else(|| ServiceError::Internal("missing id column".into()))?;
    let data = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
    let mut record: T = serde_json::from_str(data)
        .map_err(|e| ServiceError::Internal(format!("corrupt record {}: {}", id, e)))?;
    set_id(&mut record, id);
    Ok(record)
}

pub(crate) fn require_admin(claims: &Claims) -> Result<(), ServiceError> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied("admin role required".into()))
    }
}

pub(crate) fn require_user_id(claims: &Claims) -> Result<&str, ServiceError> {
    claims
        .user_id
        .as_deref()
        .ok_or_else(|| ServiceError::Unauthenticated("user id is required".into()))
}
