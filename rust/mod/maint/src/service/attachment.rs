use royalcare_blob::is_valid_stored_name;
use royalcare_core::{Claims, ServiceError, now_rfc3339};
use royalcare_sql::Value;

use crate::model::Upload;
use crate::service::{MaintService, require_user_id, storage_err};

impl MaintService {
    /// Store uploaded files and append their stored names to a device.
    /// Returns the device's full attachment list after the append.
    ///
    /// The append is a single statement, so concurrent uploads to the same
    /// device never lose each other's names.
    pub fn add_attachments(
        &self,
        claims: &Claims,
        device_id: i64,
        uploads: Vec<Upload>,
    ) -> Result<Vec<String>, ServiceError> {
        let user_id = require_user_id(claims)?;
        if uploads.is_empty() {
            return Err(ServiceError::Validation("No files uploaded".into()));
        }
        if uploads.len() > self.max_upload_files {
            return Err(ServiceError::Validation(format!(
                "at most {} files per upload",
                self.max_upload_files
            )));
        }
        self.get_visible_device(claims, device_id)?;

        let mut saved = Vec::with_capacity(uploads.len());
        for upload in &uploads {
            match self.blob.save(&upload.data, &upload.original_name) {
                Ok(name) => saved.push(name),
                Err(e) => {
                    self.discard(&saved);
                    return Err(ServiceError::Storage(e.to_string()));
                }
            }
        }

        let mut paths = Vec::with_capacity(saved.len());
        let mut params: Vec<Value> = Vec::with_capacity(saved.len() + 2);
        for name in &saved {
            params.push(Value::Text(name.clone()));
            paths.push(format!("'$.attachments[#]', ?{}", params.len()));
        }
        params.push(Value::Text(now_rfc3339()));
        let now_idx = params.len();
        params.push(Value::Integer(device_id));
        let id_idx = params.len();

        let sql = format!(
            "UPDATE devices SET
                data = json_set(json_insert(data, {}), '$.updatedAt', ?{now}),
                updated_at = ?{now}
             WHERE id = ?{id}
             RETURNING json_extract(data, '$.attachments') AS attachments",
            paths.join(", "),
            now = now_idx,
            id = id_idx,
        );

        let rows = match self.sql.query(&sql, &params) {
            Ok(rows) => rows,
            Err(e) => {
                self.discard(&saved);
                return Err(storage_err(e));
            }
        };
        let Some(row) = rows.first() else {
            // Deleted between the scope check and the append.
            self.discard(&saved);
            return Err(ServiceError::NotFound(format!("device {} not found", device_id)));
        };

        let attachments: Vec<String> = row
            .get_str("attachments")
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| ServiceError::Internal(format!("corrupt attachments on device {}: {}", device_id, e)))?
            .unwrap_or_default();

        tracing::info!(device_id, user_id, files = saved.len(), "attachments uploaded");
        Ok(attachments)
    }

    /// Remove every occurrence of `stored_name` from a device and delete
    /// the blob. Names the device does not reference are left alone, and a
    /// device that is missing or outside the caller's department is a no-op.
    pub fn remove_attachment(
        &self,
        claims: &Claims,
        device_id: i64,
        stored_name: &str,
    ) -> Result<(), ServiceError> {
        let user_id = require_user_id(claims)?;
        if !is_valid_stored_name(stored_name) {
            return Err(ServiceError::Validation(format!("invalid file name {:?}", stored_name)));
        }
        let device = match self.get_visible_device(claims, device_id) {
            Ok(device) => device,
            Err(ServiceError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        if !device.attachments.iter().any(|a| a == stored_name) {
            return Ok(());
        }

        // Blob first: if it fails the record still lists the file and the
        // request can be retried.
        self.blob
            .delete(stored_name)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        self.sql
            .exec(
                "UPDATE devices SET
                    data = json_set(data,
                        '$.attachments', json((SELECT json_group_array(value)
                            FROM json_each(devices.data, '$.attachments')
                            WHERE value <> ?1)),
                        '$.updatedAt', ?2),
                    updated_at = ?2
                 WHERE id = ?3",
                &[
                    Value::Text(stored_name.to_string()),
                    Value::Text(now_rfc3339()),
                    Value::Integer(device_id),
                ],
            )
            .map_err(storage_err)?;

        tracing::info!(device_id, user_id, file = stored_name, "attachment removed");
        Ok(())
    }

    /// Best-effort cleanup of blobs that never made it into a record.
    fn discard(&self, names: &[String]) {
        for name in names {
            if let Err(e) = self.blob.delete(name) {
                tracing::warn!(file = %name, error = %e, "failed to discard orphaned upload");
            }
        }
    }
}
