use royalcare_core::{Claims, ServiceError, non_blank, now_rfc3339};
use royalcare_sql::Value;

use crate::model::{Device, DeviceFilter, DeviceInput};
use crate::service::{MaintService, decode_row, require_admin, storage_err, to_json};

/// Whether a caller may see a device. Non-admins with a department only
/// see that department's devices.
pub(crate) fn in_scope(claims: &Claims, device: &Device) -> bool {
    if claims.is_admin() {
        return true;
    }
    match &claims.department {
        Some(dept) => device.fields.department.as_deref() == Some(dept.as_str()),
        None => true,
    }
}

/// The department a listing is restricted to, if any.
fn effective_department(claims: &Claims, filter: &DeviceFilter) -> Option<String> {
    let requested = non_blank(filter.department.clone());
    if claims.is_admin() {
        return requested;
    }
    claims.department.clone().or(requested)
}

/// Stored document for a device: everything but the row id.
fn device_doc(device: &Device) -> Result<String, ServiceError> {
    let mut doc = serde_json::to_value(device).map_err(|e| ServiceError::Internal(e.to_string()))?;
    if let Some(obj) = doc.as_object_mut() {
        obj.remove("id");
    }
    to_json(&doc)
}

fn decode_device(row: &royalcare_sql::Row) -> Result<Device, ServiceError> {
    decode_row(row, |d: &mut Device, id| d.id = id)
}

impl MaintService {
    /// List devices visible to the caller, oldest first.
    pub fn list_devices(
        &self,
        claims: &Claims,
        filter: &DeviceFilter,
    ) -> Result<Vec<Device>, ServiceError> {
        let rows = match effective_department(claims, filter) {
            Some(dept) => self.sql.query(
                "SELECT id, data FROM devices WHERE department = ?1 ORDER BY id ASC",
                &[Value::Text(dept)],
            ),
            None => self
                .sql
                .query("SELECT id, data FROM devices ORDER BY id ASC", &[]),
        }
        .map_err(storage_err)?;

        rows.iter().map(decode_device).collect()
    }

    /// Fetch one device the caller is allowed to see. Out-of-scope devices
    /// are reported as missing.
    pub(crate) fn get_visible_device(&self, claims: &Claims, id: i64) -> Result<Device, ServiceError> {
        let rows = self
            .sql
            .query("SELECT id, data FROM devices WHERE id = ?1", &[Value::Integer(id)])
            .map_err(storage_err)?;
        let device = match rows.first() {
            Some(row) => decode_device(row)?,
            None => return Err(ServiceError::NotFound(format!("device {} not found", id))),
        };
        if !in_scope(claims, &device) {
            return Err(ServiceError::NotFound(format!("device {} not found", id)));
        }
        Ok(device)
    }

    /// Register a device. Admin only.
    pub fn create_device(&self, claims: &Claims, input: DeviceInput) -> Result<Device, ServiceError> {
        require_admin(claims)?;
        let fields = input.validate()?;

        let now = now_rfc3339();
        let mut device = Device {
            id: 0,
            fields,
            attachments: Vec::new(),
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        let rows = self
            .sql
            .query(
                "INSERT INTO devices (data, department, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4) RETURNING id",
                &[
                    Value::Text(device_doc(&device)?),
                    device.fields.department.clone().into(),
                    Value::Text(now.clone()),
                    Value::Text(now),
                ],
            )
            .map_err(storage_err)?;
        device.id = rows
            .first()
            .and_then(|r| r.get_i64("id"))
            .ok_or_else(|| ServiceError::Internal("insert returned no id".into()))?;

        tracing::info!(device_id = device.id, name = %device.fields.name, "device created");
        Ok(device)
    }

    /// Replace a device's editable fields. Attachments and `createdAt` are
    /// kept as stored at the moment of the write. Admin only.
    pub fn update_device(
        &self,
        claims: &Claims,
        id: i64,
        input: DeviceInput,
    ) -> Result<Device, ServiceError> {
        require_admin(claims)?;
        let fields = input.validate()?;

        let now = now_rfc3339();
        let mut doc = serde_json::to_value(&fields).map_err(|e| ServiceError::Internal(e.to_string()))?;
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("updatedAt".into(), serde_json::Value::String(now.clone()));
        }

        let rows = self
            .sql
            .query(
                "UPDATE devices SET
                    data = json_set(?1,
                        '$.attachments', json(COALESCE(json_extract(data, '$.attachments'), '[]')),
                        '$.createdAt', json_extract(data, '$.createdAt')),
                    department = ?2,
                    updated_at = ?3
                 WHERE id = ?4
                 RETURNING id, data",
                &[
                    Value::Text(to_json(&doc)?),
                    fields.department.clone().into(),
                    Value::Text(now),
                    Value::Integer(id),
                ],
            )
            .map_err(storage_err)?;

        let device = match rows.first() {
            Some(row) => decode_device(row)?,
            None => return Err(ServiceError::NotFound(format!("device {} not found", id))),
        };
        tracing::info!(device_id = id, "device updated");
        Ok(device)
    }

    /// Delete a device and purge its attachment blobs. Deleting a missing
    /// device succeeds. Admin only.
    pub fn delete_device(&self, claims: &Claims, id: i64) -> Result<(), ServiceError> {
        require_admin(claims)?;

        let rows = self
            .sql
            .query("DELETE FROM devices WHERE id = ?1 RETURNING id, data", &[Value::Integer(id)])
            .map_err(storage_err)?;
        let Some(row) = rows.first() else {
            return Ok(());
        };
        let device = decode_device(row)?;

        // The record is gone; a blob that fails to delete is only orphaned.
        for name in &device.attachments {
            if let Err(e) = self.blob.delete(name) {
                tracing::warn!(device_id = id, file = %name, error = %e, "failed to purge attachment");
            }
        }

        tracing::info!(device_id = id, attachments = device.attachments.len(), "device deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use royalcare_blob::BlobStore;

    use super::*;
    use crate::model::Upload;
    use crate::service::testutil::{admin_with_id, device_input as input, test_service};

    fn names(devices: &[Device]) -> Vec<&str> {
        devices.iter().map(|d| d.fields.name.as_str()).collect()
    }

    #[test]
    fn create_assigns_increasing_ids() {
        let (svc, _blob, _dir) = test_service();
        let admin = Claims::admin();
        let a = svc.create_device(&admin, input("a", Some("ICU"))).unwrap();
        let b = svc.create_device(&admin, input("b", None)).unwrap();
        assert!(b.id > a.id);
        assert!(a.attachments.is_empty());
        assert_eq!(a.created_at, a.updated_at);

        let all = svc.list_devices(&admin, &DeviceFilter::default()).unwrap();
        assert_eq!(names(&all), vec!["a", "b"]);
        assert_eq!(all[0], a);
    }

    #[test]
    fn create_requires_admin_and_valid_fields() {
        let (svc, _blob, _dir) = test_service();
        let err = svc
            .create_device(&Claims::user("u1", Some("ICU")), input("a", Some("ICU")))
            .unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));

        let mut bad = input("a", None);
        bad.status = Some(" ".into());
        assert!(matches!(
            svc.create_device(&Claims::admin(), bad),
            Err(ServiceError::Validation(_))
        ));

        assert!(svc.list_devices(&Claims::admin(), &DeviceFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn listing_is_department_scoped() {
        let (svc, _blob, _dir) = test_service();
        let admin = Claims::admin();
        svc.create_device(&admin, input("icu-1", Some("ICU"))).unwrap();
        svc.create_device(&admin, input("er-1", Some("ER"))).unwrap();
        svc.create_device(&admin, input("icu-2", Some("ICU"))).unwrap();
        svc.create_device(&admin, input("none", None)).unwrap();

        let er_filter = DeviceFilter { department: Some("ER".into()) };

        // Admin sees everything, or the requested department.
        assert_eq!(svc.list_devices(&admin, &DeviceFilter::default()).unwrap().len(), 4);
        assert_eq!(names(&svc.list_devices(&admin, &er_filter).unwrap()), vec!["er-1"]);

        // A department user is pinned to their department.
        let icu_user = Claims::user("u1", Some("ICU"));
        assert_eq!(
            names(&svc.list_devices(&icu_user, &er_filter).unwrap()),
            vec!["icu-1", "icu-2"]
        );

        // A user without a department gets the filter as requested.
        let floater = Claims::user("u2", None);
        assert_eq!(svc.list_devices(&floater, &DeviceFilter::default()).unwrap().len(), 4);
        assert_eq!(names(&svc.list_devices(&floater, &er_filter).unwrap()), vec!["er-1"]);
    }

    #[test]
    fn update_replaces_fields_and_keeps_attachments() {
        let (svc, _blob, _dir) = test_service();
        let admin = Claims::admin();
        let dev = svc.create_device(&admin, input("pump", Some("ICU"))).unwrap();
        let files = svc
            .add_attachments(
                &admin_with_id(),
                dev.id,
                vec![Upload { original_name: "manual.pdf".into(), data: b"pdf".to_vec() }],
            )
            .unwrap();

        let mut changed = input("pump-renamed", Some("ER"));
        changed.last_service_date = None;
        changed.next_service_date = Some("2025-01-01".into());
        let updated = svc.update_device(&admin, dev.id, changed).unwrap();

        assert_eq!(updated.id, dev.id);
        assert_eq!(updated.fields.name, "pump-renamed");
        assert_eq!(updated.fields.department.as_deref(), Some("ER"));
        assert_eq!(updated.fields.last_service_date, None);
        assert_eq!(updated.fields.next_service_date.as_deref(), Some("2025-01-01"));
        assert_eq!(updated.attachments, files);
        assert_eq!(updated.created_at, dev.created_at);

        // The department column follows the update.
        let er = svc
            .list_devices(&admin, &DeviceFilter { department: Some("ER".into()) })
            .unwrap();
        assert_eq!(er, vec![updated]);
    }

    #[test]
    fn update_missing_or_forbidden() {
        let (svc, _blob, _dir) = test_service();
        assert!(matches!(
            svc.update_device(&Claims::admin(), 999, input("x", None)),
            Err(ServiceError::NotFound(_))
        ));

        let dev = svc.create_device(&Claims::admin(), input("x", None)).unwrap();
        assert!(matches!(
            svc.update_device(&Claims::user("u", None), dev.id, input("y", None)),
            Err(ServiceError::PermissionDenied(_))
        ));
    }

    #[test]
    fn delete_is_idempotent_and_purges_blobs() {
        let (svc, blob, _dir) = test_service();
        let admin = Claims::admin();
        let dev = svc.create_device(&admin, input("pump", None)).unwrap();
        let files = svc
            .add_attachments(
                &admin_with_id(),
                dev.id,
                vec![
                    Upload { original_name: "a.jpg".into(), data: b"a".to_vec() },
                    Upload { original_name: "b.jpg".into(), data: b"b".to_vec() },
                ],
            )
            .unwrap();
        assert!(blob.exists(&files[0]).unwrap());

        assert!(matches!(
            svc.delete_device(&Claims::user("u", None), dev.id),
            Err(ServiceError::PermissionDenied(_))
        ));

        svc.delete_device(&admin, dev.id).unwrap();
        for f in &files {
            assert!(!blob.exists(f).unwrap());
        }
        assert!(svc.list_devices(&admin, &DeviceFilter::default()).unwrap().is_empty());

        svc.delete_device(&admin, dev.id).unwrap();
        svc.delete_device(&admin, 12345).unwrap();
    }
}
