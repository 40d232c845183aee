use royalcare_core::{Claims, ServiceError, non_blank, now_rfc3339};
use royalcare_sql::{Row, Value};

use crate::model::{FaultInput, FaultListing, FaultReport, FaultStatus};
use crate::service::{MaintService, decode_row, require_admin, require_user_id, storage_err, to_json};

fn decode_fault(row: &Row) -> Result<FaultReport, ServiceError> {
    decode_row(row, |f: &mut FaultReport, id| f.id = id)
}

impl MaintService {
    /// File a fault report as the calling user. The device id is recorded
    /// as given; reports may outlive their device.
    pub fn create_fault(&self, claims: &Claims, input: FaultInput) -> Result<FaultReport, ServiceError> {
        let user_id = require_user_id(claims)?;
        let description = non_blank(input.description)
            .ok_or_else(|| ServiceError::Validation("description is required".into()))?;
        let device_id = input
            .device_id
            .ok_or_else(|| ServiceError::Validation("deviceId is required".into()))?;

        let mut report = FaultReport {
            id: 0,
            device_id,
            description,
            status: FaultStatus::Open,
            created_at: now_rfc3339(),
            reporting_user_id: user_id.to_string(),
        };

        let mut doc = serde_json::to_value(&report).map_err(|e| ServiceError::Internal(e.to_string()))?;
        if let Some(obj) = doc.as_object_mut() {
            obj.remove("id");
        }

        let rows = self
            .sql
            .query(
                "INSERT INTO fault_reports (data, device_id, user_id, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
                &[
                    Value::Text(to_json(&doc)?),
                    Value::Integer(device_id),
                    Value::Text(report.reporting_user_id.clone()),
                    Value::Text(report.status.as_str().to_string()),
                    Value::Text(report.created_at.clone()),
                ],
            )
            .map_err(storage_err)?;
        report.id = rows
            .first()
            .and_then(|r| r.get_i64("id"))
            .ok_or_else(|| ServiceError::Internal("insert returned no id".into()))?;

        tracing::info!(fault_id = report.id, device_id, user_id, "fault reported");
        Ok(report)
    }

    /// Fault reports newest first, each with its device's current name.
    /// Admins see every report; everyone else sees only their own.
    pub fn list_faults(&self, claims: &Claims) -> Result<Vec<FaultListing>, ServiceError> {
        const SELECT: &str = "SELECT f.id AS id, f.data AS data,
                json_extract(d.data, '$.name') AS device_name
             FROM fault_reports f
             LEFT JOIN devices d ON d.id = f.device_id";

        let rows = if claims.is_admin() {
            self.sql
                .query(&format!("{} ORDER BY f.id DESC", SELECT), &[])
        } else {
            let Some(user_id) = claims.user_id.as_deref() else {
                return Ok(Vec::new());
            };
            self.sql.query(
                &format!("{} WHERE f.user_id = ?1 ORDER BY f.id DESC", SELECT),
                &[Value::Text(user_id.to_string())],
            )
        }
        .map_err(storage_err)?;

        rows.iter()
            .map(|row| {
                Ok(FaultListing {
                    report: decode_fault(row)?,
                    device_name: row.get_str("device_name").map(String::from),
                })
            })
            .collect()
    }

    /// Mark a report Closed. Closing a closed report returns it unchanged.
    /// Admin only.
    pub fn close_fault(&self, claims: &Claims, id: i64) -> Result<FaultReport, ServiceError> {
        require_admin(claims)?;

        let rows = self
            .sql
            .query(
                "UPDATE fault_reports SET
                    status = ?1,
                    data = json_set(data, '$.status', ?1)
                 WHERE id = ?2
                 RETURNING id, data",
                &[
                    Value::Text(FaultStatus::Closed.as_str().to_string()),
                    Value::Integer(id),
                ],
            )
            .map_err(storage_err)?;

        let report = match rows.first() {
            Some(row) => decode_fault(row)?,
            None => return Err(ServiceError::NotFound(format!("fault report {} not found", id))),
        };
        tracing::info!(fault_id = id, "fault closed");
        Ok(report)
    }

    /// Delete a report. Deleting a missing report succeeds. Admin only.
    pub fn delete_fault(&self, claims: &Claims, id: i64) -> Result<(), ServiceError> {
        require_admin(claims)?;
        let affected = self
            .sql
            .exec("DELETE FROM fault_reports WHERE id = ?1", &[Value::Integer(id)])
            .map_err(storage_err)?;
        if affected > 0 {
            tracing::info!(fault_id = id, "fault deleted");
        }
        Ok(())
    }
}
