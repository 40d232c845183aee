use serde::{Deserialize, Serialize};

use royalcare_core::{ServiceError, non_blank};

/// The admin-editable fields of a device. Replaced as a whole on update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFields {
    pub name: String,
    pub model: String,
    pub serial_number: String,
    pub location: String,
    pub branch: String,

    /// Owning department. Sole scoping key for non-admin reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_service_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_service_date: Option<String>,
}

/// A registered piece of equipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Generated row id, ascending in creation order.
    #[serde(default)]
    pub id: i64,

    #[serde(flatten)]
    pub fields: DeviceFields,

    /// Stored blob names in upload order. Duplicates allowed.
    #[serde(default)]
    pub attachments: Vec<String>,

    pub created_at: String,

    pub updated_at: String,
}

/// Device body as sent by clients. Every field is optional here so that
/// missing required fields produce a validation error instead of a
/// deserialization failure. Snake-case and legacy names are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInput {
    #[serde(default, alias = "device name")]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, alias = "serial_number")]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "last_service_date", alias = "lasr_service_date")]
    pub last_service_date: Option<String>,
    #[serde(default, alias = "next_service_date")]
    pub next_service_date: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    non_blank(value).ok_or_else(|| ServiceError::Validation(format!("{} is required", field)))
}

impl DeviceInput {
    /// Check required fields and normalize blanks to absent.
    pub fn validate(self) -> Result<DeviceFields, ServiceError> {
        Ok(DeviceFields {
            name: required(self.name, "name")?,
            model: required(self.model, "model")?,
            serial_number: required(self.serial_number, "serialNumber")?,
            location: required(self.location, "location")?,
            branch: required(self.branch, "branch")?,
            department: non_blank(self.department),
            status: required(self.status, "status")?,
            last_service_date: non_blank(self.last_service_date),
            next_service_date: non_blank(self.next_service_date),
        })
    }
}

/// Query filter for device listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceFilter {
    #[serde(default)]
    pub department: Option<String>,
}

/// One uploaded file, before it is stored.
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub data: Vec<u8>,
}
