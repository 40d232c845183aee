use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FaultStatus {
    #[default]
    Open,
    Closed,
}

impl FaultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultStatus::Open => "Open",
            FaultStatus::Closed => "Closed",
        }
    }
}

/// A fault reported against a device. Only ever moves Open -> Closed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaultReport {
    #[serde(default)]
    pub id: i64,
    pub device_id: i64,
    pub description: String,
    #[serde(default)]
    pub status: FaultStatus,
    pub created_at: String,
    pub reporting_user_id: String,
}

/// A fault report joined with the current name of its device.
/// `deviceName` is omitted when the device no longer exists.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaultListing {
    #[serde(flatten)]
    pub report: FaultReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
}

/// Body of `POST /faults`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultInput {
    #[serde(default, alias = "device_id", deserialize_with = "lenient_id")]
    pub device_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Form-posting clients send ids as strings.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(n)) => Ok(Some(n)),
        Some(Raw::Str(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid device id {:?}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_accepts_both_id_spellings() {
        let a: FaultInput =
            serde_json::from_value(serde_json::json!({"deviceId": 3, "description": "x"})).unwrap();
        let b: FaultInput =
            serde_json::from_value(serde_json::json!({"device_id": "3", "description": "x"})).unwrap();
        assert_eq!(a.device_id, Some(3));
        assert_eq!(b.device_id, Some(3));

        let none: FaultInput = serde_json::from_value(serde_json::json!({"description": "x"})).unwrap();
        assert_eq!(none.device_id, None);

        assert!(serde_json::from_value::<FaultInput>(serde_json::json!({"deviceId": "abc"})).is_err());
    }

    #[test]
    fn listing_json_shape() {
        let listing = FaultListing {
            report: FaultReport {
                id: 1,
                device_id: 9,
                description: "Screen flickers".into(),
                status: FaultStatus::Open,
                created_at: "2024-01-01T00:00:00Z".into(),
                reporting_user_id: "u1".into(),
            },
            device_name: None,
        };
        let v = serde_json::to_value(&listing).unwrap();
        assert_eq!(v["status"], "Open");
        assert_eq!(v["deviceId"], 9);
        assert_eq!(v["reportingUserId"], "u1");
        assert!(v.get("deviceName").is_none());
    }
}
