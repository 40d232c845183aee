use serde::{Deserialize, Serialize};

use royalcare_core::Role;

/// A verified caller identity, returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    pub username: String,

    pub role: Role,

    /// Department scope for non-admin reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// A stored user account. Key: `auth/users/{username}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    /// argon2id PHC string.
    pub password_hash: String,

    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl UserRecord {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            department: self.department.clone(),
        }
    }
}

/// Input for provisioning a new user.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub department: Option<String>,
}
