//! Caller claims and the pluggable resolver that produces them.
//!
//! Business modules never read authorization headers themselves. They
//! receive [`Claims`] produced by a [`ClaimsResolver`] that is injected at
//! startup, so the header-based resolver can later be replaced with one
//! that verifies signed tokens.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

/// The two authorization tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Parse a role string. Anything other than `admin` is a regular user.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Per-request authorization claims: (role, department, user id).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Claims {
    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            ..Default::default()
        }
    }

    pub fn user(user_id: &str, department: Option<&str>) -> Self {
        Self {
            role: Role::User,
            department: department.map(String::from),
            user_id: Some(user_id.to_string()),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Pluggable claims source. Called once per request by the claims
/// middleware; the result is stored in request extensions.
///
/// Resolution never fails: missing information yields absent fields and a
/// non-admin role. Operations that need an identity reject the request
/// themselves.
pub trait ClaimsResolver: Send + Sync + 'static {
    fn resolve(&self, headers: &HeaderMap) -> Claims;
}
