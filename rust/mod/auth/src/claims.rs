//! Header-based claims resolver.
//!
//! After login the client echoes its role, department and user id on every
//! request. These values are trusted as supplied: nothing here is signed,
//! so any client can claim any role. This is a known limitation of the
//! stateless login contract; replacing `HeaderClaims` with a resolver that
//! verifies a signed token closes it without touching the maint module.

use axum::http::HeaderMap;

use royalcare_core::{Claims, ClaimsResolver, Role};

pub const ROLE_HEADER: &str = "x-role";
pub const DEPARTMENT_HEADER: &str = "x-department";
pub const USER_ID_HEADER: &str = "x-user-id";

/// Reads `x-role`, `x-department` and `x-user-id`.
pub struct HeaderClaims;

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl ClaimsResolver for HeaderClaims {
    fn resolve(&self, headers: &HeaderMap) -> Claims {
        Claims {
            role: header(headers, ROLE_HEADER)
                .map(|r| Role::parse(&r))
                .unwrap_or_default(),
            department: header(headers, DEPARTMENT_HEADER),
            user_id: header(headers, USER_ID_HEADER),
        }
    }
}
