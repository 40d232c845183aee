//! Auth module: identity and role resolution.
//!
//! # Pieces
//!
//! - **CredentialStore**: verifies username/password (argon2id hashes in KV)
//! - **HeaderClaims**: per-request claims from `x-role` / `x-department` / `x-user-id`
//! - **POST /auth/login**: returns the caller's [`model::Identity`]
//!
//! # Usage
//!
//! ```ignore
//! use auth::{AuthModule, service::KvCredentialStore};
//!
//! let module = AuthModule::new(Arc::new(KvCredentialStore::new(kv)));
//! let router = module.routes();
//! ```

pub mod api;
pub mod claims;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use royalcare_core::Module;

pub use claims::HeaderClaims;

use crate::service::CredentialStore;

/// Auth module implementing the Module trait.
pub struct AuthModule {
    credentials: Arc<dyn CredentialStore>,
}

impl AuthModule {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }
}

impl Module for AuthModule {
    fn name(&self) -> &str {
        "auth"
    }

    fn routes(&self) -> Router {
        api::build_router(self.credentials.clone())
    }
}
