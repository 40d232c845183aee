//! Maintenance module: the device registry, device attachments and the
//! fault report ledger.
//!
//! All operations take the caller's [`royalcare_core::Claims`]. Admins
//! manage devices and close or delete faults. Everyone else reads the
//! devices of their own department, uploads service records to them and
//! files fault reports.
//!
//! Records live in the SQL store as JSON documents; attachment contents
//! live in the blob store under generated stored names.

pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;

use royalcare_core::{ClaimsResolver, Module};

use crate::service::MaintService;

/// Default request body cap for uploads: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Maintenance module implementing the Module trait.
pub struct MaintModule {
    service: Arc<MaintService>,
    resolver: Arc<dyn ClaimsResolver>,
    max_upload_bytes: usize,
}

impl MaintModule {
    pub fn new(service: Arc<MaintService>, resolver: Arc<dyn ClaimsResolver>) -> Self {
        Self {
            service,
            resolver,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

impl Module for MaintModule {
    fn name(&self) -> &str {
        "maint"
    }

    fn routes(&self) -> Router {
        api::build_router(
            self.service.clone(),
            self.resolver.clone(),
            self.max_upload_bytes,
        )
    }
}
