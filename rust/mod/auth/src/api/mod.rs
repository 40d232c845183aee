mod login;

use std::sync::Arc;

use axum::Router;

use crate::service::CredentialStore;

/// Shared application state.
pub type AppState = Arc<dyn CredentialStore>;

/// Build the auth API router. Paths are absolute (`/auth/...`).
pub fn build_router(credentials: AppState) -> Router {
    Router::new()
        .merge(login::routes())
        .with_state(credentials)
}
