pub mod devices;
pub mod faults;
pub mod middleware;

use std::sync::Arc;

use axum::Router;

use royalcare_core::ClaimsResolver;

use crate::service::MaintService;

/// Shared application state.
pub type AppState = Arc<MaintService>;

/// Build the maintenance API router. Every route sees `Extension<Claims>`
/// produced by `resolver`.
pub fn build_router(
    svc: AppState,
    resolver: Arc<dyn ClaimsResolver>,
    max_upload_bytes: usize,
) -> Router {
    Router::new()
        .merge(devices::routes(max_upload_bytes))
        .merge(faults::routes())
        .layer(axum::middleware::from_fn_with_state(
            resolver,
            middleware::claims_middleware,
        ))
        .with_state(svc)
}
