use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use royalcare_core::ClaimsResolver;

/// Resolve the caller's claims once per request and store them as an
/// extension for handlers to read via `Extension<Claims>`.
///
/// Never rejects: operations that need an identity check the claims.
pub async fn claims_middleware(
    State(resolver): State<Arc<dyn ClaimsResolver>>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = resolver.resolve(req.headers());
    tracing::debug!(
        role = claims.role.as_str(),
        department = claims.department.as_deref(),
        user_id = claims.user_id.as_deref(),
        "claims resolved"
    );
    req.extensions_mut().insert(claims);
    next.run(req).await
}
