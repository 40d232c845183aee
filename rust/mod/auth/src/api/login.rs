use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use royalcare_core::ServiceError;

use crate::api::AppState;
use crate::model::Identity;
use crate::service::authenticate;

pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Login request body. Missing fields are treated as empty and rejected
/// as bad credentials, as is a body that does not parse.
#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    user: Identity,
}

/// POST /auth/login: verify credentials and return the caller's identity.
///
/// No session or token is issued; the client sends the returned role,
/// department and id back as request headers.
async fn login(
    State(credentials): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ServiceError> {
    let Json(body) = body.map_err(|e| {
        tracing::debug!(error = %e.body_text(), "unparseable login request");
        ServiceError::Unauthenticated("Wrong credentials".into())
    })?;
    let user = authenticate(credentials.as_ref(), &body.username, &body.password)?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "login succeeded");
    Ok(Json(LoginResponse { user }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use royalcare_core::Role;
    use royalcare_kv::RedbStore;

    use crate::api::build_router;
    use crate::model::NewUser;
    use crate::service::KvCredentialStore;

    fn test_router() -> (axum::Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(RedbStore::open(&dir.path().join("auth.redb")).unwrap());
        let store = KvCredentialStore::new(kv);
        store
            .add_user(NewUser {
                username: "admin".into(),
                password: "letmein".into(),
                role: Role::Admin,
                department: None,
            })
            .unwrap();
        (build_router(Arc::new(store)), dir)
    }

    async fn post_login(router: &axum::Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null)))
    }

    #[tokio::test]
    async fn login_returns_identity() {
        let (router, _dir) = test_router();
        let (status, body) =
            post_login(&router, serde_json::json!({"username": "admin", "password": "letmein"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "admin");
        assert_eq!(body["user"]["role"], "admin");
        assert!(body["user"]["id"].as_str().is_some());
        assert!(body["user"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn wrong_credentials_are_401() {
        let (router, _dir) = test_router();
        let (status, body) =
            post_login(&router, serde_json::json!({"username": "admin", "password": "nope"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHENTICATED");
        assert_eq!(body["error"], "Wrong credentials");
    }

    #[tokio::test]
    async fn missing_fields_are_401() {
        let (router, _dir) = test_router();
        let (status, _) = post_login(&router, serde_json::json!({"username": "admin"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    async fn post_raw(router: &axum::Router, content_type: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/auth/login")
            .header("content-type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null)))
    }

    #[tokio::test]
    async fn malformed_body_is_401() {
        let (router, _dir) = test_router();
        let cases = [
            ("application/json", r#"{"username": 5, "password": "letmein"}"#),
            ("application/json", "not json"),
            ("text/plain", r#"{"username":"admin","password":"letmein"}"#),
        ];
        for (content_type, body) in cases {
            let (status, json) = post_raw(&router, content_type, body).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", content_type, body);
            assert_eq!(json["code"], "UNAUTHENTICATED");
            assert_eq!(json["error"], "Wrong credentials");
        }
    }
}
