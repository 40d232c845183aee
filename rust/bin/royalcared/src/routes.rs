//! Route registration: module routes plus system endpoints.

use std::path::Path;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Build the complete router. Module routes carry absolute paths and are
/// merged at the root; stored attachments are served under `/uploads`.
pub fn build_router(module_routes: Vec<(&str, Router)>, upload_dir: &Path) -> Router {
    let mut app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/version", get(version))
        .nest_service("/uploads", ServeDir::new(upload_dir));

    for (name, router) in module_routes {
        tracing::debug!(module = name, "mounting module routes");
        app = app.merge(router);
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn index() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "OK",
        "message": "RoyalCare maintenance API is running",
    }))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "royalcared",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::{AdminConfig, HttpConfig, ServerConfig, StorageConfig};

    fn test_app() -> (axum::Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            admin: AdminConfig {
                username: "admin".to_string(),
                password_hash: auth::service::password::hash_password("boot").unwrap(),
                department: None,
            },
            storage: StorageConfig {
                data_dir: dir.path().to_string_lossy().into_owned(),
                ..Default::default()
            },
            server: HttpConfig::default(),
        };
        (crate::build_app(&config).unwrap(), dir)
    }

    async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        (status, bytes.to_vec())
    }

    fn json(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn system_endpoints() {
        let (app, _dir) = test_app();

        let (status, body) = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "OK");

        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "ok");

        let (_, body) = send(&app, Request::get("/version").body(Body::empty()).unwrap()).await;
        assert_eq!(json(&body)["name"], "royalcared");
    }

    #[tokio::test]
    async fn login_then_upload_and_download() {
        let (app, _dir) = test_app();

        let (status, body) = send(
            &app,
            Request::post("/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"username":"admin","password":"boot"}"#))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let user = json(&body)["user"].clone();
        assert_eq!(user["role"], "admin");
        let user_id = user["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Request::post("/devices")
                .header("content-type", "application/json")
                .header("x-role", "admin")
                .header("x-user-id", &user_id)
                .body(Body::from(
                    serde_json::json!({
                        "device name": "Ventilator",
                        "model": "V-60",
                        "serial_number": "SN-77",
                        "location": "Bay 1",
                        "branch": "Main",
                        "department": "ICU",
                        "status": "Active",
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let device_id = json(&body)["id"].as_i64().unwrap();

        let boundary = "X-BOUNDARY";
        let multipart = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"report.txt\"\r\n\r\nall good\r\n--{b}--\r\n",
            b = boundary
        );
        let (status, body) = send(
            &app,
            Request::post(format!("/devices/{}/upload", device_id))
                .header("content-type", format!("multipart/form-data; boundary={}", boundary))
                .header("x-role", "user")
                .header("x-department", "ICU")
                .header("x-user-id", "nurse-1")
                .body(Body::from(multipart))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&body));
        let stored = json(&body)["files"][0].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Request::get(format!("/uploads/{}", stored)).body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"all good");
    }
}
