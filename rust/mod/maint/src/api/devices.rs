use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::routing::{delete, get, post, put};
use axum::{Extension, Json, Router};
use serde::Serialize;

use royalcare_core::{Claims, Message, ServiceError};

use crate::api::AppState;
use crate::model::{Device, DeviceFilter, DeviceInput, Upload};

/// Multipart field carrying uploaded files.
pub const FILES_FIELD: &str = "files";

pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/devices", get(list_devices).post(create_device))
        .route("/devices/{id}", put(update_device).delete(delete_device))
        .route(
            "/devices/{id}/upload",
            post(upload_files).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/devices/{id}/files/{filename}", delete(remove_file))
}

async fn list_devices(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    filter: Result<Query<DeviceFilter>, QueryRejection>,
) -> Result<Json<Vec<Device>>, ServiceError> {
    let Query(filter) = filter?;
    Ok(Json(svc.list_devices(&claims, &filter)?))
}

async fn create_device(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    input: Result<Json<DeviceInput>, JsonRejection>,
) -> Result<Json<Device>, ServiceError> {
    let Json(input) = input?;
    Ok(Json(svc.create_device(&claims, input)?))
}

async fn update_device(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
    input: Result<Json<DeviceInput>, JsonRejection>,
) -> Result<Json<Device>, ServiceError> {
    let Path(id) = id?;
    let Json(input) = input?;
    Ok(Json(svc.update_device(&claims, id, input)?))
}

async fn delete_device(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Message>, ServiceError> {
    let Path(id) = id?;
    svc.delete_device(&claims, id)?;
    Ok(Json(Message::new("Device deleted successfully")))
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    message: String,
    files: Vec<String>,
}

/// POST /devices/{id}/upload: multipart, one or more `files` parts.
///
/// A body over the route's byte limit answers 413 `PAYLOAD_TOO_LARGE`.
async fn upload_files(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ServiceError> {
    let Path(id) = id?;
    let mut multipart = multipart?;
    let mut uploads = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        // One past the cap is enough for the service to reject the batch.
        if uploads.len() > svc.max_upload_files() {
            break;
        }
        let original_name = field.file_name().unwrap_or("file").to_string();
        let data = field.bytes().await?;
        uploads.push(Upload {
            original_name,
            data: data.to_vec(),
        });
    }

    let files = svc.add_attachments(&claims, id, uploads)?;
    Ok(Json(UploadResponse {
        message: "Files uploaded successfully".into(),
        files,
    }))
}

async fn remove_file(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<(i64, String)>, PathRejection>,
) -> Result<Json<Message>, ServiceError> {
    let Path((id, filename)) = path?;
    svc.remove_attachment(&claims, id, &filename)?;
    Ok(Json(Message::new("File removed successfully")))
}
