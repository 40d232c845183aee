use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::routing::{delete, get, put};
use axum::{Extension, Json, Router};

use royalcare_core::{Claims, Message, ServiceError};

use crate::api::AppState;
use crate::model::{FaultInput, FaultListing, FaultReport};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/faults", get(list_faults).post(create_fault))
        .route("/faults/{id}/close", put(close_fault))
        .route("/faults/{id}", delete(delete_fault))
}

async fn create_fault(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    input: Result<Json<FaultInput>, JsonRejection>,
) -> Result<Json<FaultReport>, ServiceError> {
    let Json(input) = input?;
    Ok(Json(svc.create_fault(&claims, input)?))
}

async fn list_faults(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<FaultListing>>, ServiceError> {
    Ok(Json(svc.list_faults(&claims)?))
}

async fn close_fault(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<FaultReport>, ServiceError> {
    let Path(id) = id?;
    Ok(Json(svc.close_fault(&claims, id)?))
}

async fn delete_fault(
    State(svc): State<AppState>,
    Extension(claims): Extension<Claims>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Message>, ServiceError> {
    let Path(id) = id?;
    svc.delete_fault(&claims, id)?;
    Ok(Json(Message::new("Fault report deleted successfully")))
}
