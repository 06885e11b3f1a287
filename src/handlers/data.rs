//! # Sensor Data API Handlers
//!
//! Readings are appended through `POST /data` and read back per sensor, per
//! sensor and day range, or across the caller's whole hierarchy.

use axum::{
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::Json,
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::handlers::types::{Created, DataResponse, created, required, sensor_uri};
use crate::hierarchy::HierarchyResolver;
use crate::repositories::DataRepository;
use crate::server::AppState;

/// Request payload for appending a reading
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDataRequest {
    pub controller_id: Option<String>,
    pub node_id: Option<i32>,
    pub sensor_id: Option<i32>,
    /// Reading payload, stored verbatim
    #[schema(example = "21.5")]
    pub payload: Option<String>,
}

/// List every reading of a sensor
#[utoipa::path(
    get,
    path = "/controllers/{controller_id}/nodes/{node_id}/sensors/{sensor_id}/data",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id"),
        ("node_id" = i32, Path, description = "Node id"),
        ("sensor_id" = i32, Path, description = "Sensor id")
    ),
    responses(
        (status = 200, description = "Readings, oldest first", body = [DataResponse]),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller, node or sensor not found", body = ApiError)
    ),
    tag = "data"
)]
pub async fn list_sensor_data(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<(String, i32, i32)>, PathRejection>,
) -> Result<Json<Vec<DataResponse>>, ApiError> {
    let Path((controller_id, node_id, sensor_id)) = path?;

    let resolved = HierarchyResolver::new(&state.db)
        .sensor(&user, &controller_id, node_id, sensor_id)
        .await?;
    let readings = DataRepository::new(&state.db)
        .list(&resolved.sensor)
        .await?;

    Ok(Json(
        readings
            .into_iter()
            .map(|reading| DataResponse::new(&controller_id, node_id, sensor_id, reading))
            .collect(),
    ))
}

/// List the readings of a sensor between two days
///
/// `begin` and `end` are epoch seconds; the day starting at `end` is included in full.
#[utoipa::path(
    get,
    path = "/controllers/{controller_id}/nodes/{node_id}/sensors/{sensor_id}/data/{begin}/{end}",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id"),
        ("node_id" = i32, Path, description = "Node id"),
        ("sensor_id" = i32, Path, description = "Sensor id"),
        ("begin" = i64, Path, description = "Start, epoch seconds (inclusive)"),
        ("end" = i64, Path, description = "Start of the last included day, epoch seconds")
    ),
    responses(
        (status = 200, description = "Readings in range, oldest first", body = [DataResponse]),
        (status = 400, description = "Invalid range", body = ApiError),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller, node or sensor not found", body = ApiError)
    ),
    tag = "data"
)]
pub async fn list_sensor_data_range(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<(String, i32, i32, i64, i64)>, PathRejection>,
) -> Result<Json<Vec<DataResponse>>, ApiError> {
    let Path((controller_id, node_id, sensor_id, begin, end)) = path?;

    let resolved = HierarchyResolver::new(&state.db)
        .sensor(&user, &controller_id, node_id, sensor_id)
        .await?;
    let readings = DataRepository::new(&state.db)
        .list_by_range(&resolved.sensor, begin, end)
        .await?;

    Ok(Json(
        readings
            .into_iter()
            .map(|reading| DataResponse::new(&controller_id, node_id, sensor_id, reading))
            .collect(),
    ))
}

/// List every reading across the caller's controllers
#[utoipa::path(
    get,
    path = "/data",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Readings, oldest first", body = [DataResponse]),
        (status = 401, description = "Missing or invalid token", body = ApiError)
    ),
    tag = "data"
)]
pub async fn list_all_data(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<DataResponse>>, ApiError> {
    let records = DataRepository::new(&state.db).list_all(&user).await?;

    Ok(Json(records.into_iter().map(DataResponse::from).collect()))
}

/// Append a reading to a sensor
#[utoipa::path(
    post,
    path = "/data",
    security(("bearer_auth" = [])),
    request_body = CreateDataRequest,
    responses(
        (status = 201, description = "Reading stored", body = DataResponse, headers(
            ("Location", description = "URL of the sensor's readings")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller, node or sensor not found", body = ApiError)
    ),
    tag = "data"
)]
pub async fn create_data(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    body: Result<Json<CreateDataRequest>, JsonRejection>,
) -> Result<Created<DataResponse>, ApiError> {
    let Json(request) = body?;
    let controller_id = required("controller_id", request.controller_id)?;
    let node_id = required("node_id", request.node_id)?;
    let sensor_id = required("sensor_id", request.sensor_id)?;
    let payload = required("payload", request.payload)?;

    let txn = state.db.begin().await?;
    let (_, reading) = DataRepository::new(&txn)
        .record(&user, &controller_id, node_id, sensor_id, &payload)
        .await?;
    txn.commit().await?;

    tracing::debug!(controller_id = %controller_id, node_id, sensor_id, "Reading stored");

    Ok(created(
        format!("{}/data", sensor_uri(&controller_id, node_id, sensor_id)),
        DataResponse::new(&controller_id, node_id, sensor_id, reading),
    ))
}
