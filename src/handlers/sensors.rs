//! # Sensors API Handlers

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
use crate::handlers::types::{Created, SensorResponse, created, required, sensor_uri};
use crate::hierarchy::HierarchyResolver;
use crate::repositories::{NewSensor, SensorRepository};
use crate::server::AppState;

/// Request payload for registering a sensor
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSensorRequest {
    /// Sensor number, unique within the node
    #[schema(example = 1)]
    pub sensor_id: Option<i32>,
    #[schema(example = "temp")]
    pub sensor_type: Option<String>,
    /// Display name; a descriptive default is generated when omitted
    pub name: Option<String>,
}

/// List the sensors of a node with their latest readings
#[utoipa::path(
    get,
    path = "/controllers/{controller_id}/nodes/{node_id}/sensors",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id"),
        ("node_id" = i32, Path, description = "Node id")
    ),
    responses(
        (status = 200, description = "Sensors ordered by sensor id", body = [SensorResponse]),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller or node not found", body = ApiError)
    ),
    tag = "sensors"
)]
pub async fn list_sensors(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<(String, i32)>, PathRejection>,
) -> Result<Json<Vec<SensorResponse>>, ApiError> {
    let Path((controller_id, node_id)) = path?;

    let resolved = HierarchyResolver::new(&state.db)
        .node(&user, &controller_id, node_id)
        .await?;
    let sensors = SensorRepository::new(&state.db).list(&resolved.node).await?;

    Ok(Json(
        sensors
            .into_iter()
            .map(|sensor| SensorResponse::new(&controller_id, node_id, sensor))
            .collect(),
    ))
}

/// Register a sensor on a node
#[utoipa::path(
    post,
    path = "/controllers/{controller_id}/nodes/{node_id}/sensors",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id"),
        ("node_id" = i32, Path, description = "Node id")
    ),
    request_body = CreateSensorRequest,
    responses(
        (status = 201, description = "Sensor registered", body = SensorResponse, headers(
            ("Location", description = "URL of the created sensor")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller or node not found", body = ApiError),
        (status = 409, description = "Sensor id already in use", body = ApiError)
    ),
    tag = "sensors"
)]
pub async fn create_sensor(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<(String, i32)>, PathRejection>,
    body: Result<Json<CreateSensorRequest>, JsonRejection>,
) -> Result<Created<SensorResponse>, ApiError> {
    let Path((controller_id, node_id)) = path?;
    let Json(request) = body?;
    let request = NewSensor {
        sensor_id: required("sensor_id", request.sensor_id)?,
        sensor_type: required("sensor_type", request.sensor_type)?,
        name: request.name,
    };

    let txn = state.db.begin().await?;
    let resolved = HierarchyResolver::new(&txn)
        .node(&user, &controller_id, node_id)
        .await?;
    let sensor = SensorRepository::new(&txn)
        .create(&resolved.controller, &resolved.node, request)
        .await?;
    txn.commit().await?;

    tracing::info!(
        controller_id = %controller_id,
        node_id,
        sensor_id = sensor.sensor_id,
        sensor_type = %sensor.sensor_type,
        "Sensor registered"
    );

    Ok(created(
        sensor_uri(&controller_id, node_id, sensor.sensor_id),
        SensorResponse::registered(&controller_id, node_id, sensor),
    ))
}

/// Get a sensor with its latest reading
#[utoipa::path(
    get,
    path = "/controllers/{controller_id}/nodes/{node_id}/sensors/{sensor_id}",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id"),
        ("node_id" = i32, Path, description = "Node id"),
        ("sensor_id" = i32, Path, description = "Sensor id")
    ),
    responses(
        (status = 200, description = "Sensor found", body = SensorResponse),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller, node or sensor not found", body = ApiError)
    ),
    tag = "sensors"
)]
pub async fn get_sensor(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<(String, i32, i32)>, PathRejection>,
) -> Result<Json<SensorResponse>, ApiError> {
    let Path((controller_id, node_id, sensor_id)) = path?;

    let resolved = HierarchyResolver::new(&state.db)
        .node(&user, &controller_id, node_id)
        .await?;
    let sensor = SensorRepository::new(&state.db)
        .get(&resolved.node, sensor_id)
        .await?;

    Ok(Json(SensorResponse::new(&controller_id, node_id, sensor)))
}
