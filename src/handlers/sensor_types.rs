//! # Sensor Type API Handlers

use axum::{
    extract::{Path, State, rejection::PathRejection},
    response::Json,
};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::handlers::types::SensorResponse;
use crate::hierarchy::HierarchyResolver;
use crate::repositories::SensorRepository;
use crate::server::AppState;

/// Distinct sensor types used under a controller
#[utoipa::path(
    get,
    path = "/sensor-types/{controller_id}",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id")
    ),
    responses(
        (status = 200, description = "Sorted sensor types", body = [String]),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller not found", body = ApiError)
    ),
    tag = "sensor-types"
)]
pub async fn list_controller_sensor_types(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let Path(controller_id) = path?;

    let controller = HierarchyResolver::new(&state.db)
        .controller(&user, &controller_id)
        .await?;
    let types = SensorRepository::new(&state.db)
        .distinct_types(&controller)
        .await?;

    Ok(Json(types))
}

/// Sensors of one type across the caller's controllers
#[utoipa::path(
    get,
    path = "/sensor-types-global/{sensor_type}",
    security(("bearer_auth" = [])),
    params(
        ("sensor_type" = String, Path, description = "Sensor type, e.g. `temp`")
    ),
    responses(
        (status = 200, description = "Matching sensors with their latest readings", body = [SensorResponse]),
        (status = 401, description = "Missing or invalid token", body = ApiError)
    ),
    tag = "sensor-types"
)]
pub async fn list_sensors_by_type(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<SensorResponse>>, ApiError> {
    let Path(sensor_type) = path?;

    let sensors = SensorRepository::new(&state.db)
        .list_by_type(&user, &sensor_type)
        .await?;

    Ok(Json(
        sensors
            .into_iter()
            .map(|located| {
                SensorResponse::new(&located.controller_id, located.node_id, located.sensor)
            })
            .collect(),
    ))
}
