//! # Controllers API Handlers
//!
//! Registration and lookup of the caller's controllers.

use axum::{
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::handlers::types::{Created, ControllerResponse, controller_uri, created, required};
use crate::hierarchy::HierarchyResolver;
use crate::repositories::{ControllerRepository, NewController};
use crate::server::AppState;

/// Request payload for registering a controller
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateControllerRequest {
    /// Display name, unique per user (max 250 characters)
    #[schema(example = "Greenhouse")]
    pub name: Option<String>,
    #[schema(example = "Backyard")]
    pub location: Option<String>,
    /// Caller-chosen id (max 40 characters); generated when omitted
    pub controller_id: Option<String>,
}

/// List the caller's controllers
#[utoipa::path(
    get,
    path = "/controllers",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Controllers owned by the caller", body = [ControllerResponse]),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "controllers"
)]
pub async fn list_controllers(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<Vec<ControllerResponse>>, ApiError> {
    let controllers = ControllerRepository::new(&state.db).list(&user).await?;

    Ok(Json(
        controllers.into_iter().map(ControllerResponse::from).collect(),
    ))
}

/// Register a controller
#[utoipa::path(
    post,
    path = "/controllers",
    security(("bearer_auth" = [])),
    request_body = CreateControllerRequest,
    responses(
        (status = 201, description = "Controller registered", body = ControllerResponse, headers(
            ("Location", description = "URL of the created controller")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 409, description = "A controller with this name or id already exists", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "controllers"
)]
pub async fn create_controller(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    body: Result<Json<CreateControllerRequest>, JsonRejection>,
) -> Result<Created<ControllerResponse>, ApiError> {
    let Json(request) = body?;
    let request = NewController {
        name: required("name", request.name)?,
        location: required("location", request.location)?,
        controller_id: request.controller_id,
    };

    let controller = ControllerRepository::new(&state.db)
        .create(&user, request)
        .await?;
    tracing::info!(
        user_id = %user,
        controller_id = %controller.controller_id,
        "Controller registered"
    );

    Ok(created(
        controller_uri(&controller.controller_id),
        ControllerResponse::from(controller),
    ))
}

/// Get one of the caller's controllers
#[utoipa::path(
    get,
    path = "/controllers/{controller_id}",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id")
    ),
    responses(
        (status = 200, description = "Controller found", body = ControllerResponse),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "controllers"
)]
pub async fn get_controller(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<ControllerResponse>, ApiError> {
    let Path(controller_id) = path?;

    let controller = HierarchyResolver::new(&state.db)
        .controller(&user, &controller_id)
        .await?;

    Ok(Json(controller.into()))
}
