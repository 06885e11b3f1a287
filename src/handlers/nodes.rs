//! # Nodes API Handlers

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
use crate::handlers::types::{Created, NodeResponse, created, node_uri, required};
use crate::hierarchy::HierarchyResolver;
use crate::repositories::NodeRepository;
use crate::server::AppState;

/// Request payload for creating a node
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateNodeRequest {
    /// Node number, unique within the controller
    #[schema(example = 1)]
    pub node_id: Option<i32>,
    /// Display name; defaults to `New Node #<n>`
    pub name: Option<String>,
}

/// List the nodes of a controller
#[utoipa::path(
    get,
    path = "/controllers/{controller_id}/nodes",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id")
    ),
    responses(
        (status = 200, description = "Nodes ordered by node id", body = [NodeResponse]),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller not found", body = ApiError)
    ),
    tag = "nodes"
)]
pub async fn list_nodes(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<NodeResponse>>, ApiError> {
    let Path(controller_id) = path?;

    let controller = HierarchyResolver::new(&state.db)
        .controller(&user, &controller_id)
        .await?;
    let nodes = NodeRepository::new(&state.db).list(&controller).await?;

    Ok(Json(
        nodes
            .into_iter()
            .map(|node| NodeResponse::new(&controller, node))
            .collect(),
    ))
}

/// Create a node under a controller
#[utoipa::path(
    post,
    path = "/controllers/{controller_id}/nodes",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id")
    ),
    request_body = CreateNodeRequest,
    responses(
        (status = 201, description = "Node created", body = NodeResponse, headers(
            ("Location", description = "URL of the created node")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller not found", body = ApiError),
        (status = 409, description = "Node id already in use", body = ApiError)
    ),
    tag = "nodes"
)]
pub async fn create_node(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<CreateNodeRequest>, JsonRejection>,
) -> Result<Created<NodeResponse>, ApiError> {
    let Path(controller_id) = path?;
    let Json(request) = body?;
    let node_id = required("node_id", request.node_id)?;

    let txn = state.db.begin().await?;
    let controller = HierarchyResolver::new(&txn)
        .controller(&user, &controller_id)
        .await?;
    let node = NodeRepository::new(&txn)
        .create(&controller, node_id, request.name.as_deref())
        .await?;
    txn.commit().await?;

    tracing::info!(controller_id = %controller_id, node_id, "Node created");

    Ok(created(
        node_uri(&controller_id, node_id),
        NodeResponse::new(&controller, node),
    ))
}

/// Get a node
#[utoipa::path(
    get,
    path = "/controllers/{controller_id}/nodes/{node_id}",
    security(("bearer_auth" = [])),
    params(
        ("controller_id" = String, Path, description = "Controller id"),
        ("node_id" = i32, Path, description = "Node id")
    ),
    responses(
        (status = 200, description = "Node found", body = NodeResponse),
        (status = 400, description = "Malformed node id", body = ApiError),
        (status = 401, description = "Missing or invalid token", body = ApiError),
        (status = 404, description = "Controller or node not found", body = ApiError)
    ),
    tag = "nodes"
)]
pub async fn get_node(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    path: Result<Path<(String, i32)>, PathRejection>,
) -> Result<Json<NodeResponse>, ApiError> {
    let Path((controller_id, node_id)) = path?;

    let resolved = HierarchyResolver::new(&state.db)
        .node(&user, &controller_id, node_id)
        .await?;

    Ok(Json(NodeResponse::new(&resolved.controller, resolved.node)))
}
