//! # Server Configuration
//!
//! This module contains the server setup and configuration for the SensorHub API.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use sea_orm::DatabaseConnection;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{IdentityProvider, StaticTokenIdentity, auth_middleware};
use crate::config::AppConfig;
use crate::handlers;
use crate::telemetry::trace_context_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// State backed by the API tokens configured in `config`
    pub fn new(config: &AppConfig, db: DatabaseConnection) -> Self {
        Self {
            db,
            identity: Arc::new(StaticTokenIdentity::from_config(config)),
        }
    }
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/controllers",
            get(handlers::controllers::list_controllers)
                .post(handlers::controllers::create_controller),
        )
        .route(
            "/controllers/{controller_id}",
            get(handlers::controllers::get_controller),
        )
        .route(
            "/controllers/{controller_id}/nodes",
            get(handlers::nodes::list_nodes).post(handlers::nodes::create_node),
        )
        .route(
            "/controllers/{controller_id}/nodes/{node_id}",
            get(handlers::nodes::get_node),
        )
        .route(
            "/controllers/{controller_id}/nodes/{node_id}/sensors",
            get(handlers::sensors::list_sensors).post(handlers::sensors::create_sensor),
        )
        .route(
            "/controllers/{controller_id}/nodes/{node_id}/sensors/{sensor_id}",
            get(handlers::sensors::get_sensor),
        )
        .route(
            "/controllers/{controller_id}/nodes/{node_id}/sensors/{sensor_id}/data",
            get(handlers::data::list_sensor_data),
        )
        .route(
            "/controllers/{controller_id}/nodes/{node_id}/sensors/{sensor_id}/data/{begin}/{end}",
            get(handlers::data::list_sensor_data_range),
        )
        .route(
            "/data",
            get(handlers::data::list_all_data).post(handlers::data::create_data),
        )
        .route(
            "/sensor-types/{controller_id}",
            get(handlers::sensor_types::list_controller_sensor_types),
        )
        .route(
            "/sensor-types-global/{sensor_type}",
            get(handlers::sensor_types::list_sensors_by_type),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .merge(protected)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Starts the server with the given configuration and database connection
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let profile = config.profile.clone();
    let app = create_app(AppState::new(&config, db));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(?error, "Failed to listen for shutdown signal");
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::controllers::list_controllers,
        crate::handlers::controllers::create_controller,
        crate::handlers::controllers::get_controller,
        crate::handlers::nodes::list_nodes,
        crate::handlers::nodes::create_node,
        crate::handlers::nodes::get_node,
        crate::handlers::sensors::list_sensors,
        crate::handlers::sensors::create_sensor,
        crate::handlers::sensors::get_sensor,
        crate::handlers::data::list_sensor_data,
        crate::handlers::data::list_sensor_data_range,
        crate::handlers::data::list_all_data,
        crate::handlers::data::create_data,
        crate::handlers::sensor_types::list_controller_sensor_types,
        crate::handlers::sensor_types::list_sensors_by_type,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthResponse,
            crate::handlers::types::ControllerResponse,
            crate::handlers::types::NodeResponse,
            crate::handlers::types::SensorResponse,
            crate::handlers::types::DataResponse,
            crate::handlers::controllers::CreateControllerRequest,
            crate::handlers::nodes::CreateNodeRequest,
            crate::handlers::sensors::CreateSensorRequest,
            crate::handlers::data::CreateDataRequest,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "SensorHub API",
        description = "Controllers, nodes, sensors and their readings",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::new);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
