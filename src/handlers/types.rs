//! # Common API Types
//!
//! Response records shared across the handlers, and the small helpers used to
//! validate request bodies and shape `201 Created` responses.

use axum::{
    http::{HeaderName, StatusCode, header::LOCATION},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{ApiError, validation_error};
use crate::models::{controller, data, node, sensor};
use crate::repositories::SensorWithLatest;
use crate::repositories::data::DataRecord;

/// A `201 Created` response with a `Location` header
pub type Created<T> = (StatusCode, [(HeaderName, String); 1], Json<T>);

pub(crate) fn created<T>(location: String, body: T) -> Created<T> {
    (StatusCode::CREATED, [(LOCATION, location)], Json(body))
}

/// Unwrap a required request field or fail with a field-level validation error
pub(crate) fn required<T>(field: &'static str, value: Option<T>) -> Result<T, ApiError> {
    value.ok_or_else(|| validation_error("Validation failed", json!({ field: "is required" })))
}

pub(crate) fn controller_uri(controller_id: &str) -> String {
    format!("/controllers/{}", controller_id)
}

pub(crate) fn node_uri(controller_id: &str, node_id: i32) -> String {
    format!("{}/nodes/{}", controller_uri(controller_id), node_id)
}

pub(crate) fn sensor_uri(controller_id: &str, node_id: i32, sensor_id: i32) -> String {
    format!("{}/sensors/{}", node_uri(controller_id, node_id), sensor_id)
}

/// A controller owned by the caller
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ControllerResponse {
    /// Link to this controller
    #[schema(example = "/controllers/3f2a9c0d41b7e8a5c6d2f1e0b9a8c7d6e5f4a3b2")]
    pub uri: String,
    #[schema(example = "3f2a9c0d41b7e8a5c6d2f1e0b9a8c7d6e5f4a3b2")]
    pub controller_id: String,
    #[schema(example = "Greenhouse")]
    pub name: String,
    #[schema(example = "Backyard")]
    pub location: String,
    /// Link to the controller's nodes
    pub nodes: String,
}

impl From<controller::Model> for ControllerResponse {
    fn from(controller: controller::Model) -> Self {
        let uri = controller_uri(&controller.controller_id);
        Self {
            nodes: format!("{}/nodes", uri),
            uri,
            controller_id: controller.controller_id,
            name: controller.name,
            location: controller.location,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NodeResponse {
    pub controller_id: String,
    #[schema(example = 1)]
    pub node_id: i32,
    #[schema(example = "New Node #1")]
    pub name: String,
}

impl NodeResponse {
    pub fn new(controller: &controller::Model, node: node::Model) -> Self {
        Self {
            controller_id: controller.controller_id.clone(),
            node_id: node.node_id,
            name: node.name,
        }
    }
}

/// A sensor with its most recent reading
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorResponse {
    pub controller_id: String,
    pub node_id: i32,
    #[schema(example = 1)]
    pub sensor_id: i32,
    #[schema(example = "temp")]
    pub sensor_type: String,
    pub name: String,
    /// Payload of the newest reading, null without readings
    pub latest_data: Option<String>,
    /// Timestamp of the newest reading, null without readings
    pub last_update: Option<DateTime<Utc>>,
}

impl SensorResponse {
    pub fn new(controller_id: &str, node_id: i32, sensor: SensorWithLatest) -> Self {
        let SensorWithLatest {
            sensor,
            latest_data,
            last_update,
        } = sensor;
        Self {
            controller_id: controller_id.to_string(),
            node_id,
            sensor_id: sensor.sensor_id,
            sensor_type: sensor.sensor_type,
            name: sensor.name,
            latest_data,
            last_update: last_update.map(|at| at.with_timezone(&Utc)),
        }
    }

    /// A freshly registered sensor, which has no readings yet
    pub fn registered(controller_id: &str, node_id: i32, sensor: sensor::Model) -> Self {
        Self::new(
            controller_id,
            node_id,
            SensorWithLatest {
                sensor,
                latest_data: None,
                last_update: None,
            },
        )
    }
}

/// A single reading
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DataResponse {
    pub controller_id: String,
    pub node_id: i32,
    pub sensor_id: i32,
    #[schema(example = "21.5")]
    pub payload: String,
    #[schema(example = "2026-10-19T12:00:00Z")]
    pub created: DateTime<Utc>,
}

impl DataResponse {
    pub fn new(controller_id: &str, node_id: i32, sensor_id: i32, reading: data::Model) -> Self {
        Self {
            controller_id: controller_id.to_string(),
            node_id,
            sensor_id,
            payload: reading.payload,
            created: reading.created.with_timezone(&Utc),
        }
    }
}

impl From<DataRecord> for DataResponse {
    fn from(record: DataRecord) -> Self {
        Self {
            controller_id: record.controller_id,
            node_id: record.node_id,
            sensor_id: record.sensor_id,
            payload: record.payload,
            created: record.created.with_timezone(&Utc),
        }
    }
}
