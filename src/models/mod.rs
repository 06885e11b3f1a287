//! # Data Models
//!
//! SeaORM entities for the sensor hierarchy plus small shared response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod controller;
pub mod data;
pub mod node;
pub mod sensor;

pub use controller::Entity as Controller;
pub use data::Entity as SensorData;
pub use node::Entity as Node;
pub use sensor::Entity as Sensor;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "sensorhub".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
