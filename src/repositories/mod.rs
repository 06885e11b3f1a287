//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM operations
//! for the sensor hierarchy. Repositories are generic over [`sea_orm::ConnectionTrait`]
//! so the same code runs against the pool or inside a handler's transaction.

pub mod controller;
pub mod data;
pub mod node;
pub mod sensor;

pub use controller::{ControllerRepository, NewController};
pub use data::DataRepository;
pub use node::NodeRepository;
pub use sensor::{NewSensor, SensorRepository, SensorWithLatest};

use crate::error::RepositoryError;

/// Longest accepted name or sensor type
pub const MAX_NAME_LEN: usize = 250;

/// Trim `value` and reject it when blank or longer than `max` characters
pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max: Option<usize>,
) -> Result<String, RepositoryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation(field, "must not be blank"));
    }
    if let Some(max) = max {
        if trimmed.chars().count() > max {
            return Err(RepositoryError::validation(
                field,
                format!("must be at most {} characters", max),
            ));
        }
    }
    Ok(trimmed.to_string())
}

/// Like [`require_text`] for optional fields; absent stays absent
pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, RepositoryError> {
    value
        .map(|value| require_text(field, value, Some(max)))
        .transpose()
}

#[cfg(test)]
pub(crate) mod test_support {
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ConnectOptions, Database, DatabaseConnection};

    use super::*;
    use crate::auth::UserId;
    use crate::models::{controller, node, sensor};

    /// A controller with node 1 and temp sensor 1 beneath it
    pub struct SeededHierarchy {
        pub controller: controller::Model,
        pub node: node::Model,
        pub sensor: sensor::Model,
    }

    /// Fresh in-memory SQLite database with all migrations applied
    pub async fn setup_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).sqlx_logging(false);

        let db = Database::connect(options)
            .await
            .expect("Failed to connect to in-memory database");
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
        db
    }

    pub async fn create_controller(
        db: &DatabaseConnection,
        owner: &UserId,
        name: &str,
    ) -> controller::Model {
        ControllerRepository::new(db)
            .create(
                owner,
                NewController {
                    name: name.to_string(),
                    location: "Backyard".to_string(),
                    controller_id: None,
                },
            )
            .await
            .expect("Failed to create controller")
    }

    pub async fn seed_hierarchy(db: &DatabaseConnection, owner: &UserId) -> SeededHierarchy {
        let controller = create_controller(db, owner, "Greenhouse").await;
        let node = NodeRepository::new(db)
            .create(&controller, 1, None)
            .await
            .expect("Failed to create node");
        let sensor = SensorRepository::new(db)
            .create(
                &controller,
                &node,
                NewSensor {
                    sensor_id: 1,
                    sensor_type: "temp".to_string(),
                    name: None,
                },
            )
            .await
            .expect("Failed to create sensor");

        SeededHierarchy {
            controller,
            node,
            sensor,
        }
    }
}
