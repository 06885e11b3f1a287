//! # Sensor Repository
//!
//! Sensors are numbered within their node. Reads attach the newest reading of
//! each sensor, fetched in one batched lookup per listing.

use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::auth::UserId;
use crate::error::RepositoryError;
use crate::hierarchy::find_sensor;
use crate::models::sensor::{self, ActiveModel as SensorActiveModel, Entity as Sensor};
use crate::models::{controller, data, node};

use super::node::describe_node;
use super::{MAX_NAME_LEN, optional_text, require_text};

/// Request data for registering a sensor
#[derive(Debug, Clone)]
pub struct NewSensor {
    pub sensor_id: i32,
    pub sensor_type: String,
    pub name: Option<String>,
}

/// A sensor with its newest reading, if it has any
#[derive(Debug, Clone, PartialEq)]
pub struct SensorWithLatest {
    pub sensor: sensor::Model,
    pub latest_data: Option<String>,
    pub last_update: Option<DateTimeWithTimeZone>,
}

impl SensorWithLatest {
    fn new(sensor: sensor::Model, latest: Option<&data::Model>) -> Self {
        Self {
            latest_data: latest.map(|row| row.payload.clone()),
            last_update: latest.map(|row| row.created),
            sensor,
        }
    }
}

/// A sensor together with the public ids of its controller and node
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedSensor {
    pub controller_id: String,
    pub node_id: i32,
    pub sensor: SensorWithLatest,
}

#[derive(Debug, FromQueryResult)]
struct LocatedSensorRow {
    controller_id: String,
    node_id: i32,
    id: Uuid,
    node_ref: Uuid,
    sensor_id: i32,
    name: String,
    sensor_type: String,
    created_at: DateTimeWithTimeZone,
}

/// Repository for sensor database operations
pub struct SensorRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> SensorRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Register a sensor on `node`
    ///
    /// The default name numbers sensors per type, so a second "temp" sensor on
    /// a node becomes `... temp sensor #2` regardless of its `sensor_id`.
    pub async fn create(
        &self,
        controller: &controller::Model,
        node: &node::Model,
        request: NewSensor,
    ) -> Result<sensor::Model, RepositoryError> {
        let sensor_type = require_text("sensor_type", &request.sensor_type, Some(MAX_NAME_LEN))?;
        let name = match optional_text("name", request.name.as_deref(), MAX_NAME_LEN)? {
            Some(name) => name,
            None => {
                let same_type = Sensor::find()
                    .filter(sensor::Column::NodeRef.eq(node.id))
                    .filter(sensor::Column::SensorType.eq(sensor_type.as_str()))
                    .count(self.db)
                    .await?;
                format!(
                    "New Node {}: {} sensor #{}",
                    describe_node(controller, node),
                    sensor_type,
                    same_type + 1
                )
            }
        };

        let sensor = SensorActiveModel {
            id: Set(Uuid::new_v4()),
            node_ref: Set(node.id),
            sensor_id: Set(request.sensor_id),
            name: Set(name),
            sensor_type: Set(sensor_type),
            created_at: Set(Utc::now().into()),
        };

        sensor.insert(self.db).await.map_err(|e| {
            RepositoryError::from_write(
                e,
                &format!("Sensor {} already exists", request.sensor_id),
            )
        })
    }

    /// Get sensor `sensor_id` on `node` with its newest reading
    pub async fn get(
        &self,
        node: &node::Model,
        sensor_id: i32,
    ) -> Result<SensorWithLatest, RepositoryError> {
        let sensor = find_sensor(self.db, node, sensor_id).await?;
        let latest = self.latest_for(&[sensor.id]).await?;

        Ok(SensorWithLatest::new(sensor.clone(), latest.get(&sensor.id)))
    }

    /// List the sensors on `node` ordered by sensor number
    pub async fn list(&self, node: &node::Model) -> Result<Vec<SensorWithLatest>, RepositoryError> {
        let sensors = Sensor::find()
            .filter(sensor::Column::NodeRef.eq(node.id))
            .order_by_asc(sensor::Column::SensorId)
            .all(self.db)
            .await?;

        let ids: Vec<Uuid> = sensors.iter().map(|s| s.id).collect();
        let latest = self.latest_for(&ids).await?;

        Ok(sensors
            .into_iter()
            .map(|sensor| {
                let newest = latest.get(&sensor.id);
                SensorWithLatest::new(sensor, newest)
            })
            .collect())
    }

    /// Every sensor of `sensor_type` in controllers owned by `owner`
    pub async fn list_by_type(
        &self,
        owner: &UserId,
        sensor_type: &str,
    ) -> Result<Vec<LocatedSensor>, RepositoryError> {
        let rows = Sensor::find()
            .select_only()
            .column_as(controller::Column::ControllerId, "controller_id")
            .column_as(node::Column::NodeId, "node_id")
            .column_as(sensor::Column::Id, "id")
            .column_as(sensor::Column::NodeRef, "node_ref")
            .column_as(sensor::Column::SensorId, "sensor_id")
            .column_as(sensor::Column::Name, "name")
            .column_as(sensor::Column::SensorType, "sensor_type")
            .column_as(sensor::Column::CreatedAt, "created_at")
            .join(JoinType::InnerJoin, sensor::Relation::Node.def())
            .join(JoinType::InnerJoin, node::Relation::Controller.def())
            .filter(controller::Column::OwnerId.eq(owner.0))
            .filter(sensor::Column::SensorType.eq(sensor_type))
            .order_by_asc(controller::Column::CreatedAt)
            .order_by_asc(controller::Column::Id)
            .order_by_asc(node::Column::NodeId)
            .order_by_asc(sensor::Column::SensorId)
            .into_model::<LocatedSensorRow>()
            .all(self.db)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let latest = self.latest_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let newest = latest.get(&row.id);
                LocatedSensor {
                    controller_id: row.controller_id,
                    node_id: row.node_id,
                    sensor: SensorWithLatest::new(
                        sensor::Model {
                            id: row.id,
                            node_ref: row.node_ref,
                            sensor_id: row.sensor_id,
                            name: row.name,
                            sensor_type: row.sensor_type,
                            created_at: row.created_at,
                        },
                        newest,
                    ),
                }
            })
            .collect())
    }

    /// Distinct sensor types used anywhere under `controller`, sorted
    pub async fn distinct_types(
        &self,
        controller: &controller::Model,
    ) -> Result<Vec<String>, RepositoryError> {
        let types: Vec<String> = Sensor::find()
            .select_only()
            .column(sensor::Column::SensorType)
            .distinct()
            .join(JoinType::InnerJoin, sensor::Relation::Node.def())
            .filter(node::Column::ControllerRef.eq(controller.id))
            .into_tuple()
            .all(self.db)
            .await?;

        Ok(types.into_iter().collect::<BTreeSet<_>>().into_iter().collect())
    }

    /// Newest reading per sensor for `sensor_ids`, in two queries whatever the count
    pub async fn latest_for(
        &self,
        sensor_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, data::Model>, RepositoryError> {
        if sensor_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let newest: Vec<(Uuid, DateTimeWithTimeZone)> = data::Entity::find()
            .select_only()
            .column(data::Column::SensorRef)
            .column_as(Expr::col(data::Column::Created).max(), "created")
            .filter(data::Column::SensorRef.is_in(sensor_ids.iter().copied()))
            .group_by(data::Column::SensorRef)
            .into_tuple()
            .all(self.db)
            .await?;

        if newest.is_empty() {
            return Ok(HashMap::new());
        }

        let condition = newest
            .iter()
            .fold(Condition::any(), |condition, (sensor_ref, created)| {
                condition.add(
                    Condition::all()
                        .add(data::Column::SensorRef.eq(*sensor_ref))
                        .add(data::Column::Created.eq(*created)),
                )
            });

        let rows = data::Entity::find()
            .filter(condition)
            .order_by_asc(data::Column::Created)
            .order_by_asc(data::Column::Id)
            .all(self.db)
            .await?;

        // Rows sharing the newest timestamp resolve to the last one by id.
        Ok(rows.into_iter().map(|row| (row.sensor_ref, row)).collect())
    }
}
