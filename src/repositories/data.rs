//! # Data Repository
//!
//! Append-only readings. Listings are ordered by `created`, then `id`.

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use crate::auth::UserId;
use crate::error::RepositoryError;
use crate::hierarchy::{HierarchyResolver, ResolvedSensor};
use crate::models::data::{self, ActiveModel as DataActiveModel, Entity as SensorData};
use crate::models::{controller, node, sensor};

use super::require_text;

/// Length of the end day added to a range query
pub const SECONDS_PER_DAY: i64 = 86_400;

/// A reading together with the public ids of the sensor that produced it
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct DataRecord {
    pub controller_id: String,
    pub node_id: i32,
    pub sensor_id: i32,
    pub payload: String,
    pub created: DateTimeWithTimeZone,
}

/// Repository for sensor data operations
pub struct DataRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> DataRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Resolve the sensor through `owner`'s hierarchy and append a reading to it
    pub async fn record(
        &self,
        owner: &UserId,
        controller_id: &str,
        node_id: i32,
        sensor_id: i32,
        payload: &str,
    ) -> Result<(ResolvedSensor, data::Model), RepositoryError> {
        let resolved = HierarchyResolver::new(self.db)
            .sensor(owner, controller_id, node_id, sensor_id)
            .await?;
        let reading = self.append(&resolved.sensor, payload).await?;

        Ok((resolved, reading))
    }

    /// Append a reading to `sensor`, timestamped now
    ///
    /// The payload must not be blank but is otherwise stored verbatim.
    pub async fn append(
        &self,
        sensor: &sensor::Model,
        payload: &str,
    ) -> Result<data::Model, RepositoryError> {
        require_text("payload", payload, None)?;

        let reading = DataActiveModel {
            id: Set(Uuid::new_v4()),
            sensor_ref: Set(sensor.id),
            payload: Set(payload.to_string()),
            created: Set(Utc::now().into()),
        };

        Ok(reading.insert(self.db).await?)
    }

    /// Every reading of `sensor`, oldest first
    pub async fn list(&self, sensor: &sensor::Model) -> Result<Vec<data::Model>, RepositoryError> {
        let readings = SensorData::find()
            .filter(data::Column::SensorRef.eq(sensor.id))
            .order_by_asc(data::Column::Created)
            .order_by_asc(data::Column::Id)
            .all(self.db)
            .await?;

        Ok(readings)
    }

    /// Readings of `sensor` from `begin` through the whole day starting at `end`
    ///
    /// Both bounds are epoch seconds in UTC. The window is
    /// `[begin, end + 86400)`.
    pub async fn list_by_range(
        &self,
        sensor: &sensor::Model,
        begin: i64,
        end: i64,
    ) -> Result<Vec<data::Model>, RepositoryError> {
        let (from, until) = day_range(begin, end)?;

        let readings = SensorData::find()
            .filter(data::Column::SensorRef.eq(sensor.id))
            .filter(data::Column::Created.gte(from))
            .filter(data::Column::Created.lt(until))
            .order_by_asc(data::Column::Created)
            .order_by_asc(data::Column::Id)
            .all(self.db)
            .await?;

        Ok(readings)
    }

    /// Every reading in `owner`'s hierarchy, oldest first
    pub async fn list_all(&self, owner: &UserId) -> Result<Vec<DataRecord>, RepositoryError> {
        let records = SensorData::find()
            .select_only()
            .column_as(controller::Column::ControllerId, "controller_id")
            .column_as(node::Column::NodeId, "node_id")
            .column_as(sensor::Column::SensorId, "sensor_id")
            .column_as(data::Column::Payload, "payload")
            .column_as(data::Column::Created, "created")
            .join(JoinType::InnerJoin, data::Relation::Sensor.def())
            .join(JoinType::InnerJoin, sensor::Relation::Node.def())
            .join(JoinType::InnerJoin, node::Relation::Controller.def())
            .filter(controller::Column::OwnerId.eq(owner.0))
            .order_by_asc(data::Column::Created)
            .order_by_asc(data::Column::Id)
            .into_model::<DataRecord>()
            .all(self.db)
            .await?;

        Ok(records)
    }
}

/// Convert an inclusive epoch-second day range into a half-open UTC window
pub fn day_range(
    begin: i64,
    end: i64,
) -> Result<(DateTimeWithTimeZone, DateTimeWithTimeZone), RepositoryError> {
    if begin > end {
        return Err(RepositoryError::validation(
            "begin",
            "must not be after end",
        ));
    }

    let from = DateTime::<Utc>::from_timestamp(begin, 0)
        .ok_or_else(|| RepositoryError::validation("begin", "timestamp out of range"))?;
    let until = end
        .checked_add(SECONDS_PER_DAY)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or_else(|| RepositoryError::validation("end", "timestamp out of range"))?;

    Ok((from.fixed_offset(), until.fixed_offset()))
}
