//! Sensor data entity model
//!
//! Append-only readings. `created` is assigned by the server when the row is
//! written and is never updated afterwards.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// A single timestamped reading from a sensor
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sensor_data")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Surrogate key of the sensor that produced the reading
    pub sensor_ref: Uuid,

    /// Opaque payload, stored verbatim
    #[sea_orm(column_type = "Text")]
    pub payload: String,

    /// Write timestamp
    pub created: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sensor::Entity",
        from = "Column::SensorRef",
        to = "super::sensor::Column::Id"
    )]
    Sensor,
}

impl Related<super::sensor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sensor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
