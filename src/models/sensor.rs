//! Sensor entity model
//!
//! This module contains the SeaORM entity model for the sensors table.
//! A sensor is a single measurement channel on a node.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Sensor entity representing one measurement channel
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sensors")]
pub struct Model {
    /// Surrogate key (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Surrogate key of the owning node
    pub node_ref: Uuid,

    /// Caller-assigned sensor number, unique within the node
    pub sensor_id: i32,

    /// Display name
    pub name: String,

    /// Free-form sensor type (e.g. "temp", "humidity")
    pub sensor_type: String,

    /// Timestamp when the sensor was registered
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::node::Entity",
        from = "Column::NodeRef",
        to = "super::node::Column::Id"
    )]
    Node,
    #[sea_orm(has_many = "super::data::Entity")]
    Data,
}

impl Related<super::node::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Node.def()
    }
}

impl Related<super::data::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Data.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
