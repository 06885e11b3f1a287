//! Node entity model

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Node entity representing a physical unit attached to a controller
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "nodes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Surrogate key of the owning controller
    pub controller_ref: Uuid,

    /// Caller-assigned node number, unique within the controller
    pub node_id: i32,

    pub name: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::controller::Entity",
        from = "Column::ControllerRef",
        to = "super::controller::Column::Id"
    )]
    Controller,
    #[sea_orm(has_many = "super::sensor::Entity")]
    Sensor,
}

impl Related<super::controller::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Controller.def()
    }
}

impl Related<super::sensor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sensor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
