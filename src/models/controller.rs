//! Controller entity model
//!
//! This module contains the SeaORM entity model for the controllers table,
//! the root of every user's sensor hierarchy.

use std::fmt;

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Controller entity representing a registered gateway device
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "controllers")]
pub struct Model {
    /// Surrogate key (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Public controller token, unique per owner (40 hex characters when server-generated)
    pub controller_id: String,

    /// Identity of the owning user
    pub owner_id: Uuid,

    /// Display name, unique per owner
    pub name: String,

    /// Free-form location description
    pub location: String,

    /// Timestamp when the controller was registered
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::node::Entity")]
    Node,
}

impl Related<super::node::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Node.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}
