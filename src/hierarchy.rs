//! # Hierarchy Resolver
//!
//! Resolves `(user, controller_id[, node_id[, sensor_id]])` one level at a
//! time. A controller is only ever looked up together with its owner, so a
//! controller belonging to someone else is indistinguishable from one that
//! does not exist. Every nested handler goes through here before touching
//! the entity repositories.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::auth::UserId;
use crate::error::RepositoryError;
use crate::models::{controller, node, sensor};

/// A node together with the controller it was resolved through
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub controller: controller::Model,
    pub node: node::Model,
}

/// A sensor together with its full ownership chain
#[derive(Debug, Clone)]
pub struct ResolvedSensor {
    pub controller: controller::Model,
    pub node: node::Model,
    pub sensor: sensor::Model,
}

/// Read-only resolver over any SeaORM connection or transaction
pub struct HierarchyResolver<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> HierarchyResolver<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Resolve a controller owned by `user`
    pub async fn controller(
        &self,
        user: &UserId,
        controller_id: &str,
    ) -> Result<controller::Model, RepositoryError> {
        controller::Entity::find()
            .filter(controller::Column::OwnerId.eq(user.0))
            .filter(controller::Column::ControllerId.eq(controller_id))
            .one(self.db)
            .await?
            .ok_or(RepositoryError::NotFound("controller"))
    }

    /// Resolve a node under a controller owned by `user`
    pub async fn node(
        &self,
        user: &UserId,
        controller_id: &str,
        node_id: i32,
    ) -> Result<ResolvedNode, RepositoryError> {
        let controller = self.controller(user, controller_id).await?;
        let node = find_node(self.db, &controller, node_id).await?;

        Ok(ResolvedNode { controller, node })
    }

    /// Resolve a sensor through the full `controller → node → sensor` chain
    pub async fn sensor(
        &self,
        user: &UserId,
        controller_id: &str,
        node_id: i32,
        sensor_id: i32,
    ) -> Result<ResolvedSensor, RepositoryError> {
        let ResolvedNode { controller, node } = self.node(user, controller_id, node_id).await?;
        let sensor = find_sensor(self.db, &node, sensor_id).await?;

        Ok(ResolvedSensor {
            controller,
            node,
            sensor,
        })
    }
}

/// Look up a node by its number within an already-resolved controller
pub(crate) async fn find_node<C: ConnectionTrait>(
    db: &C,
    controller: &controller::Model,
    node_id: i32,
) -> Result<node::Model, RepositoryError> {
    node::Entity::find()
        .filter(node::Column::ControllerRef.eq(controller.id))
        .filter(node::Column::NodeId.eq(node_id))
        .one(db)
        .await?
        .ok_or(RepositoryError::NotFound("node"))
}

/// Look up a sensor by its number within an already-resolved node
pub(crate) async fn find_sensor<C: ConnectionTrait>(
    db: &C,
    node: &node::Model,
    sensor_id: i32,
) -> Result<sensor::Model, RepositoryError> {
    sensor::Entity::find()
        .filter(sensor::Column::NodeRef.eq(node.id))
        .filter(sensor::Column::SensorId.eq(sensor_id))
        .one(db)
        .await?
        .ok_or(RepositoryError::NotFound("sensor"))
}
