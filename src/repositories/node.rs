//! # Node Repository
//!
//! Nodes are numbered by the caller and unique within their controller.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::hierarchy::find_node;
use crate::models::controller;
use crate::models::node::{self, ActiveModel as NodeActiveModel, Entity as Node};

use super::{MAX_NAME_LEN, optional_text};

/// Repository for node database operations
pub struct NodeRepository<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> NodeRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Create node `node_id` under `controller`
    ///
    /// Without a name the node is called `New Node #<n>`, where `n` is one
    /// more than the number of nodes the controller already has. The default
    /// is advisory and may repeat.
    pub async fn create(
        &self,
        controller: &controller::Model,
        node_id: i32,
        name: Option<&str>,
    ) -> Result<node::Model, RepositoryError> {
        let name = match optional_text("name", name, MAX_NAME_LEN)? {
            Some(name) => name,
            None => self.default_name(controller).await?,
        };

        let node = NodeActiveModel {
            id: Set(Uuid::new_v4()),
            controller_ref: Set(controller.id),
            node_id: Set(node_id),
            name: Set(name),
            created_at: Set(Utc::now().into()),
        };

        node.insert(self.db).await.map_err(|e| {
            RepositoryError::from_write(e, &format!("Node {} already exists", node_id))
        })
    }

    /// Get node `node_id` under `controller`
    pub async fn get(
        &self,
        controller: &controller::Model,
        node_id: i32,
    ) -> Result<node::Model, RepositoryError> {
        find_node(self.db, controller, node_id).await
    }

    /// List the nodes of `controller` ordered by node number
    pub async fn list(
        &self,
        controller: &controller::Model,
    ) -> Result<Vec<node::Model>, RepositoryError> {
        let nodes = Node::find()
            .filter(node::Column::ControllerRef.eq(controller.id))
            .order_by_asc(node::Column::NodeId)
            .all(self.db)
            .await?;

        Ok(nodes)
    }

    async fn default_name(&self, controller: &controller::Model) -> Result<String, RepositoryError> {
        let existing = Node::find()
            .filter(node::Column::ControllerRef.eq(controller.id))
            .count(self.db)
            .await?;

        Ok(format!("New Node #{}", existing + 1))
    }
}

/// Display form of a node, used inside default sensor names
pub fn describe_node(controller: &controller::Model, node: &node::Model) -> String {
    format!("{} - [{}] {}", controller, node.node_id, node.name)
}
