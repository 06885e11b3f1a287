//! Migration to create the nodes table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Nodes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Nodes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Nodes::ControllerRef).uuid().not_null())
                    .col(ColumnDef::new(Nodes::NodeId).integer().not_null())
                    .col(ColumnDef::new(Nodes::Name).string_len(250).not_null())
                    .col(
                        ColumnDef::new(Nodes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_nodes_controller_ref")
                            .from(Nodes::Table, Nodes::ControllerRef)
                            .to(Controllers::Table, Controllers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A node id is only meaningful inside its controller
        manager
            .create_index(
                Index::create()
                    .name("idx_nodes_controller_node_id")
                    .table(Nodes::Table)
                    .col(Nodes::ControllerRef)
                    .col(Nodes::NodeId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_nodes_controller_node_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Nodes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Nodes {
    Table,
    Id,
    ControllerRef,
    NodeId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Controllers {
    Table,
    Id,
}
