//! Migration to create the controllers table.
//!
//! Controllers are the root of a user's sensor hierarchy. Both the public
//! `controller_id` and the name are unique per owner, which lets the store
//! arbitrate generated-id collisions without one user's ids affecting another's.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Controllers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Controllers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Controllers::ControllerId)
                            .string_len(40)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Controllers::OwnerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Controllers::Name)
                            .string_len(250)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Controllers::Location).text().not_null())
                    .col(
                        ColumnDef::new(Controllers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_controllers_owner_controller_id")
                    .table(Controllers::Table)
                    .col(Controllers::OwnerId)
                    .col(Controllers::ControllerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_controllers_owner_name")
                    .table(Controllers::Table)
                    .col(Controllers::OwnerId)
                    .col(Controllers::Name)
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
                    .name("idx_controllers_owner_name")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_controllers_owner_controller_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Controllers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Controllers {
    Table,
    Id,
    ControllerId,
    OwnerId,
    Name,
    Location,
    CreatedAt,
}
