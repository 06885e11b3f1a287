//! Migration to create the sensors table.
//!
//! Sensors are unique per `(node_ref, sensor_id)`; `sensor_type` is indexed
//! for the by-type listing and the distinct-type lookup.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sensors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sensors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sensors::NodeRef).uuid().not_null())
                    .col(ColumnDef::new(Sensors::SensorId).integer().not_null())
                    .col(ColumnDef::new(Sensors::Name).string_len(250).not_null())
                    .col(
                        ColumnDef::new(Sensors::SensorType)
                            .string_len(250)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Sensors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensors_node_ref")
                            .from(Sensors::Table, Sensors::NodeRef)
                            .to(Nodes::Table, Nodes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sensors_node_sensor_id")
                    .table(Sensors::Table)
                    .col(Sensors::NodeRef)
                    .col(Sensors::SensorId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_sensors_sensor_type")
                    .table(Sensors::Table)
                    .col(Sensors::SensorType)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_sensors_sensor_type").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_sensors_node_sensor_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Sensors::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Sensors {
    Table,
    Id,
    NodeRef,
    SensorId,
    Name,
    SensorType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Nodes {
    Table,
    Id,
}
