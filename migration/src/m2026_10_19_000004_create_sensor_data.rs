//! Migration to create the append-only sensor_data table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SensorData::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SensorData::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SensorData::SensorRef).uuid().not_null())
                    .col(ColumnDef::new(SensorData::Payload).text().not_null())
                    .col(
                        ColumnDef::new(SensorData::Created)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sensor_data_sensor_ref")
                            .from(SensorData::Table, SensorData::SensorRef)
                            .to(Sensors::Table, Sensors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Serves both the latest-reading lookup and time range scans
        manager
            .create_index(
                Index::create()
                    .name("idx_sensor_data_sensor_created")
                    .table(SensorData::Table)
                    .col(SensorData::SensorRef)
                    .col(SensorData::Created)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_sensor_data_sensor_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(SensorData::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SensorData {
    Table,
    Id,
    SensorRef,
    Payload,
    Created,
}

#[derive(DeriveIden)]
enum Sensors {
    Table,
    Id,
}
