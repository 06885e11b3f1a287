//! Database migrations for the SensorHub API.
//!
//! One migration per table, applied in hierarchy order.

pub use sea_orm_migration::prelude::*;

mod m2026_10_19_000001_create_controllers;
mod m2026_10_19_000002_create_nodes;
mod m2026_10_19_000003_create_sensors;
mod m2026_10_19_000004_create_sensor_data;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_10_19_000001_create_controllers::Migration),
            Box::new(m2026_10_19_000002_create_nodes::Migration),
            Box::new(m2026_10_19_000003_create_sensors::Migration),
            Box::new(m2026_10_19_000004_create_sensor_data::Migration),
        ]
    }
}
