//! # SensorHub API Library
//!
//! This library provides the core functionality for the SensorHub service:
//! the controller → node → sensor hierarchy, its readings, and the REST
//! surface over them.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod hierarchy;
pub mod models;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
