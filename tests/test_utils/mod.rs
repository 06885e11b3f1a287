//! Test utilities for API testing.
//!
//! This module provides an in-memory SQLite database with migrations applied
//! and a router wired with two known users.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sensorhub::{
    config::{AppConfig, ApiTokenBinding},
    server::{AppState, create_app},
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB_TOKEN: &str = "bob-token";
pub const ALICE: Uuid = Uuid::from_u128(0xa11ce);
pub const BOB: Uuid = Uuid::from_u128(0xb0b);

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        api_tokens: vec![
            ApiTokenBinding {
                token: ALICE_TOKEN.to_string(),
                user_id: ALICE,
            },
            ApiTokenBinding {
                token: BOB_TOKEN.to_string(),
                user_id: BOB,
            },
        ],
        ..Default::default()
    }
}

/// Router over a fresh database, authenticated by [`ALICE_TOKEN`] and [`BOB_TOKEN`]
pub async fn test_app() -> Result<Router> {
    let db = setup_test_db().await?;
    Ok(create_app(AppState::new(&test_config(), db)))
}

/// Send a request and decode the JSON body (Null for empty bodies)
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Response<()>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (parts.status, Response::from_parts(parts, ()), json)
}

pub async fn get(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let (status, _, json) = send(app, "GET", uri, Some(token), None).await;
    (status, json)
}

pub async fn post(app: &Router, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
    let (status, _, json) = send(app, "POST", uri, Some(token), Some(body)).await;
    (status, json)
}
