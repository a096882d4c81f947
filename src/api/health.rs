//! Health check and service information endpoints

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// "healthy" when the database answers, "unhealthy" otherwise
    pub status: String,
    /// Database probe result
    pub database: String,
    /// Version of the service
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct ApiInfo {
    pub message: String,
    pub version: String,
    pub docs_url: String,
    /// Resource name to collection path
    pub endpoints: BTreeMap<String, String>,
}

fn label(ok: bool) -> String {
    let label = if ok { "healthy" } else { "unhealthy" };
    label.to_string()
}

/// Health check endpoint (probes database connectivity)
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and database status", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = state.services.health.database_ok().await;
    Json(HealthResponse {
        status: label(database_ok),
        database: label(database_ok),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Service information
#[utoipa::path(
    get,
    path = "/",
    tag = "health",
    responses(
        (status = 200, description = "API name, version and entry points", body = ApiInfo)
    )
)]
pub async fn api_info() -> Json<ApiInfo> {
    let endpoints = ["books", "members", "loans", "categories", "authors", "publishers", "stats"]
        .into_iter()
        .map(|name| (name.to_string(), format!("/api/{}", name)))
        .collect();

    Json(ApiInfo {
        message: "Library Management System API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        docs_url: "/swagger-ui".to_string(),
        endpoints,
    })
}
