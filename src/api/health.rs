// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Liveness report.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Seconds since the server started
    pub uptime: f64,
    pub message: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Deployment environment (`APP_ENV`)
    pub env: String,
    /// Chain RPC endpoint in use
    pub rpc_url: String,
    pub api_version: String,
    /// RFC 3339 server time
    pub server_time: String,
}

/// Health check endpoint handler.
///
/// Always returns 200 while the process is serving; the chain node is not
/// contacted.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = chrono::Utc::now();
    Json(HealthResponse {
        uptime: state.started_at.elapsed().as_secs_f64(),
        message: "OK".to_string(),
        timestamp: now.timestamp_millis(),
        env: state.config.app_env.clone(),
        rpc_url: state.config.rpc_url.clone(),
        api_version: env!("CARGO_PKG_VERSION").to_string(),
        server_time: now.to_rfc3339(),
    })
}
