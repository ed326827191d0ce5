/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "store": "connected"
/// }
/// ```
///
/// `store` is `connected` or `disconnected` for PostgreSQL and `memory` when
/// the server runs on the in-memory store; a disconnected database reports
/// `degraded`.

use crate::app::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use taskman_shared::db::pool::{health_check as database_health, pool_stats, PoolStats};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,

    pub version: String,

    pub store: String,

    /// Connection counts, PostgreSQL only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStats>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = match &state.db {
        Some(pool) => match database_health(pool).await {
            Ok(()) => "connected",
            Err(err) => {
                tracing::warn!(error = %err, "Database health check failed");
                "disconnected"
            }
        },
        None => "memory",
    };

    Json(HealthResponse {
        status: if store == "disconnected" {
            "degraded".to_string()
        } else {
            "healthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: store.to_string(),
        pool: state.db.as_ref().map(pool_stats),
    })
}
