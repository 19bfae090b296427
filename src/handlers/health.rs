//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{db::DbPool, error::AppError};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    pub database: &'static str,

    /// Open pooled connections, idle ones included
    pub pool_size: u32,

    pub pool_idle: usize,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Verifies database connectivity with a trivial query. No owner is required.
///
/// ```json
/// {
///   "status": "healthy",
///   "database": "connected",
///   "pool_size": 3,
///   "pool_idle": 2,
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// An unreachable database yields the standard 500 error response.
pub async fn health_check(State(pool): State<DbPool>) -> Result<Json<HealthResponse>, AppError> {
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(Json(HealthResponse {
        status: "healthy",
        database: "connected",
        pool_size: pool.size(),
        pool_idle: pool.num_idle(),
        timestamp: Utc::now(),
    }))
}
