//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives the owner from `OwnerContext` and the request data
//! 2. Parses input into validated domain values
//! 3. Calls the ledger service and maps the result to JSON

use axum::Json;
use serde::Serialize;

/// Account management endpoints
pub mod accounts;
/// Category endpoints
pub mod categories;
/// Health check endpoint
pub mod health;
/// Spending statistics endpoints
pub mod stats;
/// Transaction endpoints
pub mod transactions;

/// Body returned by delete endpoints.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Json<Self> {
        Json(Self { status: "ok" })
    }
}
