//! Owner resolution middleware.
//!
//! The gateway in front of this service resolves the end user and forwards
//! their internal id in the `X-User-Id` header. This middleware:
//! 1. Reads and parses the header
//! 2. Injects an [`OwnerContext`] into the request
//! 3. Rejects requests without a usable owner with HTTP 401

use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::AppError;

/// Header carrying the resolved owner id.
pub const OWNER_HEADER: &str = "x-user-id";

/// Owner of the request, available to handlers as `Extension<OwnerContext>`.
///
/// Every store query filters by this id, so data of other owners is reported
/// as not found.
#[derive(Debug, Clone, Copy)]
pub struct OwnerContext {
    pub user_id: i64,
}

/// Resolve the owner from `X-User-Id: <positive integer>`.
///
/// # Returns
///
/// - `Ok(Response)` from the next handler when the header is valid
/// - `Err(AppError::MissingOwner)` (401) when it is missing or malformed
pub async fn owner_middleware(mut request: Request, next: Next) -> Result<Response, AppError> {
    let user_id = request
        .headers()
        .get(OWNER_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_owner)
        .ok_or(AppError::MissingOwner)?;

    request.extensions_mut().insert(OwnerContext { user_id });

    Ok(next.run(request).await)
}

fn parse_owner(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}
