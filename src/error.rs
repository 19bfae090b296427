//! Error types and HTTP error response handling.
//!
//! This module defines all ledger errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::models::category::CategoryKind;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Not found**: an account, transaction or category is absent or owned by someone else
/// - **Invalid argument**: malformed or conflicting input, detected before any mutation
/// - **Failed precondition**: the request is well formed but the ledger state forbids it
/// - **Permission denied**: system-owned data cannot be modified by users
/// - **Internal**: storage faults and broken ledger assumptions
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The `X-User-Id` header is missing or not a positive integer.
    #[error("Missing or invalid owner")]
    MissingOwner,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    /// Request body or parameters are invalid.
    ///
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    #[error("Cannot delete default account")]
    DefaultAccount,

    #[error("Cannot delete account with non-zero balance")]
    NonZeroBalance,

    #[error("Cannot delete system category")]
    SystemCategory,

    /// The seeded fallback category for a kind is missing, so reassignment is impossible.
    #[error("Fallback category for {0} is missing")]
    FallbackCategoryMissing(CategoryKind),

    /// A stored row violates a ledger invariant.
    #[error("Corrupted ledger data: {0}")]
    Corrupted(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidRequest(message.into())
    }

    /// HTTP status, error code and client-facing message for this error.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::MissingOwner => (StatusCode::UNAUTHORIZED, "missing_owner", self.to_string()),
            AppError::AccountNotFound => {
                (StatusCode::NOT_FOUND, "account_not_found", self.to_string())
            }
            AppError::TransactionNotFound => (
                StatusCode::NOT_FOUND,
                "transaction_not_found",
                self.to_string(),
            ),
            AppError::CategoryNotFound => {
                (StatusCode::NOT_FOUND, "category_not_found", self.to_string())
            }
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::DefaultAccount => {
                (StatusCode::CONFLICT, "default_account", self.to_string())
            }
            AppError::NonZeroBalance => {
                (StatusCode::CONFLICT, "non_zero_balance", self.to_string())
            }
            AppError::SystemCategory => {
                (StatusCode::FORBIDDEN, "system_category", self.to_string())
            }
            AppError::Database(_)
            | AppError::FallbackCategoryMissing(_)
            | AppError::Corrupted(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Internal errors hide their details from the client and are logged instead.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, code, "request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        for err in [
            AppError::AccountNotFound,
            AppError::TransactionNotFound,
            AppError::CategoryNotFound,
        ] {
            assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn guarded_deletes_map_to_conflict_and_forbidden() {
        assert_eq!(
            AppError::DefaultAccount.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::NonZeroBalance.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::SystemCategory.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let (status, code, message) =
            AppError::FallbackCategoryMissing(CategoryKind::Expense).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "internal_error");
        assert!(!message.contains("expense"));

        let (status, _, _) = AppError::Database(sqlx::Error::RowNotFound).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_request_keeps_its_message() {
        let (status, code, message) = AppError::invalid("amount must be positive").parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "invalid_request");
        assert_eq!(message, "amount must be positive");
    }

    #[test]
    fn missing_owner_is_unauthorized() {
        assert_eq!(
            AppError::MissingOwner.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
