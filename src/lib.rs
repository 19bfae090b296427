//! Personal finance ledger service.
//!
//! Tracks a user's accounts, categorized transactions and running balances,
//! keeping every balance equal to its initial value plus the signed effect
//! of the transactions that reference it.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx, one database transaction per operation
//! - **Identity**: owner id forwarded by the gateway in `X-User-Id`
//! - **Money**: `rust_decimal::Decimal`, serialized as strings

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::db::DbPool;

/// Build the HTTP router with all routes and middleware.
pub fn router(pool: DbPool) -> Router {
    // Routes that act on behalf of an owner
    let owned_routes = Router::new()
        // Accounts
        .route(
            "/api/v1/accounts",
            post(handlers::accounts::create_account).get(handlers::accounts::list_accounts),
        )
        .route(
            "/api/v1/accounts/default",
            post(handlers::accounts::ensure_default_account),
        )
        .route(
            "/api/v1/accounts/{id}",
            put(handlers::accounts::update_account).delete(handlers::accounts::delete_account),
        )
        .route("/api/v1/balance", get(handlers::accounts::get_balance))
        // Categories
        .route(
            "/api/v1/categories",
            post(handlers::categories::create_category)
                .get(handlers::categories::list_categories),
        )
        .route(
            "/api/v1/categories/{id}",
            delete(handlers::categories::delete_category),
        )
        // Transactions
        .route(
            "/api/v1/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/api/v1/transactions/expense",
            post(handlers::transactions::create_expense),
        )
        .route(
            "/api/v1/transactions/income",
            post(handlers::transactions::create_income),
        )
        .route(
            "/api/v1/transactions/transfer",
            post(handlers::transactions::create_transfer),
        )
        .route(
            "/api/v1/transactions/{id}",
            get(handlers::transactions::get_transaction)
                .put(handlers::transactions::update_transaction)
                .delete(handlers::transactions::delete_transaction),
        )
        // Statistics
        .route("/api/v1/stats/overview", get(handlers::stats::overview))
        .route("/api/v1/stats/categories", get(handlers::stats::by_category))
        .route_layer(axum_middleware::from_fn(
            middleware::owner::owner_middleware,
        ));

    Router::new()
        // Public routes (no owner required)
        .route("/health", get(handlers::health::health_check))
        .merge(owned_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(pool)
}
