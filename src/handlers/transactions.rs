//! Transaction HTTP handlers.
//!
//! This module implements transaction-related API endpoints:
//! - POST /api/v1/transactions/expense - Spend from an account
//! - POST /api/v1/transactions/income - Receive into an account
//! - POST /api/v1/transactions/transfer - Move money between accounts
//! - GET /api/v1/transactions - List transactions for a period
//! - GET /api/v1/transactions/{id} - Get transaction details
//! - PUT /api/v1/transactions/{id} - Amend a transaction
//! - DELETE /api/v1/transactions/{id} - Remove a transaction

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    db::DbPool,
    error::AppError,
    handlers::StatusResponse,
    middleware::owner::OwnerContext,
    models::{
        period::{Period, resolve_limit},
        transaction::{
            EntryRequest, ListTransactionsQuery, NewEntry, NewTransfer, TransactionEdit,
            TransactionListItem, TransactionResponse, TransferRequest, TransferResponse,
            UpdateTransactionRequest,
        },
    },
    services::ledger_service,
};

/// Record an expense.
///
/// # Request Body
///
/// ```json
/// {
///   "account_id": 7,
///   "amount": "30.00",
///   "category_id": 3,
///   "description": "Lunch"
/// }
/// ```
///
/// # Response (201)
///
/// ```json
/// { "transaction_id": 12, "account_balance": "70.00", "status": "ok" }
/// ```
pub async fn create_expense(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let entry = NewEntry::try_from(request)?;
    let (transaction, balance) =
        ledger_service::create_expense(&pool, owner.user_id, entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            transaction_id: transaction.id,
            account_balance: balance,
            status: "ok",
        }),
    ))
}

/// Record an income. Same body and response as [`create_expense`].
pub async fn create_income(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Json(request): Json<EntryRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    let entry = NewEntry::try_from(request)?;
    let (transaction, balance) = ledger_service::create_income(&pool, owner.user_id, entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            transaction_id: transaction.id,
            account_balance: balance,
            status: "ok",
        }),
    ))
}

/// Transfer money between two of the caller's accounts.
///
/// # Validation
///
/// - `from_account_id` and `to_account_id` must differ
/// - both accounts must be active
/// - `amount` must be positive
pub async fn create_transfer(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Json(request): Json<TransferRequest>,
) -> Result<(StatusCode, Json<TransferResponse>), AppError> {
    let transfer = NewTransfer::try_from(request)?;
    let (transaction, from_balance, to_balance) =
        ledger_service::create_transfer(&pool, owner.user_id, transfer).await?;

    Ok((
        StatusCode::CREATED,
        Json(TransferResponse {
            transaction_id: transaction.id,
            from_account_balance: from_balance,
            to_account_balance: to_balance,
            status: "ok",
        }),
    ))
}

/// List transactions, newest operation date first.
///
/// # Query Parameters
///
/// - `period`: `today`, `week`, `month`, `year`, `period` or `all` (default)
/// - `start_date`, `end_date`: inclusive bounds for `period=period`
/// - `limit`: defaults to 10
pub async fn list_transactions(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<Vec<TransactionListItem>>, AppError> {
    let period = Period::parse(
        query.period.as_deref(),
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    );
    let limit = resolve_limit(query.limit);

    let rows = ledger_service::list_transactions(&pool, owner.user_id, period, limit).await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

pub async fn get_transaction(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<TransactionListItem>, AppError> {
    let details = ledger_service::get_transaction(&pool, owner.user_id, transaction_id).await?;

    Ok(Json(details.into()))
}

/// Amend a transaction. Its balance effect is rolled back and reapplied.
///
/// Omitting `category_id` clears the category; omitting `related_account_id`
/// keeps a transfer's destination.
pub async fn update_transaction(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Path(transaction_id): Path<i64>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let edit = TransactionEdit::try_from(request)?;
    let (transaction, balance) =
        ledger_service::update_transaction(&pool, owner.user_id, transaction_id, edit).await?;

    Ok(Json(TransactionResponse {
        transaction_id: transaction.id,
        account_balance: balance,
        status: "ok",
    }))
}

pub async fn delete_transaction(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<StatusResponse>, AppError> {
    ledger_service::delete_transaction(&pool, owner.user_id, transaction_id).await?;

    Ok(StatusResponse::ok())
}
