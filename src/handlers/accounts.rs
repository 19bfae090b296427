//! Account management HTTP handlers.
//!
//! This module implements the account-related API endpoints:
//! - POST /api/v1/accounts - Open an account
//! - GET /api/v1/accounts - List active accounts
//! - PUT /api/v1/accounts/{id} - Rename an account, optionally overwrite its balance
//! - DELETE /api/v1/accounts/{id} - Archive an empty, non-default account
//! - POST /api/v1/accounts/default - Get or create the default account
//! - GET /api/v1/balance - Balances of all active accounts

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    db::DbPool,
    error::AppError,
    handlers::StatusResponse,
    middleware::owner::OwnerContext,
    models::{
        account::{
            AccountResponse, BalanceResponse, CreateAccountRequest, EnsureDefaultAccountRequest,
            UpdateAccountRequest, default_currency,
        },
        money::parse_balance,
    },
    services::ledger_service,
};

/// Open a new account.
///
/// # Request Body
///
/// ```json
/// { "name": "Savings", "currency": "RUB", "balance": "1500.00" }
/// ```
///
/// # Response
///
/// - **201 Created**: the new account. The owner's first account becomes the default.
/// - **400**: empty or duplicate name, malformed balance or currency
pub async fn create_account(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let balance = parse_balance(request.balance.as_deref())?;

    let account = ledger_service::create_account(
        &pool,
        owner.user_id,
        &request.name,
        &request.currency,
        balance,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// List active accounts, the default one first.
pub async fn list_accounts(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let accounts = ledger_service::list_accounts(&pool, owner.user_id).await?;

    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

/// Rename an account. A `balance` in the body overwrites the stored balance.
pub async fn update_account(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Path(account_id): Path<i64>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let balance = request
        .balance
        .as_deref()
        .map(|raw| parse_balance(Some(raw)))
        .transpose()?;

    let account =
        ledger_service::update_account(&pool, owner.user_id, account_id, &request.name, balance)
            .await?;

    Ok(Json(account.into()))
}

/// Archive an account.
///
/// # Response
///
/// - **200 OK**: `{"status": "ok"}`
/// - **404**: not found or already archived
/// - **409**: default account, or balance not exactly zero
pub async fn delete_account(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Path(account_id): Path<i64>,
) -> Result<Json<StatusResponse>, AppError> {
    ledger_service::delete_account(&pool, owner.user_id, account_id).await?;

    Ok(StatusResponse::ok())
}

/// Return the default account, creating an empty "Main" account if missing.
///
/// The body is optional; without one the currency defaults to RUB.
pub async fn ensure_default_account(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    request: Option<Json<EnsureDefaultAccountRequest>>,
) -> Result<Json<AccountResponse>, AppError> {
    let currency = request
        .map(|Json(request)| request.currency)
        .unwrap_or_else(default_currency);

    let account = ledger_service::ensure_default_account(&pool, owner.user_id, &currency).await?;

    Ok(Json(account.into()))
}

pub async fn get_balance(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
) -> Result<Json<BalanceResponse>, AppError> {
    let accounts = ledger_service::get_balance(&pool, owner.user_id).await?;

    Ok(Json(BalanceResponse {
        accounts: accounts.into_iter().map(Into::into).collect(),
    }))
}
