//! Account data models and API request/response types.
//!
//! This module defines:
//! - `Account`: Database entity representing an account
//! - `CreateAccountRequest` / `UpdateAccountRequest`: Request bodies
//! - `AccountResponse`: Response body returned to clients

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Name given to the default account created for a new owner.
pub const DEFAULT_ACCOUNT_NAME: &str = "Main";

/// Represents an account record from the database.
///
/// # Balance Storage
///
/// Balances are `NUMERIC` in PostgreSQL and `Decimal` here, so every delta is
/// applied exactly. The balance equals the initial balance plus the signed
/// effect of every transaction currently referencing the account.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Account {
    pub id: i64,

    /// Owner of the account, already resolved by the gateway
    pub user_id: i64,

    pub name: String,

    /// Currency code, copied onto every transaction written against the account
    pub currency: String,

    pub balance: Decimal,

    /// Archived accounts are hidden from listings but stay readable so that
    /// historical transactions can still be rolled back against them.
    pub is_archived: bool,

    /// Exactly one active account per owner carries this flag.
    pub is_default: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Savings",
///   "currency": "RUB",
///   "balance": "1500.00"
/// }
/// ```
///
/// # Validation
///
/// - `name`: Required, non-empty and unused among the owner's active accounts
/// - `currency`: Optional, defaults to "RUB"
/// - `balance`: Optional, defaults to zero
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub balance: Option<String>,
}

/// Request body for renaming an account and resetting its balance.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: String,

    #[serde(default)]
    pub balance: Option<String>,
}

/// Request body for `POST /api/v1/accounts/default`.
#[derive(Debug, Deserialize)]
pub struct EnsureDefaultAccountRequest {
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Default currency value when not specified in request.
pub fn default_currency() -> String {
    "RUB".to_string()
}

/// Response body for account endpoints.
///
/// ```json
/// {
///   "id": 7,
///   "name": "Main",
///   "currency": "RUB",
///   "balance": "70.00",
///   "is_archived": false,
///   "is_default": true,
///   "created_at": "2025-12-20T10:00:00Z",
///   "updated_at": "2025-12-20T10:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub name: String,
    pub currency: String,
    pub balance: Decimal,
    pub is_archived: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Drops the internal `user_id`; the caller already knows who they are.
impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            currency: account.currency,
            balance: account.balance,
            is_archived: account.is_archived,
            is_default: account.is_default,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Response body of `GET /api/v1/balance`.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub accounts: Vec<AccountResponse>,
}
