//! Account store.
//!
//! Every function takes any PostgreSQL executor, so it can run directly on the
//! pool or inside a transaction opened by the ledger service. Queries always
//! filter by owner where an owner is known, which turns "exists but belongs to
//! someone else" into "not found".

use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::models::account::Account;

/// Insert a new account.
pub async fn create<'e, E>(
    executor: E,
    user_id: i64,
    name: &str,
    currency: &str,
    balance: Decimal,
    is_default: bool,
) -> Result<Account, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (user_id, name, currency, balance, is_default)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(currency)
    .bind(balance)
    .bind(is_default)
    .fetch_one(executor)
    .await
}

/// Fetch an account by id and owner. Archived accounts are returned too.
pub async fn get<'e, E>(executor: E, id: i64, user_id: i64) -> Result<Option<Account>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Fetch and row-lock an account for the rest of the surrounding transaction.
///
/// FOR UPDATE makes concurrent balance mutations of the same account wait
/// for each other instead of interleaving.
pub async fn lock<'e, E>(executor: E, id: i64, user_id: i64) -> Result<Option<Account>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Active accounts of an owner: the default account first, then newest first.
pub async fn list<'e, E>(executor: E, user_id: i64) -> Result<Vec<Account>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        r#"
        SELECT *
        FROM accounts
        WHERE user_id = $1 AND NOT is_archived
        ORDER BY is_default DESC, created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn find_default<'e, E>(executor: E, user_id: i64) -> Result<Option<Account>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        "SELECT * FROM accounts WHERE user_id = $1 AND is_default AND NOT is_archived",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Whether an active account of the owner already uses `name`.
///
/// This is advisory; `uq_accounts_active_name` is what actually enforces it.
pub async fn name_taken<'e, E>(
    executor: E,
    user_id: i64,
    name: &str,
    excluding: Option<i64>,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM accounts
            WHERE user_id = $1
              AND name = $2
              AND NOT is_archived
              AND ($3::BIGINT IS NULL OR id <> $3)
        )
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(excluding)
    .fetch_one(executor)
    .await
}

/// Apply a signed delta to a balance in a single statement.
///
/// The addition happens inside PostgreSQL, so concurrent deltas cannot
/// overwrite each other. Returns false when no account has this id.
pub async fn adjust_balance<'e, E>(executor: E, id: i64, delta: Decimal) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let updated = sqlx::query(
        r#"
        UPDATE accounts
        SET balance = balance + $1,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(delta)
    .bind(id)
    .execute(executor)
    .await?
    .rows_affected();

    Ok(updated == 1)
}

/// Rename an active account and overwrite its balance.
pub async fn update<'e, E>(
    executor: E,
    id: i64,
    user_id: i64,
    name: &str,
    balance: Decimal,
) -> Result<Option<Account>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Account>(
        r#"
        UPDATE accounts
        SET name = $1,
            balance = $2,
            updated_at = NOW()
        WHERE id = $3 AND user_id = $4 AND NOT is_archived
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(balance)
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Soft-delete an account. Returns false when nothing matched.
pub async fn archive<'e, E>(executor: E, id: i64, user_id: i64) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let archived = sqlx::query(
        r#"
        UPDATE accounts
        SET is_archived = TRUE,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2 AND NOT is_archived AND NOT is_default
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(executor)
    .await?
    .rows_affected();

    Ok(archived == 1)
}
