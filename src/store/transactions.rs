//! Transaction store.
//!
//! Rows are immutable except through `update`, which the ledger service only
//! calls after rolling back the row's previous balance effect. Deletion is
//! physical.

use rust_decimal::Decimal;
use sqlx::PgExecutor;

use crate::models::period::DateWindow;
use crate::models::stats::CategoryTotal;
use crate::models::transaction::{Transaction, TransactionDetails, TransactionDraft};

/// Insert a new transaction row and return it with its assigned id.
pub async fn create<'e, E>(executor: E, draft: &TransactionDraft) -> Result<Transaction, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            user_id,
            account_id,
            related_account_id,
            category_id,
            type,
            amount,
            currency,
            description,
            operation_date
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(draft.user_id)
    .bind(draft.account_id)
    .bind(draft.related_account_id)
    .bind(draft.category_id)
    .bind(draft.kind.as_str())
    .bind(draft.amount)
    .bind(&draft.currency)
    .bind(&draft.description)
    .bind(draft.operation_date)
    .fetch_one(executor)
    .await
}

pub async fn get<'e, E>(executor: E, id: i64, user_id: i64) -> Result<Option<Transaction>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
}

/// Fetch and row-lock a transaction so concurrent edits of it serialize.
pub async fn lock<'e, E>(executor: E, id: i64, user_id: i64) -> Result<Option<Transaction>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Fetch a transaction together with its category and account names.
pub async fn get_with_names<'e, E>(
    executor: E,
    id: i64,
    user_id: i64,
) -> Result<Option<TransactionDetails>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, TransactionDetails>(
        r#"
        SELECT t.*,
               c.name AS category_name,
               a.name AS account_name
        FROM transactions t
        LEFT JOIN categories c ON c.id = t.category_id
        LEFT JOIN accounts a ON a.id = t.account_id
        WHERE t.id = $1 AND t.user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// List an owner's transactions inside a date window, newest operation first.
///
/// # Ordering
///
/// Ties on the operation date are broken by id, newest first, so repeated
/// calls return the same sequence.
pub async fn list<'e, E>(
    executor: E,
    user_id: i64,
    window: DateWindow,
    limit: i64,
) -> Result<Vec<TransactionDetails>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, TransactionDetails>(
        r#"
        SELECT t.*,
               c.name AS category_name,
               a.name AS account_name
        FROM transactions t
        LEFT JOIN categories c ON c.id = t.category_id
        LEFT JOIN accounts a ON a.id = t.account_id
        WHERE t.user_id = $1
          AND ($2::TIMESTAMPTZ IS NULL OR t.operation_date >= $2)
          AND ($3::TIMESTAMPTZ IS NULL OR t.operation_date < $3)
        ORDER BY t.operation_date DESC, t.id DESC
        LIMIT $4
        "#,
    )
    .bind(user_id)
    .bind(window.from)
    .bind(window.until)
    .bind(limit)
    .fetch_all(executor)
    .await
}

/// Expense and income sums of an owner inside a date window, in that order.
/// Transfers are not counted.
pub async fn period_totals<'e, E>(
    executor: E,
    user_id: i64,
    window: DateWindow,
) -> Result<(Decimal, Decimal), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, (Decimal, Decimal)>(
        r#"
        SELECT COALESCE(SUM(amount) FILTER (WHERE type = 'expense'), 0),
               COALESCE(SUM(amount) FILTER (WHERE type = 'income'), 0)
        FROM transactions
        WHERE user_id = $1
          AND ($2::TIMESTAMPTZ IS NULL OR operation_date >= $2)
          AND ($3::TIMESTAMPTZ IS NULL OR operation_date < $3)
        "#,
    )
    .bind(user_id)
    .bind(window.from)
    .bind(window.until)
    .fetch_one(executor)
    .await
}

/// Expense sums per category name inside a date window, largest first, ties
/// by name. Uncategorized expenses are left out.
pub async fn expense_totals_by_category<'e, E>(
    executor: E,
    user_id: i64,
    window: DateWindow,
) -> Result<Vec<CategoryTotal>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CategoryTotal>(
        r#"
        SELECT c.name,
               SUM(t.amount) AS total_expense
        FROM transactions t
        JOIN categories c ON c.id = t.category_id
        WHERE t.user_id = $1
          AND t.type = 'expense'
          AND ($2::TIMESTAMPTZ IS NULL OR t.operation_date >= $2)
          AND ($3::TIMESTAMPTZ IS NULL OR t.operation_date < $3)
        GROUP BY c.name
        ORDER BY total_expense DESC, c.name
        "#,
    )
    .bind(user_id)
    .bind(window.from)
    .bind(window.until)
    .fetch_all(executor)
    .await
}

/// Overwrite the mutable fields of a transaction. `type` is never touched.
pub async fn update<'e, E>(executor: E, tx: &Transaction) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let updated = sqlx::query(
        r#"
        UPDATE transactions
        SET account_id = $1,
            related_account_id = $2,
            category_id = $3,
            amount = $4,
            currency = $5,
            description = $6,
            operation_date = $7
        WHERE id = $8 AND user_id = $9
        "#,
    )
    .bind(tx.account_id)
    .bind(tx.related_account_id)
    .bind(tx.category_id)
    .bind(tx.amount)
    .bind(&tx.currency)
    .bind(&tx.description)
    .bind(tx.operation_date)
    .bind(tx.id)
    .bind(tx.user_id)
    .execute(executor)
    .await?
    .rows_affected();

    Ok(updated == 1)
}

/// Physically remove a transaction and return the removed row.
pub async fn delete<'e, E>(executor: E, id: i64, user_id: i64) -> Result<Option<Transaction>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Transaction>(
        "DELETE FROM transactions WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}
