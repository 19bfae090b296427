//! Category store.
//!
//! A category is visible to a user when the user owns it or when it is a
//! system category (`user_id IS NULL`).

use sqlx::PgExecutor;

use crate::models::category::{Category, CategoryKind, CategoryOwner, FALLBACK_CATEGORY_NAME};

pub async fn create<'e, E>(
    executor: E,
    owner: CategoryOwner,
    name: &str,
    kind: CategoryKind,
) -> Result<Category, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (user_id, name, type)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(owner.user_id())
    .bind(name)
    .bind(kind.as_str())
    .fetch_one(executor)
    .await
}

/// Categories of one kind visible to the user: their own alphabetically,
/// then the system ones alphabetically.
pub async fn list<'e, E>(
    executor: E,
    user_id: i64,
    kind: CategoryKind,
) -> Result<Vec<Category>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Category>(
        r#"
        SELECT *
        FROM categories
        WHERE type = $1 AND (user_id = $2 OR user_id IS NULL)
        ORDER BY user_id NULLS LAST, name, id
        "#,
    )
    .bind(kind.as_str())
    .bind(user_id)
    .fetch_all(executor)
    .await
}

/// Fetch a visible category and hold a share lock on it, so it cannot be
/// deleted until the caller's transaction ends.
pub async fn get_shared<'e, E>(
    executor: E,
    id: i64,
    user_id: i64,
) -> Result<Option<Category>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE id = $1 AND (user_id = $2 OR user_id IS NULL) FOR SHARE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Fetch and row-lock a visible category before it is deleted.
///
/// Entries pointing at the category hold it `FOR SHARE`, so the lock waits
/// for them to commit and their rows are then reassigned.
pub async fn lock<'e, E>(executor: E, id: i64, user_id: i64) -> Result<Option<Category>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE id = $1 AND (user_id = $2 OR user_id IS NULL) FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

/// Whether the user already owns a category with this name and kind.
pub async fn name_taken<'e, E>(
    executor: E,
    user_id: i64,
    name: &str,
    kind: CategoryKind,
) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE user_id = $1 AND name = $2 AND type = $3)",
    )
    .bind(user_id)
    .bind(name)
    .bind(kind.as_str())
    .fetch_one(executor)
    .await
}

/// The system category that absorbs transactions of deleted user categories.
pub async fn find_fallback<'e, E>(
    executor: E,
    kind: CategoryKind,
) -> Result<Option<Category>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Category>(
        r#"
        SELECT *
        FROM categories
        WHERE name = $1 AND type = $2 AND user_id IS NULL
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(FALLBACK_CATEGORY_NAME)
    .bind(kind.as_str())
    .fetch_optional(executor)
    .await
}

/// Point every transaction of the user that references `from` at `to`.
pub async fn reassign_transactions<'e, E>(
    executor: E,
    from: i64,
    to: i64,
    user_id: i64,
) -> Result<u64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let moved = sqlx::query(
        "UPDATE transactions SET category_id = $1 WHERE category_id = $2 AND user_id = $3",
    )
    .bind(to)
    .bind(from)
    .bind(user_id)
    .execute(executor)
    .await?
    .rows_affected();

    Ok(moved)
}

/// Delete a category owned by the user. System categories never match.
pub async fn delete<'e, E>(executor: E, id: i64, user_id: i64) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let deleted = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?
        .rows_affected();

    Ok(deleted == 1)
}
