//! Ledger service - keeps account balances consistent with the transaction log.
//!
//! This service handles:
//! - Recording expenses, incomes and transfers
//! - Amending and deleting transactions (rollback, then reapply)
//! - Account and category lifecycle rules
//!
//! # Atomicity Guarantees
//!
//! Every operation runs inside one PostgreSQL transaction. The accounts an
//! operation touches are locked with `FOR UPDATE` in ascending id order
//! before any balance changes, and all validation happens before the first
//! write. Returning early with an error drops the transaction, which rolls
//! it back, so a rejected operation leaves no partial effect.

use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::{
    db::{self, DbPool, DbTransaction},
    error::AppError,
    models::{
        account::{Account, DEFAULT_ACCOUNT_NAME},
        category::{Category, CategoryKind, CategoryOwner},
        period::Period,
        transaction::{
            NewEntry, NewTransfer, Transaction, TransactionDetails, TransactionDraft,
            TransactionEdit, TransactionKind,
        },
    },
    services::balance_effect::{self, BalanceDelta, Effect},
    store,
};

/// Matches the `VARCHAR(100)` name columns.
const MAX_NAME_LEN: usize = 100;

/// Unique index allowing one active default account per owner.
const DEFAULT_ACCOUNT_INDEX: &str = "uq_accounts_default";

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// Record an expense. Returns the new row and the account's resulting balance.
///
/// # Errors
///
/// - `AccountNotFound`: account is absent, archived or owned by someone else
/// - `CategoryNotFound`: category is not visible to the owner
/// - `InvalidRequest`: category is an income category
pub async fn create_expense(
    pool: &DbPool,
    user_id: i64,
    entry: NewEntry,
) -> Result<(Transaction, Decimal), AppError> {
    record_entry(pool, user_id, TransactionKind::Expense, entry).await
}

/// Record an income. Same rules as [`create_expense`] with the sign flipped.
pub async fn create_income(
    pool: &DbPool,
    user_id: i64,
    entry: NewEntry,
) -> Result<(Transaction, Decimal), AppError> {
    record_entry(pool, user_id, TransactionKind::Income, entry).await
}

async fn record_entry(
    pool: &DbPool,
    user_id: i64,
    kind: TransactionKind,
    entry: NewEntry,
) -> Result<(Transaction, Decimal), AppError> {
    let mut tx = pool.begin().await?;

    let account = lock_active(&mut tx, entry.account_id, user_id).await?;
    let category_id = match entry.category_id {
        Some(id) => Some(checked_category(&mut tx, id, user_id, kind).await?),
        None => None,
    };
    let effect = Effect::of(kind, entry.amount, account.id, None)?;

    let row = store::transactions::create(
        &mut *tx,
        &TransactionDraft {
            user_id,
            account_id: account.id,
            related_account_id: None,
            category_id,
            kind,
            amount: entry.amount,
            currency: account.currency.clone(),
            description: entry.description,
            operation_date: entry.operation_date,
        },
    )
    .await?;

    apply(&mut tx, effect.deltas()).await?;
    let balance = current_balance(&mut tx, account.id, user_id).await?;

    tx.commit().await?;

    tracing::info!(
        user_id,
        transaction_id = row.id,
        account_id = account.id,
        kind = %kind,
        amount = %row.amount,
        "Transaction recorded"
    );

    Ok((row, balance))
}

/// Move money between two of the owner's active accounts.
///
/// Returns the new row and the resulting balances of the source and the
/// destination, in that order.
pub async fn create_transfer(
    pool: &DbPool,
    user_id: i64,
    transfer: NewTransfer,
) -> Result<(Transaction, Decimal, Decimal), AppError> {
    if transfer.from_account_id == transfer.to_account_id {
        return Err(AppError::invalid("cannot transfer to the same account"));
    }

    let effect = Effect::of(
        TransactionKind::Transfer,
        transfer.amount,
        transfer.from_account_id,
        Some(transfer.to_account_id),
    )?;

    let mut tx = pool.begin().await?;

    let mut locked = BTreeMap::new();
    for account_id in balance_effect::lock_order([&effect]) {
        locked.insert(account_id, lock_active(&mut tx, account_id, user_id).await?);
    }
    let from = locked
        .get(&transfer.from_account_id)
        .ok_or(AppError::AccountNotFound)?;

    let row = store::transactions::create(
        &mut *tx,
        &TransactionDraft {
            user_id,
            account_id: transfer.from_account_id,
            related_account_id: Some(transfer.to_account_id),
            category_id: None,
            kind: TransactionKind::Transfer,
            amount: transfer.amount,
            currency: from.currency.clone(),
            description: transfer.description,
            operation_date: transfer.operation_date,
        },
    )
    .await?;

    apply(&mut tx, effect.deltas()).await?;
    let from_balance = current_balance(&mut tx, transfer.from_account_id, user_id).await?;
    let to_balance = current_balance(&mut tx, transfer.to_account_id, user_id).await?;

    tx.commit().await?;

    tracing::info!(
        user_id,
        transaction_id = row.id,
        from_account_id = transfer.from_account_id,
        to_account_id = transfer.to_account_id,
        amount = %row.amount,
        "Transfer recorded"
    );

    Ok((row, from_balance, to_balance))
}

/// Amend a transaction: roll its stored effect back, then apply the edited one.
///
/// The kind never changes. Every new reference is validated before the
/// rollback, so a rejected edit leaves balances and the row untouched. A new
/// account must be active unless it is the one already stored.
///
/// Returns the updated row and the resulting balance of its primary account.
pub async fn update_transaction(
    pool: &DbPool,
    user_id: i64,
    transaction_id: i64,
    edit: TransactionEdit,
) -> Result<(Transaction, Decimal), AppError> {
    let mut tx = pool.begin().await?;

    let current = store::transactions::lock(&mut *tx, transaction_id, user_id)
        .await?
        .ok_or(AppError::TransactionNotFound)?;

    let related_account_id = match current.kind {
        TransactionKind::Transfer => {
            let to = edit
                .related_account_id
                .or(current.related_account_id)
                .ok_or_else(|| {
                    AppError::Corrupted(format!("transfer {} has no destination", current.id))
                })?;
            if to == edit.account_id {
                return Err(AppError::invalid("cannot transfer to the same account"));
            }
            Some(to)
        }
        _ if edit.related_account_id.is_some() => {
            return Err(AppError::invalid(
                "related_account_id is only allowed for transfers",
            ));
        }
        _ => None,
    };

    let category_id = match edit.category_id {
        Some(id) => Some(checked_category(&mut tx, id, user_id, current.kind).await?),
        None => None,
    };

    let old_effect = Effect::of_transaction(&current)?;
    let new_effect = Effect::of(
        current.kind,
        edit.amount,
        edit.account_id,
        related_account_id,
    )?;

    let mut locked = BTreeMap::new();
    for account_id in balance_effect::lock_order([&old_effect, &new_effect]) {
        if let Some(account) = store::accounts::lock(&mut *tx, account_id, user_id).await? {
            locked.insert(account_id, account);
        }
    }

    let primary = edited_reference(&locked, edit.account_id, Some(current.account_id))?;
    if let Some(to) = related_account_id {
        edited_reference(&locked, to, current.related_account_id)?;
    }

    let updated = Transaction {
        account_id: edit.account_id,
        related_account_id,
        category_id,
        amount: edit.amount,
        currency: primary.currency.clone(),
        description: edit.description,
        operation_date: edit.operation_date,
        ..current
    };

    apply(
        &mut tx,
        &balance_effect::rollback_then_apply(&old_effect, &new_effect),
    )
    .await?;

    if !store::transactions::update(&mut *tx, &updated).await? {
        return Err(AppError::TransactionNotFound);
    }

    let balance = current_balance(&mut tx, updated.account_id, user_id).await?;

    tx.commit().await?;

    tracing::info!(
        user_id,
        transaction_id,
        account_id = updated.account_id,
        amount = %updated.amount,
        "Transaction updated"
    );

    Ok((updated, balance))
}

/// Roll back a transaction's effect and remove it.
pub async fn delete_transaction(
    pool: &DbPool,
    user_id: i64,
    transaction_id: i64,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let current = store::transactions::lock(&mut *tx, transaction_id, user_id)
        .await?
        .ok_or(AppError::TransactionNotFound)?;
    let effect = Effect::of_transaction(&current)?;

    for account_id in balance_effect::lock_order([&effect]) {
        store::accounts::lock(&mut *tx, account_id, user_id)
            .await?
            .ok_or_else(|| missing_reference(current.id, account_id))?;
    }

    apply(&mut tx, effect.inverse().deltas()).await?;
    store::transactions::delete(&mut *tx, transaction_id, user_id)
        .await?
        .ok_or(AppError::TransactionNotFound)?;

    tx.commit().await?;

    tracing::info!(user_id, transaction_id, "Transaction deleted");

    Ok(())
}

pub async fn get_transaction(
    pool: &DbPool,
    user_id: i64,
    transaction_id: i64,
) -> Result<TransactionDetails, AppError> {
    store::transactions::get_with_names(pool, transaction_id, user_id)
        .await?
        .ok_or(AppError::TransactionNotFound)
}

/// Transactions of the owner inside `period`, newest operation date first.
pub async fn list_transactions(
    pool: &DbPool,
    user_id: i64,
    period: Period,
    limit: i64,
) -> Result<Vec<TransactionDetails>, AppError> {
    let window = period.window(Utc::now());
    let rows = store::transactions::list(pool, user_id, window, limit).await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Open a new account. The owner's first active account becomes the default.
///
/// When two first accounts are opened at once, the one that commits second
/// loses the default slot and is retried as an ordinary account.
pub async fn create_account(
    pool: &DbPool,
    user_id: i64,
    name: &str,
    currency: &str,
    balance: Decimal,
) -> Result<Account, AppError> {
    let name = required_name(name, "account")?;
    let currency = normalize_currency(currency)?;

    let account = match insert_account(pool, user_id, name, &currency, balance).await {
        Err(AppError::Database(err)) if db::violates(&err, DEFAULT_ACCOUNT_INDEX) => {
            insert_account(pool, user_id, name, &currency, balance).await
        }
        result => result,
    }
    .map_err(|err| match err {
        AppError::Database(err) => unique_conflict(err, || duplicate_account(name)),
        other => other,
    })?;

    tracing::info!(
        user_id,
        account_id = account.id,
        is_default = account.is_default,
        "Account created"
    );

    Ok(account)
}

async fn insert_account(
    pool: &DbPool,
    user_id: i64,
    name: &str,
    currency: &str,
    balance: Decimal,
) -> Result<Account, AppError> {
    let mut tx = pool.begin().await?;

    if store::accounts::name_taken(&mut *tx, user_id, name, None).await? {
        return Err(duplicate_account(name));
    }
    let is_default = store::accounts::find_default(&mut *tx, user_id)
        .await?
        .is_none();

    let account =
        store::accounts::create(&mut *tx, user_id, name, currency, balance, is_default).await?;

    tx.commit().await?;

    Ok(account)
}

/// Rename an active account and optionally overwrite its balance.
///
/// Overwriting the balance is a manual correction; it is not recorded as a
/// transaction.
pub async fn update_account(
    pool: &DbPool,
    user_id: i64,
    account_id: i64,
    name: &str,
    balance: Option<Decimal>,
) -> Result<Account, AppError> {
    let name = required_name(name, "account")?;

    let mut tx = pool.begin().await?;

    let current = lock_active(&mut tx, account_id, user_id).await?;
    if store::accounts::name_taken(&mut *tx, user_id, name, Some(account_id)).await? {
        return Err(duplicate_account(name));
    }

    let balance = balance.unwrap_or(current.balance);
    let account = store::accounts::update(&mut *tx, account_id, user_id, name, balance)
        .await
        .map_err(|err| unique_conflict(err, || duplicate_account(name)))?
        .ok_or(AppError::AccountNotFound)?;

    tx.commit().await?;

    if balance != current.balance {
        tracing::info!(
            user_id,
            account_id,
            old_balance = %current.balance,
            new_balance = %balance,
            "Account balance overwritten"
        );
    } else {
        tracing::info!(user_id, account_id, "Account updated");
    }

    Ok(account)
}

/// Archive an account. Only non-default accounts with a zero balance qualify.
///
/// # Errors
///
/// - `AccountNotFound`: absent, already archived or owned by someone else
/// - `DefaultAccount`: the account is the owner's default
/// - `NonZeroBalance`: the balance is not exactly zero
pub async fn delete_account(pool: &DbPool, user_id: i64, account_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let account = lock_active(&mut tx, account_id, user_id).await?;
    if account.is_default {
        return Err(AppError::DefaultAccount);
    }
    if !account.balance.is_zero() {
        return Err(AppError::NonZeroBalance);
    }

    if !store::accounts::archive(&mut *tx, account_id, user_id).await? {
        return Err(AppError::AccountNotFound);
    }

    tx.commit().await?;

    tracing::info!(user_id, account_id, "Account archived");

    Ok(())
}

pub async fn list_accounts(pool: &DbPool, user_id: i64) -> Result<Vec<Account>, AppError> {
    let accounts = store::accounts::list(pool, user_id).await?;
    Ok(accounts)
}

/// Current balances of the owner's active accounts.
pub async fn get_balance(pool: &DbPool, user_id: i64) -> Result<Vec<Account>, AppError> {
    list_accounts(pool, user_id).await
}

/// Return the owner's default account, opening an empty one if there is none.
///
/// Safe to call repeatedly and concurrently: a racing insert loses on the
/// one-default-per-owner index and the winner's account is returned.
pub async fn ensure_default_account(
    pool: &DbPool,
    user_id: i64,
    currency: &str,
) -> Result<Account, AppError> {
    if let Some(account) = store::accounts::find_default(pool, user_id).await? {
        return Ok(account);
    }

    let currency = normalize_currency(currency)?;

    match store::accounts::create(
        pool,
        user_id,
        DEFAULT_ACCOUNT_NAME,
        &currency,
        Decimal::ZERO,
        true,
    )
    .await
    {
        Ok(account) => {
            tracing::info!(user_id, account_id = account.id, "Default account created");
            Ok(account)
        }
        Err(err) if db::is_unique_violation(&err) => {
            store::accounts::find_default(pool, user_id)
                .await?
                .ok_or_else(|| duplicate_account(DEFAULT_ACCOUNT_NAME))
        }
        Err(err) => Err(err.into()),
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub async fn create_category(
    pool: &DbPool,
    user_id: i64,
    name: &str,
    kind: &str,
) -> Result<Category, AppError> {
    let name = required_name(name, "category")?;
    let kind = parse_category_kind(kind)?;

    if store::categories::name_taken(pool, user_id, name, kind).await? {
        return Err(duplicate_category(name, kind));
    }

    let category = store::categories::create(pool, CategoryOwner::User(user_id), name, kind)
        .await
        .map_err(|err| unique_conflict(err, || duplicate_category(name, kind)))?;

    tracing::info!(user_id, category_id = category.id, kind = %kind, "Category created");

    Ok(category)
}

/// The owner's categories of `kind` first, then the system ones.
pub async fn list_categories(
    pool: &DbPool,
    user_id: i64,
    kind: &str,
) -> Result<Vec<Category>, AppError> {
    let kind = parse_category_kind(kind)?;
    let categories = store::categories::list(pool, user_id, kind).await?;
    Ok(categories)
}

/// Delete a user category, moving its transactions to the fallback category
/// of the same kind first.
///
/// # Errors
///
/// - `CategoryNotFound`: not visible to the owner
/// - `SystemCategory`: system categories cannot be deleted
/// - `FallbackCategoryMissing`: nowhere to move the transactions to
pub async fn delete_category(
    pool: &DbPool,
    user_id: i64,
    category_id: i64,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let category = store::categories::lock(&mut *tx, category_id, user_id)
        .await?
        .ok_or(AppError::CategoryNotFound)?;
    if category.owner.is_system() {
        return Err(AppError::SystemCategory);
    }

    let fallback = store::categories::find_fallback(&mut *tx, category.kind)
        .await?
        .ok_or(AppError::FallbackCategoryMissing(category.kind))?;

    let moved =
        store::categories::reassign_transactions(&mut *tx, category.id, fallback.id, user_id)
            .await?;
    if !store::categories::delete(&mut *tx, category.id, user_id).await? {
        return Err(AppError::CategoryNotFound);
    }

    tx.commit().await?;

    tracing::info!(
        user_id,
        category_id,
        fallback_id = fallback.id,
        moved,
        "Category deleted"
    );

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lock an account that must be owned by `user_id` and not archived.
async fn lock_active(
    tx: &mut DbTransaction<'_>,
    account_id: i64,
    user_id: i64,
) -> Result<Account, AppError> {
    store::accounts::lock(&mut **tx, account_id, user_id)
        .await?
        .filter(|account| !account.is_archived)
        .ok_or(AppError::AccountNotFound)
}

/// A category reference of a new or edited entry: visible and of the entry's kind.
///
/// The category stays share-locked until the entry commits.
async fn checked_category(
    tx: &mut DbTransaction<'_>,
    category_id: i64,
    user_id: i64,
    kind: TransactionKind,
) -> Result<i64, AppError> {
    let expected = kind
        .category_kind()
        .ok_or_else(|| AppError::invalid("transfers do not take a category"))?;

    let category = store::categories::get_shared(&mut **tx, category_id, user_id)
        .await?
        .filter(|category| category.is_visible_to(user_id))
        .ok_or(AppError::CategoryNotFound)?;

    if category.kind != expected {
        return Err(AppError::invalid(format!(
            "category {category_id} is not an {expected} category"
        )));
    }

    Ok(category.id)
}

/// Resolve an account an edit points at among the locked accounts.
///
/// Archived accounts pass only when they are already the stored reference,
/// so historical transactions stay editable.
fn edited_reference<'a>(
    locked: &'a BTreeMap<i64, Account>,
    account_id: i64,
    stored: Option<i64>,
) -> Result<&'a Account, AppError> {
    match locked.get(&account_id) {
        Some(account) if !account.is_archived || stored == Some(account_id) => Ok(account),
        _ => Err(AppError::AccountNotFound),
    }
}

async fn apply(tx: &mut DbTransaction<'_>, deltas: &[BalanceDelta]) -> Result<(), AppError> {
    for d in deltas {
        if !store::accounts::adjust_balance(&mut **tx, d.account_id, d.delta).await? {
            return Err(AppError::Corrupted(format!(
                "account {} disappeared during a balance update",
                d.account_id
            )));
        }
    }
    Ok(())
}

async fn current_balance(
    tx: &mut DbTransaction<'_>,
    account_id: i64,
    user_id: i64,
) -> Result<Decimal, AppError> {
    store::accounts::get(&mut **tx, account_id, user_id)
        .await?
        .map(|account| account.balance)
        .ok_or(AppError::AccountNotFound)
}

fn missing_reference(transaction_id: i64, account_id: i64) -> AppError {
    AppError::Corrupted(format!(
        "transaction {transaction_id} references missing account {account_id}"
    ))
}

fn required_name<'a>(name: &'a str, what: &str) -> Result<&'a str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::invalid(format!("{what} name must not be empty")));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::invalid(format!(
            "{what} name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Currency codes are three ASCII letters, stored uppercase.
fn normalize_currency(currency: &str) -> Result<String, AppError> {
    let code = currency.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(AppError::invalid(format!(
            "invalid currency code: {currency:?}"
        )));
    }
    Ok(code)
}

fn parse_category_kind(kind: &str) -> Result<CategoryKind, AppError> {
    kind.trim()
        .parse::<CategoryKind>()
        .map_err(|err| AppError::invalid(err.to_string()))
}

fn duplicate_account(name: &str) -> AppError {
    AppError::invalid(format!("account {name:?} already exists"))
}

fn duplicate_category(name: &str, kind: CategoryKind) -> AppError {
    AppError::invalid(format!("{kind} category {name:?} already exists"))
}

/// Unique violations become the given client error; anything else stays a
/// storage fault.
fn unique_conflict(err: sqlx::Error, conflict: impl FnOnce() -> AppError) -> AppError {
    if db::is_unique_violation(&err) {
        conflict()
    } else {
        AppError::Database(err)
    }
}
