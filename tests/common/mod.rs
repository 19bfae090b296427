// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use finance_ledger::db::{self, DbPool};
use finance_ledger::models::account::Account;
use finance_ledger::models::category::{Category, CategoryKind};
use finance_ledger::models::transaction::{NewEntry, NewTransfer, TransactionEdit};
use finance_ledger::services::ledger_service;
use finance_ledger::store;
use rand::Rng;
use rust_decimal::Decimal;

/// Connect to the database named by `DATABASE_URL` and migrate it.
///
/// Returns `None` when the variable is unset so database tests are skipped
/// on machines without PostgreSQL.
pub async fn test_pool() -> Result<Option<DbPool>> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL is not set; skipping database test");
        return Ok(None);
    };

    let pool = db::create_pool(&url, 5).await?;
    db::run_migrations(&pool).await?;
    Ok(Some(pool))
}

/// A random owner id, so tests sharing a database never see each other's rows.
pub fn fresh_owner() -> i64 {
    rand::rng().random_range(1_000_000..i64::MAX / 2)
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc()
}

pub async fn open_account(pool: &DbPool, owner: i64, name: &str, balance: &str) -> Result<Account> {
    Ok(ledger_service::create_account(pool, owner, name, "RUB", dec(balance)).await?)
}

/// Balance of an account, archived or not.
pub async fn balance_of(pool: &DbPool, owner: i64, account_id: i64) -> Result<Decimal> {
    let account = store::accounts::get(pool, account_id, owner)
        .await?
        .ok_or_else(|| anyhow::anyhow!("account {account_id} not found"))?;
    Ok(account.balance)
}

/// A seeded system category visible to everyone.
pub async fn system_category(
    pool: &DbPool,
    owner: i64,
    kind: CategoryKind,
    name: &str,
) -> Result<Category> {
    ledger_service::list_categories(pool, owner, kind.as_str())
        .await?
        .into_iter()
        .find(|c| c.owner.is_system() && c.name == name)
        .ok_or_else(|| anyhow::anyhow!("system category {name} is not seeded"))
}

pub fn entry(account_id: i64, amount: &str, category_id: Option<i64>) -> NewEntry {
    NewEntry {
        account_id,
        amount: dec(amount),
        category_id,
        description: None,
        operation_date: Utc::now(),
    }
}

pub fn dated_entry(account_id: i64, amount: &str, date: &str) -> NewEntry {
    NewEntry {
        operation_date: parse_date(date),
        ..entry(account_id, amount, None)
    }
}

pub fn transfer(from: i64, to: i64, amount: &str) -> NewTransfer {
    NewTransfer {
        from_account_id: from,
        to_account_id: to,
        amount: dec(amount),
        description: None,
        operation_date: Utc::now(),
    }
}

pub fn edit(account_id: i64, amount: &str) -> TransactionEdit {
    TransactionEdit {
        account_id,
        amount: dec(amount),
        category_id: None,
        description: None,
        operation_date: Utc::now(),
        related_account_id: None,
    }
}
