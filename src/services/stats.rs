//! Spending statistics over a period.
//!
//! Sums are computed by PostgreSQL over every transaction in the window, so
//! no listing limit applies, and decoded as `Decimal`.

use chrono::Utc;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        period::Period,
        stats::{CategoryTotal, OverviewResponse},
    },
    store,
};

pub async fn overview(
    pool: &DbPool,
    user_id: i64,
    period_name: &str,
    period: Period,
) -> Result<OverviewResponse, AppError> {
    let window = period.window(Utc::now());
    let (total_expense, total_income) =
        store::transactions::period_totals(pool, user_id, window).await?;

    Ok(OverviewResponse {
        period: period_name.to_string(),
        total_expense,
        total_income,
    })
}

/// Expense totals per category name, largest first.
pub async fn by_category(
    pool: &DbPool,
    user_id: i64,
    period: Period,
) -> Result<Vec<CategoryTotal>, AppError> {
    let window = period.window(Utc::now());
    let totals = store::transactions::expense_totals_by_category(pool, user_id, window).await?;
    Ok(totals)
}
