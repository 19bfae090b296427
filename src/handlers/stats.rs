//! Spending statistics HTTP handlers.
//!
//! Both endpoints accept `period`, `start_date` and `end_date` like the
//! transaction listing, but default to the last week.

use axum::{
    Extension, Json,
    extract::{Query, State},
};

use crate::{
    db::DbPool,
    error::AppError,
    middleware::owner::OwnerContext,
    models::stats::{CategoryStatsResponse, OverviewResponse, StatsQuery},
    services::stats,
};

/// `GET /api/v1/stats/overview`
///
/// ```json
/// { "period": "week", "total_expense": "130.50", "total_income": "1000.00" }
/// ```
pub async fn overview(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<OverviewResponse>, AppError> {
    let overview =
        stats::overview(&pool, owner.user_id, query.period_name(), query.period()).await?;

    Ok(Json(overview))
}

/// `GET /api/v1/stats/categories`: expense totals per category, largest first.
pub async fn by_category(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<CategoryStatsResponse>, AppError> {
    let categories = stats::by_category(&pool, owner.user_id, query.period()).await?;

    Ok(Json(CategoryStatsResponse {
        period: query.period_name().to_string(),
        categories,
    }))
}
