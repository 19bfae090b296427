//! Category HTTP handlers.
//!
//! - POST /api/v1/categories - Create a user category
//! - GET /api/v1/categories?type=expense - List visible categories of a kind
//! - DELETE /api/v1/categories/{id} - Delete a user category

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
    models::category::{CategoryResponse, CreateCategoryRequest, ListCategoriesQuery},
    services::ledger_service,
};

pub async fn create_category(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let category =
        ledger_service::create_category(&pool, owner.user_id, &request.name, &request.kind)
            .await?;

    Ok((StatusCode::CREATED, Json(category.into())))
}

/// The caller's own categories alphabetically, then the system ones.
pub async fn list_categories(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<Json<Vec<CategoryResponse>>, AppError> {
    let categories = ledger_service::list_categories(&pool, owner.user_id, &query.kind).await?;

    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

/// Delete a category. Its transactions move to the "Other" category of the same kind.
///
/// # Response
///
/// - **200 OK**: `{"status": "ok"}`
/// - **403**: system category
/// - **404**: not visible to the caller
pub async fn delete_category(
    State(pool): State<DbPool>,
    Extension(owner): Extension<OwnerContext>,
    Path(category_id): Path<i64>,
) -> Result<Json<StatusResponse>, AppError> {
    ledger_service::delete_category(&pool, owner.user_id, category_id).await?;

    Ok(StatusResponse::ok())
}
