//! Category route handlers.

use axum::{Router, extract::State, routing::get};

use scoop_core::CategoryId;

use super::{AppPath, positive};
use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::Branch;
use crate::models::catalog::{Category, CategorySummary};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Build the category router (mounted at `/api/categories`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/with-products", get(with_products))
        .route("/{id}", get(show))
        .route("/{id}/with-products", get(show_with_products))
}

/// All categories, ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<CategorySummary>>> {
    let categories = CategoryRepository::new(state.pool())
        .get_all_categories()
        .await?;
    Ok(ApiResponse::list(categories))
}

/// One category without products.
///
/// # Errors
///
/// Returns 400 for a non-positive id and 404 if the category does not exist.
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<CategorySummary>> {
    let id = positive(id, CategoryId::positive, "category id")?;
    let category = CategoryRepository::new(state.pool())
        .get_category_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    Ok(ApiResponse::data(category))
}

/// Every category with its in-stock products, variants, images and bundles.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn with_products(
    State(state): State<AppState>,
    Branch(branch): Branch,
) -> Result<ApiResponse<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool())
        .get_all_categories_with_banners_and_products(branch)
        .await?;
    Ok(ApiResponse::list(categories))
}

/// One category with its products, variants, images and bundles.
///
/// # Errors
///
/// Returns 400 for a non-positive id and 404 if the category does not exist.
pub async fn show_with_products(
    State(state): State<AppState>,
    Branch(branch): Branch,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<Category>> {
    let id = positive(id, CategoryId::positive, "category id")?;
    let category = CategoryRepository::new(state.pool())
        .get_category_with_banner_and_products(id, branch)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;
    Ok(ApiResponse::data(category))
}
