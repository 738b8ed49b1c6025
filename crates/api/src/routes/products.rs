//! Product route handlers.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;

use scoop_core::{CategoryId, ProductId};

use super::{AppPath, AppQuery, ListQuery, positive, required};
use crate::db::ProductRepository;
use crate::db::products::ProductSort;
use crate::error::{AppError, Result};
use crate::middleware::Branch;
use crate::models::catalog::{ProductDetails, ProductWithImages};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Build the product router (mounted at `/api/products`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/search", get(search))
        .route("/category/{category_id}", get(by_category))
        .route("/slug/{slug}", get(by_slug))
        .route("/{id}/images", get(with_images))
}

/// Query parameters of `GET /api/products/search`.
///
/// Not built with `#[serde(flatten)]`: flattened numbers fail to parse from
/// urlencoded input.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchQuery {
    fn list(self) -> ListQuery {
        ListQuery {
            sort: self.sort,
            order: self.order,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// All products visible in the branch.
///
/// # Errors
///
/// Returns 400 for invalid sort or paging parameters.
pub async fn index(
    State(state): State<AppState>,
    Branch(branch): Branch,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<ApiResponse<Vec<ProductDetails>>> {
    let options = query.into_options::<ProductSort>()?;
    let products = ProductRepository::new(state.pool())
        .find_all(branch, options)
        .await?;
    Ok(ApiResponse::list(products))
}

/// Products of one category.
///
/// # Errors
///
/// Returns 400 for a non-positive id or invalid sort or paging parameters.
pub async fn by_category(
    State(state): State<AppState>,
    Branch(branch): Branch,
    AppPath(category_id): AppPath<i32>,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<ApiResponse<Vec<ProductDetails>>> {
    let category_id = positive(category_id, CategoryId::positive, "category id")?;
    let options = query.into_options::<ProductSort>()?;
    let products = ProductRepository::new(state.pool())
        .find_by_category(category_id, branch, options)
        .await?;
    Ok(ApiResponse::list(products))
}

/// Case-insensitive keyword search over title and description.
///
/// # Errors
///
/// Returns 400 when `q` is missing or blank.
pub async fn search(
    State(state): State<AppState>,
    Branch(branch): Branch,
    AppQuery(query): AppQuery<SearchQuery>,
) -> Result<ApiResponse<Vec<ProductDetails>>> {
    let keyword = required(query.q.as_deref(), "Search keyword")?.to_owned();
    let options = query.list().into_options::<ProductSort>()?;
    let products = ProductRepository::new(state.pool())
        .search(&keyword, branch, options)
        .await?;
    tracing::debug!(keyword = %keyword, count = products.len(), "product search");
    Ok(ApiResponse::list(products))
}

/// One product by slug.
///
/// # Errors
///
/// Returns 404 if no visible product has the slug.
pub async fn by_slug(
    State(state): State<AppState>,
    Branch(branch): Branch,
    AppPath(slug): AppPath<String>,
) -> Result<ApiResponse<ProductDetails>> {
    let slug = required(Some(&slug), "Slug")?;
    let product = ProductRepository::new(state.pool())
        .find_by_slug(slug, branch)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(ApiResponse::data(product))
}

/// One product with its additional images.
///
/// # Errors
///
/// Returns 400 for a non-positive id and 404 if the product is not visible.
pub async fn with_images(
    State(state): State<AppState>,
    Branch(branch): Branch,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<ProductWithImages>> {
    let id = positive(id, ProductId::positive, "product id")?;
    let product = ProductRepository::new(state.pool())
        .find_with_images(id, branch)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    Ok(ApiResponse::data(product))
}
