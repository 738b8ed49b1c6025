//! Bundle route handlers.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;

use scoop_core::{BundleId, ProductId};

use super::{AppPath, AppQuery, positive, required};
use crate::db::BundleRepository;
use crate::error::{AppError, Result};
use crate::models::bundle::{Bundle, BundleProductRow, BundleSavings, PricingInfo};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Build the bundle router (mounted at `/api/bundles`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/search", get(search))
        .route("/product/{product_id}", get(containing_product))
        .route("/{id}", get(show))
        .route("/{id}/products", get(products))
        .route("/{id}/pricing", get(pricing))
        .route("/{id}/savings", get(savings))
}

/// Query parameters of `GET /api/bundles/search`.
#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

fn bundle_id(raw: i32) -> Result<BundleId> {
    positive(raw, BundleId::positive, "bundle id")
}

/// All bundles.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn index(State(state): State<AppState>) -> Result<ApiResponse<Vec<Bundle>>> {
    let bundles = BundleRepository::new(state.pool()).find_all().await?;
    Ok(ApiResponse::list(bundles))
}

/// Exact-name lookup, answered as a list of zero or one bundles.
///
/// # Errors
///
/// Returns 400 when `name` is missing or blank.
pub async fn search(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NameQuery>,
) -> Result<ApiResponse<Vec<Bundle>>> {
    let name = required(query.name.as_deref(), "Bundle name")?;
    let bundle = BundleRepository::new(state.pool())
        .find_by_name(name)
        .await?;
    Ok(ApiResponse::list(bundle.into_iter().collect()))
}

/// Bundles that contain a product.
///
/// # Errors
///
/// Returns 400 for a non-positive id.
pub async fn containing_product(
    State(state): State<AppState>,
    AppPath(product_id): AppPath<i32>,
) -> Result<ApiResponse<Vec<Bundle>>> {
    let product_id = positive(product_id, ProductId::positive, "product id")?;
    let bundles = BundleRepository::new(state.pool())
        .find_containing_product(product_id)
        .await?;
    Ok(ApiResponse::list(bundles))
}

/// One bundle.
///
/// # Errors
///
/// Returns 400 for a non-positive id and 404 if the bundle does not exist.
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<Bundle>> {
    let bundle = BundleRepository::new(state.pool())
        .find_by_id(bundle_id(id)?)
        .await?
        .ok_or_else(|| AppError::NotFound("Bundle not found".to_string()))?;
    Ok(ApiResponse::data(bundle))
}

/// The bundle joined with each of its products.
///
/// # Errors
///
/// Returns 400 for a non-positive id and 404 if the bundle does not exist.
pub async fn products(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<Vec<BundleProductRow>>> {
    let rows = BundleRepository::new(state.pool())
        .get_bundle_with_products(bundle_id(id)?)
        .await?;
    if rows.is_empty() {
        return Err(AppError::NotFound("Bundle not found".to_string()));
    }
    Ok(ApiResponse::list(rows))
}

/// Actual price, discounted price and savings of a bundle.
///
/// # Errors
///
/// Returns 400 for a non-positive id and 404 if the bundle does not exist.
pub async fn pricing(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<PricingInfo>> {
    let info = BundleRepository::new(state.pool())
        .get_pricing_info(bundle_id(id)?)
        .await?
        .ok_or_else(|| AppError::NotFound("Bundle not found".to_string()))?;
    Ok(ApiResponse::data(info))
}

/// Savings percentage of a bundle.
///
/// # Errors
///
/// Returns 400 for a non-positive id.
pub async fn savings(
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<ApiResponse<BundleSavings>> {
    let id = bundle_id(id)?;
    let savings_percentage = BundleRepository::new(state.pool())
        .savings_percentage(id)
        .await?;
    Ok(ApiResponse::data(BundleSavings {
        bundle_id: id,
        savings_percentage,
    }))
}
