//! Banner route handlers.

use axum::{Router, extract::State, routing::get};
use chrono::Utc;

use crate::db::BannerRepository;
use crate::error::{AppError, Result};
use crate::middleware::Branch;
use crate::models::banner::BannerCampaign;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Build the banner router (mounted at `/api/banners`).
pub fn router() -> Router<AppState> {
    Router::new().route("/active", get(active))
}

/// Campaigns running now, with their active banners.
///
/// # Errors
///
/// Returns 404 when no campaign is running.
pub async fn active(
    State(state): State<AppState>,
    Branch(branch): Branch,
) -> Result<ApiResponse<Vec<BannerCampaign>>> {
    let campaigns = BannerRepository::new(state.pool())
        .get_active_campaigns(branch, Utc::now())
        .await?;
    if campaigns.is_empty() {
        return Err(AppError::NotFound("No active banners found".to_string()));
    }
    Ok(ApiResponse::list(campaigns))
}
