//! Favorite products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use scoop_core::{ProductId, WishlistId};

/// A wishlist entry with the product fields needed to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    pub id: WishlistId,
    pub product_id: ProductId,
    pub slug: String,
    pub title: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub in_stock: bool,
    pub added_at: DateTime<Utc>,
}

/// Result of adding a favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteAdded {
    pub wishlist_id: WishlistId,
    pub product_id: ProductId,
}
