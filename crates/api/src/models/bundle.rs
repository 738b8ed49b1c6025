//! Bundle response types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use scoop_core::{BundleId, BundlePricing, ProductId, VariantId};

use super::catalog::Discount;

/// A bundle row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub id: BundleId,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub discounted_price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount: Discount,
    pub created_at: DateTime<Utc>,
}

/// One (bundle, product) pair of a bundle's composition.
///
/// Product columns are `None` for a bundle that has no linked products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleProductRow {
    pub bundle_id: BundleId,
    pub bundle_name: String,
    pub discounted_price: Decimal,
    pub original_price: Option<Decimal>,
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

/// Pricing figures of one bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInfo {
    pub bundle_id: BundleId,
    pub bundle_name: String,
    #[serde(flatten)]
    pub pricing: BundlePricing,
}

/// Savings percentage of one bundle; zero for an unknown bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSavings {
    pub bundle_id: BundleId,
    pub savings_percentage: Decimal,
}
