//! Catalog response types: categories, products and their children.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use scoop_core::{BundleId, CategoryId, DiscountWindow, ImageId, ProductId, VariantId};

/// Discount attached to a product, variant or bundle, evaluated at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    /// Discount kind as stored (e.g. `percentage`, `fixed`).
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub value: Option<Decimal>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Whether `start <= now <= end` held when the response was built.
    pub is_active: bool,
}

impl Discount {
    /// Evaluate a discount window against `now`.
    #[must_use]
    pub fn evaluate(
        kind: Option<String>,
        value: Option<Decimal>,
        window: DiscountWindow,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            value,
            start: window.start,
            end: window.end,
            is_active: window.is_active_at(now),
        }
    }
}

/// Category without its products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub banner_image: Option<String>,
}

/// Category with its assembled products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub banner_image: Option<String>,
    pub products: Vec<Product>,
}

/// Scalar product fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount: Discount,
    pub rating: Option<Decimal>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub in_stock: bool,
}

/// Product with variants, additional images and the bundles it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(flatten)]
    pub details: ProductDetails,
    pub variants: Vec<Variant>,
    pub additional_images: Vec<AdditionalImage>,
    pub bundles: Vec<ProductBundle>,
}

impl Product {
    /// A product with no children yet.
    #[must_use]
    pub const fn new(details: ProductDetails) -> Self {
        Self {
            details,
            variants: Vec::new(),
            additional_images: Vec::new(),
            bundles: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ProductId {
        self.details.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: VariantId,
    pub name: String,
    pub value: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount: Discount,
    pub in_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdditionalImage {
    pub id: ImageId,
    pub image: String,
}

/// A bundle as listed under a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductBundle {
    pub id: BundleId,
    pub name: String,
    pub discounted_price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount: Discount,
}

/// Product with its additional images, as served by the image endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithImages {
    #[serde(flatten)]
    pub details: ProductDetails,
    pub additional_images: Vec<AdditionalImage>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn details() -> ProductDetails {
        ProductDetails {
            id: ProductId::new(10),
            slug: "cake".to_owned(),
            title: "Cake".to_owned(),
            image: None,
            price: Decimal::new(1250, 2),
            original_price: None,
            discount: Discount::evaluate(None, None, DiscountWindow::default(), Utc::now()),
            rating: None,
            description: None,
            manufacturer: None,
            in_stock: true,
        }
    }

    #[test]
    fn test_product_serializes_flat_with_camel_case_children() {
        let json = serde_json::to_value(Product::new(details())).unwrap();
        assert_eq!(json["id"], 10);
        assert_eq!(json["title"], "Cake");
        assert_eq!(json["price"], "12.50");
        assert_eq!(json["inStock"], true);
        assert_eq!(json["discount"]["isActive"], false);
        assert!(json["discount"]["type"].is_null());
        assert_eq!(json["additionalImages"], serde_json::json!([]));
        assert_eq!(json["variants"], serde_json::json!([]));
    }
}
