//! Flat rows of the category aggregation join and their projection into
//! per-entity field groups.
//!
//! The join emits one row per (category, product, variant, image, bundle)
//! combination. Every column is prefixed with the entity it belongs to, and
//! everything below `category_*` is outer-joined, so any group may be NULL.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use scoop_core::{BundleId, CategoryId, DiscountWindow, ImageId, ProductId, VariantId};

use crate::models::catalog::{AdditionalImage, Discount, ProductBundle, ProductDetails, Variant};

/// One row of the category → product → variant → image → bundle join.
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct CatalogRow {
    pub category_id: i32,
    pub category_name: String,
    pub category_banner_image: Option<String>,

    pub product_id: Option<i32>,
    pub product_slug: Option<String>,
    pub product_title: Option<String>,
    pub product_image: Option<String>,
    pub product_price: Option<Decimal>,
    pub product_original_price: Option<Decimal>,
    pub product_discount_type: Option<String>,
    pub product_discount_value: Option<Decimal>,
    pub product_discount_start: Option<DateTime<Utc>>,
    pub product_discount_end: Option<DateTime<Utc>>,
    pub product_rating: Option<Decimal>,
    pub product_description: Option<String>,
    pub product_manufacturer: Option<String>,
    pub product_in_stock: Option<bool>,

    pub variant_id: Option<i32>,
    pub variant_name: Option<String>,
    pub variant_value: Option<String>,
    pub variant_price: Option<Decimal>,
    pub variant_original_price: Option<Decimal>,
    pub variant_discount_type: Option<String>,
    pub variant_discount_value: Option<Decimal>,
    pub variant_discount_start: Option<DateTime<Utc>>,
    pub variant_discount_end: Option<DateTime<Utc>>,
    pub variant_in_stock: Option<bool>,

    pub additional_image_id: Option<i32>,
    pub additional_image_path: Option<String>,

    pub bundle_id: Option<i32>,
    pub bundle_name: Option<String>,
    pub bundle_discounted_price: Option<Decimal>,
    pub bundle_original_price: Option<Decimal>,
    pub bundle_discount_start: Option<DateTime<Utc>>,
    pub bundle_discount_end: Option<DateTime<Utc>>,
}

/// Category columns of a row. Always present: the join is rooted at category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFields {
    pub id: CategoryId,
    pub name: String,
    pub banner_image: Option<String>,
}

/// Product columns, shared by the aggregation join and the flat product
/// listing queries (which select the same names without a prefix).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProductFields {
    pub id: ProductId,
    pub slug: String,
    pub title: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub discount_start: Option<DateTime<Utc>>,
    pub discount_end: Option<DateTime<Utc>>,
    pub rating: Option<Decimal>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub in_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantFields {
    pub id: VariantId,
    pub name: String,
    pub value: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub window: DiscountWindow,
    pub in_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFields {
    pub id: ImageId,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFields {
    pub id: BundleId,
    pub name: String,
    pub discounted_price: Decimal,
    pub original_price: Option<Decimal>,
    pub window: DiscountWindow,
}

/// A row split into its field groups. `None` means the group is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowParts {
    pub category: CategoryFields,
    pub product: Option<ProductFields>,
    pub variant: Option<VariantFields>,
    pub image: Option<ImageFields>,
    pub bundle: Option<BundleFields>,
}

impl CatalogRow {
    /// Split the row into field groups.
    ///
    /// A group is present only when its id column is non-null. A group whose
    /// id is set but whose required columns are NULL is treated as absent.
    #[must_use]
    pub fn into_parts(self) -> RowParts {
        let category = CategoryFields {
            id: CategoryId::new(self.category_id),
            name: self.category_name,
            banner_image: self.category_banner_image,
        };

        let product = (|| {
            Some(ProductFields {
                id: ProductId::new(self.product_id?),
                slug: self.product_slug?,
                title: self.product_title?,
                image: self.product_image,
                price: self.product_price?,
                original_price: self.product_original_price,
                discount_type: self.product_discount_type,
                discount_value: self.product_discount_value,
                discount_start: self.product_discount_start,
                discount_end: self.product_discount_end,
                rating: self.product_rating,
                description: self.product_description,
                manufacturer: self.product_manufacturer,
                in_stock: self.product_in_stock.unwrap_or(false),
            })
        })();

        let variant = (|| {
            Some(VariantFields {
                id: VariantId::new(self.variant_id?),
                name: self.variant_name?,
                value: self.variant_value?,
                price: self.variant_price?,
                original_price: self.variant_original_price,
                discount_type: self.variant_discount_type,
                discount_value: self.variant_discount_value,
                window: DiscountWindow::new(self.variant_discount_start, self.variant_discount_end),
                in_stock: self.variant_in_stock.unwrap_or(false),
            })
        })();

        let image = (|| {
            Some(ImageFields {
                id: ImageId::new(self.additional_image_id?),
                path: self.additional_image_path?,
            })
        })();

        let bundle = (|| {
            Some(BundleFields {
                id: BundleId::new(self.bundle_id?),
                name: self.bundle_name?,
                discounted_price: self.bundle_discounted_price?,
                original_price: self.bundle_original_price,
                window: DiscountWindow::new(self.bundle_discount_start, self.bundle_discount_end),
            })
        })();

        RowParts {
            category,
            product,
            variant,
            image,
            bundle,
        }
    }
}

impl ProductFields {
    /// Discount window of the product.
    #[must_use]
    pub const fn window(&self) -> DiscountWindow {
        DiscountWindow::new(self.discount_start, self.discount_end)
    }

    /// Product scalars with the discount evaluated at `now`.
    #[must_use]
    pub fn into_details(self, now: DateTime<Utc>) -> ProductDetails {
        let window = self.window();
        let discount = Discount::evaluate(self.discount_type, self.discount_value, window, now);
        ProductDetails {
            id: self.id,
            slug: self.slug,
            title: self.title,
            image: self.image,
            price: self.price,
            original_price: self.original_price,
            discount,
            rating: self.rating,
            description: self.description,
            manufacturer: self.manufacturer,
            in_stock: self.in_stock,
        }
    }
}

impl VariantFields {
    #[must_use]
    pub fn into_variant(self, now: DateTime<Utc>) -> Variant {
        Variant {
            id: self.id,
            name: self.name,
            value: self.value,
            price: self.price,
            original_price: self.original_price,
            discount: Discount::evaluate(self.discount_type, self.discount_value, self.window, now),
            in_stock: self.in_stock,
        }
    }
}

impl From<ImageFields> for AdditionalImage {
    fn from(fields: ImageFields) -> Self {
        Self {
            id: fields.id,
            image: fields.path,
        }
    }
}

impl BundleFields {
    #[must_use]
    pub fn into_bundle(self, now: DateTime<Utc>) -> ProductBundle {
        ProductBundle {
            id: self.id,
            name: self.name,
            discounted_price: self.discounted_price,
            original_price: self.original_price,
            discount: Discount::evaluate(None, None, self.window, now),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn category_only() -> CatalogRow {
        CatalogRow {
            category_id: 1,
            category_name: "Desserts".to_owned(),
            ..CatalogRow::default()
        }
    }

    #[test]
    fn test_category_only_row_has_no_children() {
        let parts = category_only().into_parts();
        assert_eq!(parts.category.id, CategoryId::new(1));
        assert_eq!(parts.category.name, "Desserts");
        assert!(parts.product.is_none());
        assert!(parts.variant.is_none());
        assert!(parts.image.is_none());
        assert!(parts.bundle.is_none());
    }

    #[test]
    fn test_present_groups_are_projected() {
        let row = CatalogRow {
            product_id: Some(10),
            product_slug: Some("cake".to_owned()),
            product_title: Some("Cake".to_owned()),
            product_price: Some(Decimal::from(1000)),
            product_in_stock: Some(true),
            additional_image_id: Some(5),
            additional_image_path: Some("cake-side.png".to_owned()),
            ..category_only()
        };

        let parts = row.into_parts();
        let product = parts.product.unwrap();
        assert_eq!(product.id, ProductId::new(10));
        assert_eq!(product.title, "Cake");
        assert!(product.in_stock);
        assert_eq!(
            parts.image,
            Some(ImageFields {
                id: ImageId::new(5),
                path: "cake-side.png".to_owned(),
            })
        );
        assert!(parts.variant.is_none());
    }

    #[test]
    fn test_group_with_id_but_missing_required_column_is_absent() {
        let row = CatalogRow {
            variant_id: Some(100),
            variant_name: Some("size".to_owned()),
            // value and price missing
            ..category_only()
        };
        assert!(row.into_parts().variant.is_none());
    }

    #[test]
    fn test_bundle_projection_keeps_window() {
        let start = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let row = CatalogRow {
            bundle_id: Some(3),
            bundle_name: Some("Summer Pack".to_owned()),
            bundle_discounted_price: Some(Decimal::from(2000)),
            bundle_discount_start: Some(start),
            ..category_only()
        };
        let bundle = row.into_parts().bundle.unwrap();
        assert_eq!(bundle.window.start, Some(start));
        assert_eq!(bundle.window.end, None);
    }

    #[test]
    fn test_product_details_carry_evaluated_discount() {
        let start = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let end = "2024-01-31T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let row = CatalogRow {
            product_id: Some(10),
            product_slug: Some("cake".to_owned()),
            product_title: Some("Cake".to_owned()),
            product_price: Some(Decimal::from(1000)),
            product_in_stock: Some(true),
            product_discount_type: Some("percentage".to_owned()),
            product_discount_value: Some(Decimal::from(10)),
            product_discount_start: Some(start),
            product_discount_end: Some(end),
            ..category_only()
        };

        let now = "2024-01-15T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let details = row.into_parts().product.unwrap().into_details(now);
        assert_eq!(details.slug, "cake");
        assert_eq!(details.discount.kind.as_deref(), Some("percentage"));
        assert_eq!(details.discount.value, Some(Decimal::from(10)));
        assert_eq!(details.discount.start, Some(start));
        assert!(details.discount.is_active);
    }
}
