//! Incremental assembly of the category tree from ordered join rows.
//!
//! Rows arrive sorted by category name, product title and variant name/value.
//! Categories and products keep first-seen order, so the output preserves the
//! query's `ORDER BY`. Children are deduplicated by id: one product with two
//! variants, three images and one bundle arrives as six rows but yields two
//! variants, three images and one bundle.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use scoop_core::{BundleId, CategoryId, ImageId, ProductId, VariantId};

use super::row::{CatalogRow, CategoryFields, RowParts};
use crate::models::catalog::{Category, Product};

/// Builds `Category` trees from a stream of [`CatalogRow`]s.
///
/// All discount flags are evaluated against the single `now` given to
/// [`CatalogAssembler::new`].
#[derive(Debug)]
pub struct CatalogAssembler {
    now: DateTime<Utc>,
    categories: Vec<CategoryNode>,
    index: HashMap<CategoryId, usize>,
}

#[derive(Debug)]
struct CategoryNode {
    category: Category,
    products: HashMap<ProductId, usize>,
    seen: Vec<SeenChildren>,
}

/// Child ids already attached to one product, parallel to `category.products`.
#[derive(Debug, Default)]
struct SeenChildren {
    variants: HashSet<VariantId>,
    images: HashSet<ImageId>,
    bundles: HashSet<BundleId>,
}

impl CatalogAssembler {
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            categories: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Assemble every category present in `rows`.
    #[must_use]
    pub fn assemble(rows: impl IntoIterator<Item = CatalogRow>, now: DateTime<Utc>) -> Vec<Category> {
        let mut assembler = Self::new(now);
        for row in rows {
            assembler.push(row);
        }
        assembler.finish()
    }

    /// Assemble a single-category result. `None` when there were no rows.
    #[must_use]
    pub fn assemble_one(
        rows: impl IntoIterator<Item = CatalogRow>,
        now: DateTime<Utc>,
    ) -> Option<Category> {
        Self::assemble(rows, now).into_iter().next()
    }

    /// Fold one row into the tree.
    pub fn push(&mut self, row: CatalogRow) {
        let RowParts {
            category,
            product,
            variant,
            image,
            bundle,
        } = row.into_parts();

        let now = self.now;
        let node = self.category_node(category);

        // Children without a product have nowhere to go.
        let Some(product) = product else {
            return;
        };

        let slot = match node.products.get(&product.id) {
            Some(&slot) => slot,
            None => {
                let slot = node.category.products.len();
                node.products.insert(product.id, slot);
                node.category
                    .products
                    .push(Product::new(product.into_details(now)));
                node.seen.push(SeenChildren::default());
                slot
            }
        };

        let (Some(target), Some(seen)) =
            (node.category.products.get_mut(slot), node.seen.get_mut(slot))
        else {
            return;
        };

        if let Some(variant) = variant
            && seen.variants.insert(variant.id)
        {
            target.variants.push(variant.into_variant(now));
        }

        if let Some(image) = image
            && seen.images.insert(image.id)
        {
            target.additional_images.push(image.into());
        }

        if let Some(bundle) = bundle
            && seen.bundles.insert(bundle.id)
        {
            target.bundles.push(bundle.into_bundle(now));
        }
    }

    /// Categories in first-seen order.
    #[must_use]
    pub fn finish(self) -> Vec<Category> {
        self.categories
            .into_iter()
            .map(|node| node.category)
            .collect()
    }

    // `index` only holds positions of nodes already pushed to `categories`.
    #[allow(clippy::indexing_slicing)]
    fn category_node(&mut self, fields: CategoryFields) -> &mut CategoryNode {
        let slot = *self.index.entry(fields.id).or_insert_with(|| {
            self.categories.push(CategoryNode {
                category: Category {
                    id: fields.id,
                    name: fields.name,
                    banner_image: fields.banner_image,
                    products: Vec::new(),
                },
                products: HashMap::new(),
                seen: Vec::new(),
            });
            self.categories.len() - 1
        });
        &mut self.categories[slot]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn category(id: i32, name: &str) -> CatalogRow {
        CatalogRow {
            category_id: id,
            category_name: name.to_owned(),
            ..CatalogRow::default()
        }
    }

    fn with_product(row: CatalogRow, id: i32, title: &str) -> CatalogRow {
        CatalogRow {
            product_id: Some(id),
            product_slug: Some(title.to_lowercase()),
            product_title: Some(title.to_owned()),
            product_price: Some(Decimal::from(1000)),
            product_in_stock: Some(true),
            ..row
        }
    }

    fn with_variant(row: CatalogRow, id: i32, value: &str) -> CatalogRow {
        CatalogRow {
            variant_id: Some(id),
            variant_name: Some("size".to_owned()),
            variant_value: Some(value.to_owned()),
            variant_price: Some(Decimal::from(1200)),
            variant_in_stock: Some(true),
            ..row
        }
    }

    fn with_image(row: CatalogRow, id: i32) -> CatalogRow {
        CatalogRow {
            additional_image_id: Some(id),
            additional_image_path: Some(format!("img-{id}.png")),
            ..row
        }
    }

    fn with_bundle(row: CatalogRow, id: i32) -> CatalogRow {
        CatalogRow {
            bundle_id: Some(id),
            bundle_name: Some(format!("Bundle {id}")),
            bundle_discounted_price: Some(Decimal::from(2000)),
            ..row
        }
    }

    #[test]
    fn test_single_product_without_children() {
        let rows = vec![with_product(category(1, "Desserts"), 10, "Cake")];

        let categories = CatalogAssembler::assemble(rows, now());

        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, CategoryId::new(1));
        assert_eq!(categories[0].name, "Desserts");
        assert_eq!(categories[0].products.len(), 1);
        let product = &categories[0].products[0];
        assert_eq!(product.id(), ProductId::new(10));
        assert_eq!(product.details.title, "Cake");
        assert!(product.variants.is_empty());
        assert!(product.additional_images.is_empty());
        assert!(product.bundles.is_empty());
    }

    #[test]
    fn test_two_variant_rows_give_two_variants() {
        let base = with_product(category(1, "Desserts"), 10, "Cake");
        let rows = vec![
            with_variant(base.clone(), 100, "large"),
            with_variant(base, 101, "small"),
        ];

        let categories = CatalogAssembler::assemble(rows, now());

        let product = &categories[0].products[0];
        assert_eq!(categories[0].products.len(), 1);
        let ids: Vec<_> = product.variants.iter().map(|v| v.id.as_i32()).collect();
        assert_eq!(ids, [100, 101]);
    }

    #[test]
    fn test_cartesian_rows_are_deduplicated() {
        let base = with_product(category(1, "Desserts"), 10, "Cake");
        let mut rows = Vec::new();
        for variant in [100, 101] {
            for image in [5, 6, 7] {
                rows.push(with_bundle(
                    with_image(with_variant(base.clone(), variant, "v"), image),
                    3,
                ));
            }
        }

        let categories = CatalogAssembler::assemble(rows, now());

        let product = &categories[0].products[0];
        assert_eq!(product.variants.len(), 2);
        assert_eq!(product.additional_images.len(), 3);
        assert_eq!(product.bundles.len(), 1);
        assert_eq!(product.bundles[0].name, "Bundle 3");
    }

    #[test]
    fn test_first_seen_order_is_preserved() {
        let rows = vec![
            with_product(category(2, "Bakery"), 20, "Bread"),
            with_product(category(2, "Bakery"), 21, "Croissant"),
            with_product(category(1, "Desserts"), 10, "Cake"),
            with_product(category(2, "Bakery"), 20, "Bread"),
        ];

        let categories = CatalogAssembler::assemble(rows, now());

        let names: Vec<_> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Bakery", "Desserts"]);
        let titles: Vec<_> = categories[0]
            .products
            .iter()
            .map(|p| p.details.title.as_str())
            .collect();
        assert_eq!(titles, ["Bread", "Croissant"]);
    }

    #[test]
    fn test_category_without_products_is_kept() {
        let rows = vec![
            category(3, "Empty"),
            with_product(category(1, "Desserts"), 10, "Cake"),
        ];

        let categories = CatalogAssembler::assemble(rows, now());

        assert_eq!(categories.len(), 2);
        assert!(categories[0].products.is_empty());
    }

    #[test]
    fn test_same_product_id_in_two_categories_is_separate() {
        let rows = vec![
            with_product(category(1, "A"), 10, "Cake"),
            with_product(category(2, "B"), 10, "Cake"),
        ];

        let categories = CatalogAssembler::assemble(rows, now());

        assert_eq!(categories[0].products.len(), 1);
        assert_eq!(categories[1].products.len(), 1);
    }

    #[test]
    fn test_no_rows_is_not_found() {
        assert!(CatalogAssembler::assemble_one(Vec::new(), now()).is_none());
    }

    #[test]
    fn test_assemble_one_returns_the_category() {
        let rows = vec![with_product(category(1, "Desserts"), 10, "Cake")];
        let category = CatalogAssembler::assemble_one(rows, now()).unwrap();
        assert_eq!(category.id, CategoryId::new(1));
    }

    #[test]
    fn test_discount_flags_use_the_given_instant() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let row = CatalogRow {
            product_discount_type: Some("percentage".to_owned()),
            product_discount_value: Some(Decimal::from(10)),
            product_discount_start: Some(start),
            product_discount_end: Some(end),
            variant_discount_start: Some(start),
            variant_discount_end: None,
            bundle_discount_start: Some(start),
            bundle_discount_end: Some(end),
            ..with_bundle(with_variant(with_product(category(1, "D"), 10, "Cake"), 100, "l"), 3)
        };

        let inside = CatalogAssembler::assemble(vec![row.clone()], now());
        let product = &inside[0].products[0];
        assert!(product.details.discount.is_active);
        assert!(!product.variants[0].discount.is_active);
        assert!(product.bundles[0].discount.is_active);

        let later = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let outside = CatalogAssembler::assemble(vec![row], later);
        assert!(!outside[0].products[0].details.discount.is_active);
        assert!(!outside[0].products[0].bundles[0].discount.is_active);
    }

    #[test]
    fn test_children_without_product_are_dropped() {
        let row = with_image(with_variant(category(1, "D"), 100, "l"), 5);
        let categories = CatalogAssembler::assemble(vec![row], now());
        assert_eq!(categories.len(), 1);
        assert!(categories[0].products.is_empty());
    }
}
