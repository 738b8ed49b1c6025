//! Seed the catalog with demo data from a YAML file.
//!
//! # Usage
//!
//! ```bash
//! scoop-cli seed catalog -f demo/catalog.yaml
//! ```
//!
//! # File Format
//!
//! ```yaml
//! branches: [Downtown, Airport]
//! categories:
//!   - name: Desserts
//!     banner_image: /img/desserts.jpg
//!     products:
//!       - slug: chocolate-cake
//!         title: Chocolate Cake
//!         price: "12.50"
//!         discount: { type: percentage, value: "10", start: 2024-01-01T00:00:00Z, end: 2024-01-31T23:59:59Z }
//!         branches: [Downtown]       # omit to show in every branch
//!         variants:
//!           - { name: Size, value: Large, price: "18.00" }
//!         images: [/img/cake-1.jpg, /img/cake-2.jpg]
//! bundles:
//!   - name: Party Pack
//!     discounted_price: "20.00"
//!     products: [chocolate-cake]
//! ```
//!
//! Everything is inserted in one transaction. Categories, branches and
//! bundles are matched by name and products by slug, so re-running a file
//! skips what already exists.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, info};

use scoop_core::{BranchId, BundleId, CategoryId, DiscountWindow, ProductId};

use super::database_url;

/// Errors from seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("{0}")]
    MissingEnvVar(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Validation(usize),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

// =============================================================================
// File Format
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSeed {
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub bundles: Vec<BundleSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategorySeed {
    pub name: String,
    pub banner_image: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub slug: String,
    pub title: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount: Option<DiscountSeed>,
    pub rating: Option<Decimal>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
    /// Branch names; `None` makes the product visible in every branch.
    pub branches: Option<Vec<String>>,
    #[serde(default)]
    pub variants: Vec<VariantSeed>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantSeed {
    pub name: String,
    pub value: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub discount: Option<DiscountSeed>,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscountSeed {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Decimal,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleSeed {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub discounted_price: Decimal,
    pub original_price: Option<Decimal>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Product slugs, from this file or already in the database.
    #[serde(default)]
    pub products: Vec<String>,
}

const fn in_stock_default() -> bool {
    true
}

impl DiscountSeed {
    const fn window(&self) -> DiscountWindow {
        DiscountWindow::new(self.start, self.end)
    }
}

/// Counts of inserted rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
    pub skipped_products: usize,
    pub variants: usize,
    pub images: usize,
    pub bundles: usize,
}

// =============================================================================
// Validation
// =============================================================================

/// Check a seed file for problems the database would reject or silently accept.
///
/// Bundle product slugs that are not in the file are not reported; they may
/// already exist in the database.
#[must_use]
pub fn validate(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let branches: HashSet<&str> = seed.branches.iter().map(String::as_str).collect();
    let mut category_names = HashSet::new();
    let mut slugs = HashSet::new();

    let check_price = |errors: &mut Vec<String>, what: &str, price: Decimal| {
        if price.is_sign_negative() {
            errors.push(format!("{what}: price must not be negative"));
        }
    };
    let check_discount = |errors: &mut Vec<String>, what: &str, discount: Option<&DiscountSeed>| {
        if let Some(d) = discount
            && let (Some(start), Some(end)) = (d.window().start, d.window().end)
            && start > end
        {
            errors.push(format!("{what}: discount starts after it ends"));
        }
    };

    for category in &seed.categories {
        if category.name.trim().is_empty() {
            errors.push("category with empty name".to_owned());
        }
        if !category_names.insert(category.name.as_str()) {
            errors.push(format!("duplicate category: {}", category.name));
        }

        for product in &category.products {
            let what = format!("product {}", product.slug);
            if product.slug.trim().is_empty() {
                errors.push(format!("product {:?} has an empty slug", product.title));
            }
            if !slugs.insert(product.slug.as_str()) {
                errors.push(format!("duplicate product slug: {}", product.slug));
            }
            check_price(&mut errors, &what, product.price);
            check_discount(&mut errors, &what, product.discount.as_ref());

            for branch in product.branches.iter().flatten() {
                if !branches.contains(branch.as_str()) {
                    errors.push(format!("{what}: unknown branch {branch}"));
                }
            }

            for variant in &product.variants {
                let what = format!("{what} variant {}={}", variant.name, variant.value);
                check_price(&mut errors, &what, variant.price);
                check_discount(&mut errors, &what, variant.discount.as_ref());
            }
        }
    }

    let mut bundle_names = HashSet::new();
    for bundle in &seed.bundles {
        if !bundle_names.insert(bundle.name.as_str()) {
            errors.push(format!("duplicate bundle: {}", bundle.name));
        }
        check_price(
            &mut errors,
            &format!("bundle {}", bundle.name),
            bundle.discounted_price,
        );
    }

    errors
}

// =============================================================================
// Command
// =============================================================================

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// or a database operation fails. Nothing is written on failure.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    let database_url = database_url().map_err(SeedError::MissingEnvVar)?;

    info!(path = %file_path, "Loading catalog seed");
    let content = tokio::fs::read_to_string(Path::new(file_path))
        .await
        .map_err(|source| SeedError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    // Validate before connecting to database
    let errors = validate(&seed);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Validation(errors.len()));
    }

    let pool = PgPool::connect(database_url.expose_secret()).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;
    let summary = insert_catalog(&mut tx, &seed).await?;
    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Categories: {}", summary.categories);
    info!(
        "  Products inserted: {} (skipped, already exist: {})",
        summary.products, summary.skipped_products
    );
    info!("  Variants: {}", summary.variants);
    info!("  Images: {}", summary.images);
    info!("  Bundles: {}", summary.bundles);

    Ok(())
}

async fn insert_catalog(
    tx: &mut Transaction<'_, Postgres>,
    seed: &CatalogSeed,
) -> Result<SeedSummary, sqlx::Error> {
    let mut summary = SeedSummary::default();

    let mut branch_ids: HashMap<&str, BranchId> = HashMap::new();
    for name in &seed.branches {
        let id: BranchId = sqlx::query_scalar(
            r"
            INSERT INTO shop.branch (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await?;
        branch_ids.insert(name.as_str(), id);
    }

    let mut product_ids: HashMap<&str, ProductId> = HashMap::new();
    for category in &seed.categories {
        let category_id: CategoryId = sqlx::query_scalar(
            r"
            INSERT INTO shop.category (name, banner_image) VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET banner_image = EXCLUDED.banner_image
            RETURNING id
            ",
        )
        .bind(&category.name)
        .bind(category.banner_image.as_deref())
        .fetch_one(&mut **tx)
        .await?;
        summary.categories += 1;

        for product in &category.products {
            let Some(product_id) = insert_product(tx, category_id, product).await? else {
                summary.skipped_products += 1;
                continue;
            };
            summary.products += 1;
            product_ids.insert(product.slug.as_str(), product_id);

            for variant in &product.variants {
                insert_variant(tx, product_id, variant).await?;
                summary.variants += 1;
            }

            for (position, image) in product.images.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO shop.product_image (product_id, image, sort_order) VALUES ($1, $2, $3)",
                )
                .bind(product_id)
                .bind(image)
                .bind(i32::try_from(position).unwrap_or(i32::MAX))
                .execute(&mut **tx)
                .await?;
                summary.images += 1;
            }

            let branches: Vec<Option<BranchId>> = match &product.branches {
                None => vec![None],
                Some(names) => names
                    .iter()
                    .filter_map(|n| branch_ids.get(n.as_str()).copied().map(Some))
                    .collect(),
            };
            for branch in branches {
                sqlx::query("INSERT INTO shop.branch_product (product_id, branch_id) VALUES ($1, $2)")
                    .bind(product_id)
                    .bind(branch)
                    .execute(&mut **tx)
                    .await?;
            }
        }
    }

    for bundle in &seed.bundles {
        let bundle_id: Option<BundleId> = sqlx::query_scalar(
            r"
            INSERT INTO shop.bundle (
                name, description, image, discounted_price, original_price,
                discount_start, discount_end
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            ",
        )
        .bind(&bundle.name)
        .bind(bundle.description.as_deref())
        .bind(bundle.image.as_deref())
        .bind(bundle.discounted_price)
        .bind(bundle.original_price)
        .bind(bundle.start)
        .bind(bundle.end)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(bundle_id) = bundle_id else {
            info!(bundle = %bundle.name, "Bundle already exists, skipping");
            continue;
        };
        summary.bundles += 1;

        for slug in &bundle.products {
            let product_id = match product_ids.get(slug.as_str()) {
                Some(id) => Some(*id),
                None => {
                    sqlx::query_scalar::<_, ProductId>(
                        "SELECT id FROM shop.product WHERE slug = $1",
                    )
                    .bind(slug)
                    .fetch_optional(&mut **tx)
                    .await?
                }
            };
            let Some(product_id) = product_id else {
                tracing::warn!(bundle = %bundle.name, slug = %slug, "Unknown bundle product, skipping");
                continue;
            };

            sqlx::query("INSERT INTO shop.bundle_product (bundle_id, product_id) VALUES ($1, $2)")
                .bind(bundle_id)
                .bind(product_id)
                .execute(&mut **tx)
                .await?;
        }
    }

    Ok(summary)
}

/// Insert a product unless its slug exists. Returns the new id.
async fn insert_product(
    tx: &mut Transaction<'_, Postgres>,
    category_id: CategoryId,
    product: &ProductSeed,
) -> Result<Option<ProductId>, sqlx::Error> {
    let discount = product.discount.as_ref();
    sqlx::query_scalar(
        r"
        INSERT INTO shop.product (
            category_id, slug, title, image, price, original_price,
            discount_type, discount_value, discount_start, discount_end,
            rating, description, manufacturer, in_stock
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        ON CONFLICT (slug) DO NOTHING
        RETURNING id
        ",
    )
    .bind(category_id)
    .bind(&product.slug)
    .bind(&product.title)
    .bind(product.image.as_deref())
    .bind(product.price)
    .bind(product.original_price)
    .bind(discount.map(|d| d.kind.as_str()))
    .bind(discount.map(|d| d.value))
    .bind(discount.and_then(|d| d.start))
    .bind(discount.and_then(|d| d.end))
    .bind(product.rating)
    .bind(product.description.as_deref())
    .bind(product.manufacturer.as_deref())
    .bind(product.in_stock)
    .fetch_optional(&mut **tx)
    .await
}

async fn insert_variant(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    variant: &VariantSeed,
) -> Result<(), sqlx::Error> {
    let discount = variant.discount.as_ref();
    sqlx::query(
        r"
        INSERT INTO shop.variant (
            product_id, name, value, price, original_price,
            discount_type, discount_value, discount_start, discount_end, in_stock
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ",
    )
    .bind(product_id)
    .bind(&variant.name)
    .bind(&variant.value)
    .bind(variant.price)
    .bind(variant.original_price)
    .bind(discount.map(|d| d.kind.as_str()))
    .bind(discount.map(|d| d.value))
    .bind(discount.and_then(|d| d.start))
    .bind(discount.and_then(|d| d.end))
    .bind(variant.in_stock)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SEED: &str = r#"
branches: [Downtown]
categories:
  - name: Desserts
    banner_image: /img/desserts.jpg
    products:
      - slug: chocolate-cake
        title: Chocolate Cake
        price: "12.50"
        discount: { type: percentage, value: "10", start: "2024-01-01T00:00:00Z", end: "2024-01-31T23:59:59Z" }
        branches: [Downtown]
        variants:
          - { name: Size, value: Large, price: "18.00" }
        images: [/img/cake-1.jpg]
      - slug: lemon-tart
        title: Lemon Tart
        price: "6"
        in_stock: false
bundles:
  - name: Party Pack
    discounted_price: "15.00"
    products: [chocolate-cake, lemon-tart]
"#;

    #[test]
    fn test_parses_seed_file() {
        let seed: CatalogSeed = serde_yaml::from_str(SEED).unwrap();

        assert_eq!(seed.branches, vec!["Downtown"]);
        assert_eq!(seed.categories.len(), 1);

        let cake = &seed.categories[0].products[0];
        assert_eq!(cake.price, Decimal::new(1250, 2));
        assert!(cake.in_stock);
        assert_eq!(cake.variants.len(), 1);
        assert_eq!(cake.discount.as_ref().unwrap().kind, "percentage");

        let tart = &seed.categories[0].products[1];
        assert!(!tart.in_stock);
        assert!(tart.branches.is_none());

        assert_eq!(seed.bundles[0].products, vec!["chocolate-cake", "lemon-tart"]);
        assert!(validate(&seed).is_empty());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let result: Result<CatalogSeed, _> = serde_yaml::from_str("categoriez: []");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_reports_problems() {
        let seed: CatalogSeed = serde_yaml::from_str(
            r#"
categories:
  - name: Desserts
    products:
      - { slug: cake, title: Cake, price: "-1", branches: [Nowhere] }
      - slug: cake
        title: Cake again
        price: "2"
        discount: { type: fixed, value: "1", start: "2024-02-01T00:00:00Z", end: "2024-01-01T00:00:00Z" }
  - name: Desserts
"#,
        )
        .unwrap();

        let errors = validate(&seed);
        assert!(errors.iter().any(|e| e.contains("price must not be negative")));
        assert!(errors.iter().any(|e| e.contains("unknown branch Nowhere")));
        assert!(errors.iter().any(|e| e == "duplicate product slug: cake"));
        assert!(errors.iter().any(|e| e.contains("discount starts after it ends")));
        assert!(errors.iter().any(|e| e == "duplicate category: Desserts"));
    }
}
