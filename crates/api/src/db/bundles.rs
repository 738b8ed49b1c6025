//! Bundle queries and pricing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use scoop_core::{BundleId, BundlePricing, DiscountWindow, ProductId, VariantId, savings_percentage};

use super::RepositoryError;
use crate::models::bundle::{Bundle, BundleProductRow, PricingInfo};
use crate::models::catalog::Discount;

const BUNDLE_COLUMNS: &str = r"
    b.id, b.name, b.description, b.image, b.discounted_price, b.original_price,
    b.discount_start, b.discount_end, b.created_at
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct BundleRow {
    id: BundleId,
    name: String,
    description: Option<String>,
    image: Option<String>,
    discounted_price: Decimal,
    original_price: Option<Decimal>,
    discount_start: Option<DateTime<Utc>>,
    discount_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl BundleRow {
    fn into_bundle(self, now: DateTime<Utc>) -> Bundle {
        let window = DiscountWindow::new(self.discount_start, self.discount_end);
        Bundle {
            id: self.id,
            name: self.name,
            description: self.description,
            image: self.image,
            discounted_price: self.discounted_price,
            original_price: self.original_price,
            discount: Discount::evaluate(None, None, window, now),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BundleProductDbRow {
    bundle_id: BundleId,
    bundle_name: String,
    discounted_price: Decimal,
    original_price: Option<Decimal>,
    product_id: Option<ProductId>,
    variant_id: Option<VariantId>,
    title: Option<String>,
    price: Option<Decimal>,
    image: Option<String>,
}

impl From<BundleProductDbRow> for BundleProductRow {
    fn from(row: BundleProductDbRow) -> Self {
        Self {
            bundle_id: row.bundle_id,
            bundle_name: row.bundle_name,
            discounted_price: row.discounted_price,
            original_price: row.original_price,
            product_id: row.product_id,
            variant_id: row.variant_id,
            title: row.title,
            price: row.price,
            image: row.image,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for bundle database operations.
pub struct BundleRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BundleRepository<'a> {
    /// Create a new bundle repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All bundles, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Bundle>, RepositoryError> {
        let sql = format!("SELECT {BUNDLE_COLUMNS} FROM shop.bundle b ORDER BY b.name, b.id");
        let rows = sqlx::query_as::<_, BundleRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        let now = Utc::now();
        Ok(rows.into_iter().map(|row| row.into_bundle(now)).collect())
    }

    /// Bundle by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: BundleId) -> Result<Option<Bundle>, RepositoryError> {
        let sql = format!("SELECT {BUNDLE_COLUMNS} FROM shop.bundle b WHERE b.id = $1");
        let row = sqlx::query_as::<_, BundleRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|row| row.into_bundle(Utc::now())))
    }

    /// Bundle whose name matches exactly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Bundle>, RepositoryError> {
        let sql = format!("SELECT {BUNDLE_COLUMNS} FROM shop.bundle b WHERE b.name = $1");
        let row = sqlx::query_as::<_, BundleRow>(&sql)
            .bind(name)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|row| row.into_bundle(Utc::now())))
    }

    /// Bundles that contain `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_containing_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Bundle>, RepositoryError> {
        let sql = format!(
            "SELECT {BUNDLE_COLUMNS} FROM shop.bundle b \
             WHERE EXISTS (SELECT 1 FROM shop.bundle_product bp \
                           WHERE bp.bundle_id = b.id AND bp.product_id = $1) \
             ORDER BY b.name, b.id"
        );
        let rows = sqlx::query_as::<_, BundleRow>(&sql)
            .bind(product_id)
            .fetch_all(self.pool)
            .await?;

        let now = Utc::now();
        Ok(rows.into_iter().map(|row| row.into_bundle(now)).collect())
    }

    /// The bundle joined with each linked product, one row per link.
    ///
    /// Empty when the bundle does not exist. A bundle without links yields a
    /// single row with `None` product columns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_bundle_with_products(
        &self,
        id: BundleId,
    ) -> Result<Vec<BundleProductRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, BundleProductDbRow>(
            r"
            SELECT
                b.id AS bundle_id,
                b.name AS bundle_name,
                b.discounted_price,
                b.original_price,
                bp.product_id,
                bp.variant_id,
                p.title,
                p.price,
                p.image
            FROM shop.bundle b
            LEFT JOIN shop.bundle_product bp ON bp.bundle_id = b.id
            LEFT JOIN shop.product p ON p.id = bp.product_id
            WHERE b.id = $1
            ORDER BY bp.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Sum of the unit prices of every product linked to the bundle.
    ///
    /// Zero when nothing is linked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn actual_price(&self, id: BundleId) -> Result<Decimal, RepositoryError> {
        let total: Decimal = sqlx::query_scalar(
            r"
            SELECT COALESCE(SUM(p.price), 0)::numeric
            FROM shop.bundle_product bp
            JOIN shop.product p ON p.id = bp.product_id
            WHERE bp.bundle_id = $1
            ",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(total)
    }

    /// Savings of the bundle in percent; zero when the bundle does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn savings_percentage(&self, id: BundleId) -> Result<Decimal, RepositoryError> {
        let Some(bundle) = self.find_by_id(id).await? else {
            return Ok(Decimal::ZERO);
        };
        let actual = self.actual_price(id).await?;
        Ok(savings_percentage(actual, bundle.discounted_price))
    }

    /// Full pricing breakdown, or `None` when the bundle does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn get_pricing_info(
        &self,
        id: BundleId,
    ) -> Result<Option<PricingInfo>, RepositoryError> {
        let Some(bundle) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        let actual = self.actual_price(id).await?;

        Ok(Some(PricingInfo {
            bundle_id: bundle.id,
            bundle_name: bundle.name,
            pricing: BundlePricing::compute(actual, bundle.discounted_price),
        }))
    }
}
