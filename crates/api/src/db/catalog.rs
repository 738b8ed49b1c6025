//! Category queries, including the category → product tree aggregation.

use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;

use scoop_core::{BranchId, CategoryId};

use super::RepositoryError;
use crate::catalog::{CatalogAssembler, CatalogRow};
use crate::models::catalog::{Category, CategorySummary};

/// Select list and joins shared by both aggregation queries.
///
/// `$1` is the optional branch. Only in-stock products are joined, so a
/// category without any still yields one row with NULL product columns.
const AGGREGATION_SELECT: &str = r"
    SELECT
        c.id AS category_id,
        c.name AS category_name,
        c.banner_image AS category_banner_image,

        p.id AS product_id,
        p.slug AS product_slug,
        p.title AS product_title,
        p.image AS product_image,
        p.price AS product_price,
        p.original_price AS product_original_price,
        p.discount_type AS product_discount_type,
        p.discount_value AS product_discount_value,
        p.discount_start AS product_discount_start,
        p.discount_end AS product_discount_end,
        p.rating AS product_rating,
        p.description AS product_description,
        p.manufacturer AS product_manufacturer,
        p.in_stock AS product_in_stock,

        v.id AS variant_id,
        v.name AS variant_name,
        v.value AS variant_value,
        v.price AS variant_price,
        v.original_price AS variant_original_price,
        v.discount_type AS variant_discount_type,
        v.discount_value AS variant_discount_value,
        v.discount_start AS variant_discount_start,
        v.discount_end AS variant_discount_end,
        v.in_stock AS variant_in_stock,

        i.id AS additional_image_id,
        i.image AS additional_image_path,

        b.id AS bundle_id,
        b.name AS bundle_name,
        b.discounted_price AS bundle_discounted_price,
        b.original_price AS bundle_original_price,
        b.discount_start AS bundle_discount_start,
        b.discount_end AS bundle_discount_end
    FROM shop.category c
    LEFT JOIN shop.product p
        ON p.category_id = c.id
        AND p.in_stock
        AND (
            $1::int4 IS NULL
            OR EXISTS (
                SELECT 1 FROM shop.branch_product bp
                WHERE bp.product_id = p.id
                  AND (bp.branch_id = $1 OR bp.branch_id IS NULL)
            )
        )
    LEFT JOIN shop.variant v ON v.product_id = p.id
    LEFT JOIN shop.product_image i ON i.product_id = p.id
    LEFT JOIN shop.bundle_product bpr ON bpr.product_id = p.id
    LEFT JOIN shop.bundle b ON b.id = bpr.bundle_id
";

const AGGREGATION_ORDER: &str = r"
    ORDER BY c.name, c.id, p.title, p.id, v.name, v.value, v.id, i.sort_order, i.id, b.id
";

/// Internal row type for plain category queries.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    banner_image: Option<String>,
}

impl From<CategoryRow> for CategorySummary {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            banner_image: row.banner_image,
        }
    }
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every category with its in-stock products, variants, images and bundles.
    ///
    /// With a branch, only products visible in that branch are included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_all_categories_with_banners_and_products(
        &self,
        branch: Option<BranchId>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!("{AGGREGATION_SELECT} {AGGREGATION_ORDER}");
        let rows = sqlx::query_as::<_, CatalogRow>(&sql)
            .bind(branch)
            .fetch_all(self.pool)
            .await?;

        let now = Utc::now();
        let row_count = rows.len();
        let categories = CatalogAssembler::assemble(rows, now);
        tracing::debug!(row_count, categories = categories.len(), "assembled category tree");

        Ok(categories)
    }

    /// One category with its products, or `None` when the id does not resolve.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_category_with_banner_and_products(
        &self,
        id: CategoryId,
        branch: Option<BranchId>,
    ) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("{AGGREGATION_SELECT} WHERE c.id = $2 {AGGREGATION_ORDER}");
        let rows = sqlx::query_as::<_, CatalogRow>(&sql)
            .bind(branch)
            .bind(id)
            .fetch_all(self.pool)
            .await?;

        Ok(CatalogAssembler::assemble_one(rows, Utc::now()))
    }

    /// All categories without products, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_all_categories(&self) -> Result<Vec<CategorySummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, banner_image
            FROM shop.category
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// A category without products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_category_by_id(
        &self,
        id: CategoryId,
    ) -> Result<Option<CategorySummary>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, banner_image
            FROM shop.category
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
