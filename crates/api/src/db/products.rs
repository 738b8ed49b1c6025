//! Flat product queries. All of them honour the optional branch filter.

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use scoop_core::{BranchId, CategoryId, ImageId, ProductId};

use super::{ListOptions, RepositoryError, SortColumn, like_pattern, push_branch_filter};
use crate::catalog::ProductFields;
use crate::models::catalog::{AdditionalImage, ProductDetails, ProductWithImages};

const PRODUCT_COLUMNS: &str = r"
    SELECT
        p.id, p.slug, p.title, p.image, p.price, p.original_price,
        p.discount_type, p.discount_value, p.discount_start, p.discount_end,
        p.rating, p.description, p.manufacturer, p.in_stock
    FROM shop.product p
    WHERE TRUE";

/// Columns product listings can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductSort {
    Id,
    Title,
    Price,
    Rating,
    CreatedAt,
}

impl SortColumn for ProductSort {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "title" => Some(Self::Title),
            "price" => Some(Self::Price),
            "rating" => Some(Self::Rating),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Id => "p.id",
            Self::Title => "p.title",
            Self::Price => "p.price",
            Self::Rating => "p.rating",
            Self::CreatedAt => "p.created_at",
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ImageRow {
    id: ImageId,
    image: String,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products visible in `branch`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_all(
        &self,
        branch: Option<BranchId>,
        options: ListOptions<ProductSort>,
    ) -> Result<Vec<ProductDetails>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(PRODUCT_COLUMNS);
        self.fetch_list(&mut query, branch, options).await
    }

    /// Products of one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_by_category(
        &self,
        category_id: CategoryId,
        branch: Option<BranchId>,
        options: ListOptions<ProductSort>,
    ) -> Result<Vec<ProductDetails>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(PRODUCT_COLUMNS);
        query.push(" AND p.category_id = ").push_bind(category_id);
        self.fetch_list(&mut query, branch, options).await
    }

    /// Products whose title or description contains `keyword`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(
        &self,
        keyword: &str,
        branch: Option<BranchId>,
        options: ListOptions<ProductSort>,
    ) -> Result<Vec<ProductDetails>, RepositoryError> {
        let pattern = like_pattern(keyword);
        let mut query = QueryBuilder::<Postgres>::new(PRODUCT_COLUMNS);
        query
            .push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
        self.fetch_list(&mut query, branch, options).await
    }

    /// Product by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_by_slug(
        &self,
        slug: &str,
        branch: Option<BranchId>,
    ) -> Result<Option<ProductDetails>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(PRODUCT_COLUMNS);
        query.push(" AND p.slug = ").push_bind(slug.to_owned());
        if let Some(branch) = branch {
            push_branch_filter(&mut query, branch);
        }

        let row = query
            .build_query_as::<ProductFields>()
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|fields| fields.into_details(Utc::now())))
    }

    /// Product with its additional images.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    #[instrument(skip(self))]
    pub async fn find_with_images(
        &self,
        id: ProductId,
        branch: Option<BranchId>,
    ) -> Result<Option<ProductWithImages>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(PRODUCT_COLUMNS);
        query.push(" AND p.id = ").push_bind(id);
        if let Some(branch) = branch {
            push_branch_filter(&mut query, branch);
        }

        let Some(fields) = query
            .build_query_as::<ProductFields>()
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let images = sqlx::query_as::<_, ImageRow>(
            r"
            SELECT id, image
            FROM shop.product_image
            WHERE product_id = $1
            ORDER BY sort_order, id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(ProductWithImages {
            details: fields.into_details(Utc::now()),
            additional_images: images
                .into_iter()
                .map(|row| AdditionalImage {
                    id: row.id,
                    image: row.image,
                })
                .collect(),
        }))
    }

    async fn fetch_list(
        &self,
        query: &mut QueryBuilder<'_, Postgres>,
        branch: Option<BranchId>,
        options: ListOptions<ProductSort>,
    ) -> Result<Vec<ProductDetails>, RepositoryError> {
        if let Some(branch) = branch {
            push_branch_filter(query, branch);
        }
        options.push_to(query, "p.id");

        let rows = query
            .build_query_as::<ProductFields>()
            .fetch_all(self.pool)
            .await?;

        let now = Utc::now();
        Ok(rows.into_iter().map(|f| f.into_details(now)).collect())
    }
}
