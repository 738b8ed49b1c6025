//! Favorite products per user.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use scoop_core::{ProductId, UserId, WishlistId};

use super::RepositoryError;
use crate::models::wishlist::WishlistItem;

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    id: WishlistId,
    product_id: ProductId,
    slug: String,
    title: String,
    image: Option<String>,
    price: Decimal,
    in_stock: bool,
    created_at: DateTime<Utc>,
}

impl From<WishlistRow> for WishlistItem {
    fn from(row: WishlistRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            slug: row.slug,
            title: row.title,
            image: row.image,
            price: row.price,
            in_stock: row.in_stock,
            added_at: row.created_at,
        }
    }
}

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a product to the user's favorites.
    ///
    /// Idempotent: adding an existing favorite returns its id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<WishlistId, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let id = sqlx::query_scalar::<_, WishlistId>(
            r"
            INSERT INTO shop.wishlist (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(id)
    }

    /// Remove a product from the user's favorites. Returns whether it was there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.wishlist WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The user's favorites with product details, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistRow>(
            r"
            SELECT w.id, w.product_id, p.slug, p.title, p.image, p.price, p.in_stock, w.created_at
            FROM shop.wishlist w
            JOIN shop.product p ON p.id = w.product_id
            WHERE w.user_id = $1
            ORDER BY w.created_at DESC, w.id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
