//! Database operations for the catalog and customer store.
//!
//! # Schema: `shop`
//!
//! ## Catalog
//!
//! - `category`, `product`, `variant`, `product_image`
//! - `bundle`, `bundle_product` - bundle composition (product, optional variant)
//! - `branch`, `branch_product` - product visibility per branch (NULL = every branch)
//! - `banner_campaign`, `media`, `media_meta`
//!
//! ## Customers
//!
//! - `user` - accounts with argon2 password hashes and a role
//! - `customer` - profiles, optionally linked to a user
//! - `address`, `wishlist`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p scoop-cli -- migrate
//! ```

pub mod addresses;
pub mod banners;
pub mod bundles;
pub mod catalog;
pub mod customers;
pub mod products;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

pub use addresses::AddressRepository;
pub use banners::BannerRepository;
pub use bundles::BundleRepository;
pub use catalog::CategoryRepository;
pub use customers::CustomerRepository;
pub use products::ProductRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique violation to `Conflict(message)`, anything else to `Database`.
    pub(crate) fn unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

// =============================================================================
// Listing: sort / limit / offset
// =============================================================================

/// Sort direction of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => " ASC",
            Self::Desc => " DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(format!("invalid sort order: {s}"))
        }
    }
}

/// A column a list endpoint may be sorted by.
///
/// Implementors map caller-facing names onto fixed SQL column expressions, so
/// no caller text ever reaches the query.
pub trait SortColumn: Copy {
    /// Parse a caller-facing column name.
    fn parse(name: &str) -> Option<Self>;

    /// The SQL expression to order by.
    fn column(self) -> &'static str;
}

/// Ordering and paging of a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions<S> {
    pub sort: Option<(S, SortDirection)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl<S> Default for ListOptions<S> {
    fn default() -> Self {
        Self {
            sort: None,
            limit: None,
            offset: None,
        }
    }
}

impl<S: SortColumn> ListOptions<S> {
    /// Append `ORDER BY`, `LIMIT` and `OFFSET` to `query`.
    ///
    /// `fallback` orders the rows when no sort column was requested. Limit and
    /// offset are each applied only when positive.
    pub(crate) fn push_to(&self, query: &mut QueryBuilder<'_, Postgres>, fallback: &str) {
        query.push(" ORDER BY ");
        match self.sort {
            Some((column, direction)) => {
                query.push(column.column());
                query.push(direction.as_sql());
            }
            None => {
                query.push(fallback);
            }
        }

        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            query.push(" LIMIT ");
            query.push_bind(limit);
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            query.push(" OFFSET ");
            query.push_bind(offset);
        }
    }
}

/// Append the branch visibility predicate for product alias `p`.
///
/// A product is visible in a branch when it has a `branch_product` row for
/// that branch or one with a NULL branch (visible everywhere).
pub(crate) fn push_branch_filter(
    query: &mut QueryBuilder<'_, Postgres>,
    branch: scoop_core::BranchId,
) {
    query.push(
        " AND EXISTS (SELECT 1 FROM shop.branch_product bp \
         WHERE bp.product_id = p.id AND (bp.branch_id = ",
    );
    query.push_bind(branch);
    query.push(" OR bp.branch_id IS NULL))");
}

/// `%keyword%` with LIKE metacharacters in the keyword escaped.
pub(crate) fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Col {
        Name,
    }

    impl SortColumn for Col {
        fn parse(name: &str) -> Option<Self> {
            (name == "name").then_some(Self::Name)
        }

        fn column(self) -> &'static str {
            "t.name"
        }
    }

    fn render(options: ListOptions<Col>) -> String {
        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM t");
        options.push_to(&mut query, "t.id");
        query.sql().to_owned()
    }

    #[test]
    fn test_default_uses_fallback_order() {
        assert_eq!(render(ListOptions::default()), "SELECT * FROM t ORDER BY t.id");
    }

    #[test]
    fn test_sort_limit_offset() {
        let sql = render(ListOptions {
            sort: Some((Col::Name, SortDirection::Desc)),
            limit: Some(10),
            offset: Some(20),
        });
        assert_eq!(sql, "SELECT * FROM t ORDER BY t.name DESC LIMIT $1 OFFSET $2");
    }

    #[test]
    fn test_non_positive_paging_is_ignored() {
        let sql = render(ListOptions {
            sort: None,
            limit: Some(0),
            offset: Some(0),
        });
        assert_eq!(sql, "SELECT * FROM t ORDER BY t.id");
    }

    #[test]
    fn test_offset_without_limit() {
        let sql = render(ListOptions {
            sort: None,
            limit: None,
            offset: Some(20),
        });
        assert_eq!(sql, "SELECT * FROM t ORDER BY t.id OFFSET $1");

        let sql = render(ListOptions {
            sort: None,
            limit: Some(0),
            offset: Some(5),
        });
        assert_eq!(sql, "SELECT * FROM t ORDER BY t.id OFFSET $1");
    }

    #[test]
    fn test_sort_direction_parse() {
        assert_eq!("DESC".parse::<SortDirection>(), Ok(SortDirection::Desc));
        assert_eq!("asc".parse::<SortDirection>(), Ok(SortDirection::Asc));
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("cake"), "%cake%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_branch_filter_binds_branch() {
        let mut query = QueryBuilder::<Postgres>::new("SELECT p.id FROM shop.product p WHERE TRUE");
        push_branch_filter(&mut query, scoop_core::BranchId::new(2));
        assert!(query.sql().contains("bp.branch_id = $1 OR bp.branch_id IS NULL"));
    }
}
