//! HTTP route handlers for the JSON API.
//!
//! # Route Structure
//!
//! ```text
//! # Categories
//! GET    /api/categories                         - Category list
//! GET    /api/categories/with-products           - Aggregated category tree
//! GET    /api/categories/{id}                    - One category
//! GET    /api/categories/{id}/with-products      - One aggregated category
//!
//! # Products (list endpoints take sort, order, limit, offset)
//! GET    /api/products                           - Product list
//! GET    /api/products/category/{categoryId}     - Products of a category
//! GET    /api/products/search?q=                 - Keyword search
//! GET    /api/products/slug/{slug}               - Product by slug
//! GET    /api/products/{id}/images               - Product with additional images
//!
//! # Bundles
//! GET    /api/bundles                            - Bundle list
//! GET    /api/bundles/search?name=               - Exact-name lookup
//! GET    /api/bundles/product/{productId}        - Bundles containing a product
//! GET    /api/bundles/{id}                       - One bundle
//! GET    /api/bundles/{id}/products              - Bundle/product rows
//! GET    /api/bundles/{id}/pricing               - Pricing breakdown
//! GET    /api/bundles/{id}/savings               - Savings percentage
//!
//! # Banners
//! GET    /api/banners/active                     - Running campaigns with banners
//!
//! # Customers
//! GET    /api/customers                          - Customer list
//! POST   /api/customers                          - Create customer
//! GET    /api/customers/statistics               - Counts
//! GET    /api/customers/email/{email}            - By email
//! GET    /api/customers/search/{query}           - Name/email search
//! GET    /api/customers/city/{city}              - By city
//! GET    /api/customers/{id}                     - One customer
//! PUT    /api/customers/{id}                     - Partial update
//! DELETE /api/customers/{id}                     - Delete
//!
//! # Users
//! GET    /api/users                              - Users with profiles
//! GET    /api/users/guests                       - Customers without an account
//! GET    /api/users/email/{email}                - By email
//! GET    /api/users/role/{role}                  - By role
//! POST   /api/users/register-customer            - Customer sign-up
//! POST   /api/users/register-with-role           - Staff account
//! POST   /api/users/login-customer               - Customer login
//! GET    /api/users/{id}                         - One user
//! PUT    /api/users/{id}/profile                 - Update account and profile
//! POST   /api/users/{id}/link-customer/{customerId}
//! GET    /api/users/{userId}/addresses           - Address book
//! POST   /api/users/{userId}/addresses
//! DELETE /api/users/{userId}/addresses/{addressId}
//! GET    /api/users/{userId}/favorites           - Wishlist
//! POST   /api/users/{userId}/favorites/{productId}
//! DELETE /api/users/{userId}/favorites/{productId}
//! ```
//!
//! Every response uses the [`ApiResponse`](crate::response::ApiResponse)
//! envelope. Catalog reads honour the `X-Branch-Id` header.

pub mod banners;
pub mod bundles;
pub mod categories;
pub mod customers;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
};
use serde::Deserialize;

use crate::db::{ListOptions, SortColumn, SortDirection};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// `axum::Json` whose rejections render as the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` whose rejections render as the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// `axum::extract::Path` whose rejections render as the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

/// Convert a raw path id into a typed id, rejecting non-positive values.
///
/// ```rust,ignore
/// let id = positive(raw, ProductId::positive, "product id")?;
/// ```
pub(crate) fn positive<T>(raw: i32, make: fn(i32) -> Option<T>, what: &str) -> Result<T> {
    make(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid {what}: {raw}")))
}

/// Reject a missing or blank required parameter.
pub(crate) fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

/// Sort and paging query parameters of list endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    /// Validate against the sortable columns of `S`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for unknown columns or orders and for
    /// negative paging values.
    pub fn into_options<S: SortColumn>(self) -> Result<ListOptions<S>> {
        let direction = match self.order.as_deref().map(str::trim) {
            None | Some("") => SortDirection::default(),
            Some(order) => order.parse().map_err(AppError::BadRequest)?,
        };

        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => {
                let column = S::parse(name)
                    .ok_or_else(|| AppError::BadRequest(format!("invalid sort column: {name}")))?;
                Some((column, direction))
            }
        };

        for (name, value) in [("limit", self.limit), ("offset", self.offset)] {
            if value.is_some_and(|v| v < 0) {
                return Err(AppError::BadRequest(format!("{name} must not be negative")));
            }
        }

        Ok(ListOptions {
            sort,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/categories", categories::router())
        .nest("/api/products", products::router())
        .nest("/api/bundles", bundles::router())
        .nest("/api/banners", banners::router())
        .nest("/api/customers", customers::router())
        .nest("/api/users", users::router())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::products::ProductSort;
    use scoop_core::ProductId;

    fn query(sort: Option<&str>, order: Option<&str>) -> ListQuery {
        ListQuery {
            sort: sort.map(str::to_owned),
            order: order.map(str::to_owned),
            ..ListQuery::default()
        }
    }

    #[test]
    fn test_list_query_defaults() {
        let options = ListQuery::default().into_options::<ProductSort>().unwrap();
        assert_eq!(options, ListOptions::default());
    }

    #[test]
    fn test_list_query_sort_and_order() {
        let options = query(Some("price"), Some("DESC"))
            .into_options::<ProductSort>()
            .unwrap();
        assert_eq!(options.sort, Some((ProductSort::Price, SortDirection::Desc)));
    }

    #[test]
    fn test_list_query_rejects_unknown_column() {
        let err = query(Some("price; DROP TABLE shop.product"), None)
            .into_options::<ProductSort>()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_list_query_rejects_bad_order() {
        let err = query(Some("title"), Some("sideways"))
            .into_options::<ProductSort>()
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_list_query_rejects_negative_limit() {
        let q = ListQuery {
            limit: Some(-1),
            ..ListQuery::default()
        };
        assert!(q.into_options::<ProductSort>().is_err());
    }

    #[test]
    fn test_positive() {
        assert_eq!(
            positive(4, ProductId::positive, "product id").unwrap(),
            ProductId::new(4)
        );
        assert!(matches!(
            positive(0, ProductId::positive, "product id"),
            Err(AppError::BadRequest(msg)) if msg == "Invalid product id: 0"
        ));
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some(" cake "), "q").unwrap(), "cake");
        assert!(required(Some("   "), "q").is_err());
        assert!(required(None, "q").is_err());
    }
}
