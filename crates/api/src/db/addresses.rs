//! Address book queries. Addresses belong to a customer profile.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use scoop_core::{AddressId, CustomerId};

use super::RepositoryError;
use crate::models::address::{Address, NewAddress};

const ADDRESS_COLUMNS: &str = r"
    id, customer_id, address_type, street_address, city, state, postal_code,
    country, is_default, created_at
";

#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    customer_id: CustomerId,
    address_type: String,
    street_address: String,
    city: String,
    state: Option<String>,
    postal_code: String,
    country: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            address_type: row.address_type,
            street_address: row.street_address,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

/// Repository for address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Addresses of a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM shop.address \
             WHERE customer_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(customer_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add an address. A new default address clears the previous default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        customer_id: CustomerId,
        input: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        if input.is_default {
            sqlx::query("UPDATE shop.address SET is_default = FALSE WHERE customer_id = $1")
                .bind(customer_id)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!(
            "INSERT INTO shop.address (
                customer_id, address_type, street_address, city, state,
                postal_code, country, is_default
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ADDRESS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(customer_id)
            .bind(input.address_type.as_deref())
            .bind(input.street_address.as_deref())
            .bind(input.city.as_deref())
            .bind(input.state.as_deref())
            .bind(input.postal_code.as_deref())
            .bind(input.country.as_deref())
            .bind(input.is_default)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    /// Delete an address owned by `customer_id`.
    ///
    /// Returns `false` when no such address belongs to the customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        customer_id: CustomerId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.address WHERE id = $1 AND customer_id = $2")
            .bind(id)
            .bind(customer_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
