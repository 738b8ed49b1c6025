//! Customer profile queries.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use scoop_core::{CustomerId, UserId};

use super::{ListOptions, RepositoryError, SortColumn, like_pattern};
use crate::models::customer::{Customer, CustomerStatistics, CustomerUpdate, NewCustomer};

const CUSTOMER_COLUMNS: &str = r"
    id, user_id, firstname, lastname, fullname, email, phone, gender,
    date_of_birth, company, address, apartment, postal_code, city, country,
    created_at, updated_at
";

/// Columns customer listings can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerSort {
    Id,
    Firstname,
    Lastname,
    Email,
    City,
    Country,
    CreatedAt,
}

impl SortColumn for CustomerSort {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "firstname" => Some(Self::Firstname),
            "lastname" => Some(Self::Lastname),
            "email" => Some(Self::Email),
            "city" => Some(Self::City),
            "country" => Some(Self::Country),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Firstname => "firstname",
            Self::Lastname => "lastname",
            Self::Email => "email",
            Self::City => "city",
            Self::Country => "country",
            Self::CreatedAt => "created_at",
        }
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    user_id: Option<UserId>,
    firstname: Option<String>,
    lastname: Option<String>,
    fullname: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    gender: Option<String>,
    date_of_birth: Option<NaiveDate>,
    company: Option<String>,
    address: Option<String>,
    apartment: Option<String>,
    postal_code: Option<String>,
    city: Option<String>,
    country: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            firstname: row.firstname,
            lastname: row.lastname,
            fullname: row.fullname,
            email: row.email,
            phone: row.phone,
            gender: row.gender,
            date_of_birth: row.date_of_birth,
            company: row.company,
            address: row.address,
            apartment: row.apartment,
            postal_code: row.postal_code,
            city: row.city,
            country: row.country,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatisticsRow {
    total_customers: i64,
    registered_customers: i64,
    guest_customers: i64,
    countries_count: i64,
    cities_count: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_all(
        &self,
        options: ListOptions<CustomerSort>,
    ) -> Result<Vec<Customer>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(CUSTOMER_COLUMNS).push(" FROM shop.customer");
        options.push_to(&mut query, "id");

        let rows = query
            .build_query_as::<CustomerRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM shop.customer WHERE id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Get a customer by email (exact match).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM shop.customer WHERE email = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Into::into))
    }

    /// Customers whose first, last or full name or email contains `term`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<Customer>, RepositoryError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM shop.customer \
             WHERE firstname ILIKE $1 \
                OR lastname ILIKE $1 \
                OR email ILIKE $1 \
                OR concat_ws(' ', firstname, lastname) ILIKE $1 \
             ORDER BY firstname, lastname"
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(like_pattern(term))
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Customers in a city, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_by_city(&self, city: &str) -> Result<Vec<Customer>, RepositoryError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM shop.customer \
             WHERE city = $1 ORDER BY firstname, lastname"
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(city)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Customers without a user account, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn find_guests(&self) -> Result<Vec<Customer>, RepositoryError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM shop.customer \
             WHERE user_id IS NULL ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Aggregate counts over all customers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn statistics(&self) -> Result<CustomerStatistics, RepositoryError> {
        let row = sqlx::query_as::<_, StatisticsRow>(
            r"
            SELECT
                COUNT(*) AS total_customers,
                COUNT(user_id) AS registered_customers,
                COUNT(*) - COUNT(user_id) AS guest_customers,
                COUNT(DISTINCT country) AS countries_count,
                COUNT(DISTINCT city) AS cities_count
            FROM shop.customer
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(CustomerStatistics {
            total_customers: row.total_customers,
            registered_customers: row.registered_customers,
            guest_customers: row.guest_customers,
            countries_count: row.countries_count,
            cities_count: row.cities_count,
        })
    }

    /// Insert a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, input), fields(email = ?input.email))]
    pub async fn create(&self, input: &NewCustomer) -> Result<Customer, RepositoryError> {
        let sql = format!(
            "INSERT INTO shop.customer (
                firstname, lastname, fullname, email, phone, company, address,
                apartment, postal_code, city, country, user_id
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(input.firstname.as_deref().map(str::trim))
            .bind(input.lastname.as_deref().map(str::trim))
            .bind(input.fullname())
            .bind(input.email.as_deref().map(str::trim))
            .bind(input.phone.as_deref())
            .bind(input.company.as_deref())
            .bind(input.address.as_deref())
            .bind(input.apartment.as_deref())
            .bind(input.postal_code.as_deref())
            .bind(input.city.as_deref())
            .bind(input.country.as_deref())
            .bind(input.user_id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::unique(e, "customer email already exists"))?;

        Ok(row.into())
    }

    /// Apply a partial update. `None` when the customer does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: CustomerId,
        update: &CustomerUpdate,
    ) -> Result<Option<Customer>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE shop.customer SET ");
        let mut set = query.separated(", ");

        macro_rules! set_field {
            ($field:ident) => {
                if let Some(value) = update.$field.clone() {
                    set.push(concat!(stringify!($field), " = "));
                    set.push_bind_unseparated(value);
                }
            };
        }

        set_field!(firstname);
        set_field!(lastname);
        set_field!(fullname);
        set_field!(email);
        set_field!(phone);
        set_field!(gender);
        set_field!(date_of_birth);
        set_field!(company);
        set_field!(address);
        set_field!(apartment);
        set_field!(postal_code);
        set_field!(city);
        set_field!(country);
        set.push("updated_at = now()");

        query.push(" WHERE id = ").push_bind(id);
        query.push(" RETURNING ").push(CUSTOMER_COLUMNS);

        let row = query
            .build_query_as::<CustomerRow>()
            .fetch_optional(self.pool)
            .await
            .map_err(|e| RepositoryError::unique(e, "customer email already exists"))?;

        Ok(row.map(Into::into))
    }

    /// Delete a customer. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: CustomerId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.customer WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Point a customer at a user account. Returns whether the customer exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has a profile.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self))]
    pub async fn link_user(
        &self,
        id: CustomerId,
        user_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.customer SET user_id = $1, updated_at = now() WHERE id = $2",
        )
        .bind(user_id)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "user already has a customer profile"))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_term_metacharacters_are_literal() {
        assert_eq!(like_pattern("lovelace"), "%lovelace%");
        assert_eq!(like_pattern("john_doe"), "%john\\_doe%");
        assert_eq!(like_pattern("%"), "%\\%%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn test_sort_whitelist() {
        assert_eq!(CustomerSort::parse("lastname"), Some(CustomerSort::Lastname));
        assert_eq!(CustomerSort::parse("created_at"), Some(CustomerSort::CreatedAt));
        assert_eq!(CustomerSort::parse("password"), None);
    }
}
