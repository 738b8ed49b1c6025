//! User repository for database operations.
//!
//! Users are joined with their (optional) customer profile on
//! `customer.user_id`. Password hashes are only returned by
//! [`UserRepository::get_password_hash`].

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use scoop_core::{CustomerId, Email, UserId, UserRole};

use super::{ListOptions, RepositoryError, SortColumn};
use crate::models::user::{CustomerProfile, ProfileUpdate, RegisterCustomer, User, UserWithProfile};

const PROFILE_COLUMNS: &str = r"
    u.id, u.email, u.phone, u.role, u.created_at, u.updated_at,
    c.id AS customer_id, c.fullname, c.gender, c.date_of_birth,
    c.phone AS customer_phone, c.company, c.address, c.apartment,
    c.postal_code, c.city, c.country
";

const PROFILE_FROM: &str = r"
    FROM shop.user u
    LEFT JOIN shop.customer c ON c.user_id = u.id
";

/// Columns user listings can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Id,
    Email,
    Role,
    CreatedAt,
}

impl SortColumn for UserSort {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(Self::Id),
            "email" => Some(Self::Email),
            "role" => Some(Self::Role),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Id => "u.id",
            Self::Email => "u.email",
            Self::Role => "u.role",
            Self::CreatedAt => "u.created_at",
        }
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: String,
    phone: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row.role.parse::<UserRole>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            phone: row.phone,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithProfileRow {
    #[sqlx(flatten)]
    user: UserRow,
    customer_id: Option<CustomerId>,
    fullname: Option<String>,
    gender: Option<String>,
    date_of_birth: Option<NaiveDate>,
    customer_phone: Option<String>,
    company: Option<String>,
    address: Option<String>,
    apartment: Option<String>,
    postal_code: Option<String>,
    city: Option<String>,
    country: Option<String>,
}

impl TryFrom<UserWithProfileRow> for UserWithProfile {
    type Error = RepositoryError;

    fn try_from(row: UserWithProfileRow) -> Result<Self, Self::Error> {
        let profile = row.customer_id.map(|customer_id| CustomerProfile {
            customer_id,
            fullname: row.fullname,
            gender: row.gender,
            date_of_birth: row.date_of_birth,
            phone: row.customer_phone,
            company: row.company,
            address: row.address,
            apartment: row.apartment,
            postal_code: row.postal_code,
            city: row.city,
            country: row.country,
        });

        Ok(Self {
            user: row.user.try_into()?,
            profile,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    profile: UserWithProfileRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All users with their customer profiles.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email or role is invalid.
    #[instrument(skip(self))]
    pub async fn find_all_with_profiles(
        &self,
        options: ListOptions<UserSort>,
    ) -> Result<Vec<UserWithProfile>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT ");
        query.push(PROFILE_COLUMNS).push(PROFILE_FROM);
        options.push_to(&mut query, "u.id");

        let rows = query
            .build_query_as::<UserWithProfileRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a user and profile by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email or role is invalid.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<UserWithProfile>, RepositoryError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} {PROFILE_FROM} WHERE u.id = $1");
        let row = sqlx::query_as::<_, UserWithProfileRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user and profile by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email or role is invalid.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserWithProfile>, RepositoryError> {
        let sql = format!("SELECT {PROFILE_COLUMNS} {PROFILE_FROM} WHERE u.email = $1");
        let row = sqlx::query_as::<_, UserWithProfileRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Users holding `role`, by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email or role is invalid.
    #[instrument(skip(self))]
    pub async fn find_by_role(&self, role: UserRole) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, phone, role, created_at, updated_at
            FROM shop.user
            WHERE role = $1
            ORDER BY email
            ",
        )
        .bind(role.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Whether an account with this email exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM shop.user WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Get a user with profile and password hash for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored email or role is invalid.
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(UserWithProfile, String)>, RepositoryError> {
        let sql =
            format!("SELECT u.password_hash, {PROFILE_COLUMNS} {PROFILE_FROM} WHERE u.email = $1");
        let row = sqlx::query_as::<_, CredentialsRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some((row.profile.try_into()?, row.password_hash))),
            None => Ok(None),
        }
    }

    /// The customer profile id linked to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_id(&self, id: UserId) -> Result<Option<CustomerId>, RepositoryError> {
        let customer_id = sqlx::query_scalar::<_, CustomerId>(
            "SELECT id FROM shop.customer WHERE user_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(customer_id)
    }

    /// Create a customer account and its profile in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password_hash, profile), fields(email = %email))]
    pub async fn create_customer(
        &self,
        email: &Email,
        password_hash: &str,
        profile: &RegisterCustomer,
    ) -> Result<UserId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_id: UserId = sqlx::query_scalar(
            r"
            INSERT INTO shop.user (email, password_hash, phone, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(profile.phone.as_deref())
        .bind(UserRole::Customer.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, "email already exists"))?;

        sqlx::query(
            r"
            INSERT INTO shop.customer (
                user_id, email, fullname, gender, date_of_birth, phone, company,
                address, apartment, postal_code, city, country
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(user_id)
        .bind(email.as_str())
        .bind(profile.fullname.as_deref().map(str::trim))
        .bind(profile.gender.as_deref())
        .bind(profile.date_of_birth)
        .bind(profile.phone.as_deref())
        .bind(profile.company.as_deref())
        .bind(profile.address.as_deref())
        .bind(profile.apartment.as_deref())
        .bind(profile.postal_code.as_deref())
        .bind(profile.city.as_deref())
        .bind(profile.country.as_deref())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, "a customer with this email already exists"))?;

        tx.commit().await?;

        tracing::info!(user_id = %user_id, "customer account created");
        Ok(user_id)
    }

    /// Create a staff account with the given role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, password_hash), fields(email = %email))]
    pub async fn create_with_role(
        &self,
        email: &Email,
        password_hash: &str,
        phone: Option<&str>,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO shop.user (email, password_hash, phone, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, phone, role, created_at, updated_at
            ",
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(phone)
        .bind(role.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "email already exists"))?;

        row.try_into()
    }

    /// Update account and profile fields, creating the profile if missing.
    ///
    /// Returns `false` when the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the new email is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, update))]
    pub async fn save_profile(
        &self,
        id: UserId,
        email: Option<&Email>,
        update: &ProfileUpdate,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current_email: Option<String> = sqlx::query_scalar(
            r"
            UPDATE shop.user
            SET email = COALESCE($2, email),
                phone = COALESCE($3, phone),
                updated_at = now()
            WHERE id = $1
            RETURNING email
            ",
        )
        .bind(id)
        .bind(email.map(Email::as_str))
        .bind(update.phone.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique(e, "email already exists"))?;

        let Some(current_email) = current_email else {
            return Ok(false);
        };

        let updated = sqlx::query(
            r"
            UPDATE shop.customer
            SET fullname = COALESCE($2, fullname),
                gender = COALESCE($3, gender),
                date_of_birth = COALESCE($4, date_of_birth),
                updated_at = now()
            WHERE user_id = $1
            ",
        )
        .bind(id)
        .bind(update.fullname.as_deref())
        .bind(update.gender.as_deref())
        .bind(update.date_of_birth)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r"
                INSERT INTO shop.customer (user_id, email, fullname, gender, date_of_birth)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(id)
            .bind(&current_email)
            .bind(update.fullname.as_deref())
            .bind(update.gender.as_deref())
            .bind(update.date_of_birth)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::unique(e, "a customer with this email already exists"))?;
            tracing::info!(user_id = %id, "customer profile created on profile save");
        }

        tx.commit().await?;
        Ok(true)
    }
}
