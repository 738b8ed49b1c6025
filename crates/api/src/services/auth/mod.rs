//! Authentication service.
//!
//! Password registration and login for customer and staff accounts.
//! Passwords are hashed with Argon2id; hashes never leave this module or the
//! user repository.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use scoop_core::{Email, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{RegisterCustomer, User, UserWithProfile};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a customer account together with its customer profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_customer(
        &self,
        email: &str,
        password: &str,
        profile: &RegisterCustomer,
    ) -> Result<UserWithProfile, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        if self.users.email_exists(&email).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;

        let user_id = self
            .users
            .create_customer(&email, &password_hash, profile)
            .await
            .map_err(conflict_as_exists)?;

        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::Repository(RepositoryError::NotFound))
    }

    /// Register a staff account. Only staff roles are accepted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRole` if `role` is unknown or not a staff role.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_with_role(
        &self,
        email: &str,
        password: &str,
        phone: Option<&str>,
        role: &str,
    ) -> Result<User, AuthError> {
        let role = parse_staff_role(role)?;
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_role(&email, &password_hash, phone, role)
            .await
            .map_err(conflict_as_exists)?;

        tracing::info!(user_id = %user.id, role = %role, "staff account created");
        Ok(user)
    }

    /// Login a customer with email and password.
    ///
    /// Staff accounts cannot log in here; they get the same error as a wrong
    /// password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_customer(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserWithProfile, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if user.user.role != UserRole::Customer {
            tracing::warn!(user_id = %user.user.id, role = %user.user.role, "non-customer login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }
}

fn conflict_as_exists(err: RepositoryError) -> AuthError {
    match err {
        RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
        other => AuthError::Repository(other),
    }
}

/// Parse a role that staff registration may assign.
fn parse_staff_role(role: &str) -> Result<UserRole, AuthError> {
    match role.parse::<UserRole>() {
        Ok(role) if role.is_staff() => Ok(role),
        _ => Err(AuthError::InvalidRole(role.to_owned())),
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
