//! CLI command implementations.

pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database URL from `SCOOP_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first if present.
pub(crate) fn database_url() -> Result<SecretString, String> {
    dotenvy::dotenv().ok();

    std::env::var("SCOOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "SCOOP_DATABASE_URL not set".to_owned())
}
