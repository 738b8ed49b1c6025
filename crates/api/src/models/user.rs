//! User accounts, their customer profile and auth request bodies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use scoop_core::{CustomerId, Email, UserId, UserRole};

use super::first_blank;

/// A user account. The password hash never leaves the repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Customer fields joined onto a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    pub fullname: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// A user with its customer profile, if one is linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithProfile {
    #[serde(flatten)]
    pub user: User,
    pub profile: Option<CustomerProfile>,
}

/// Body of `POST /api/users/register-customer`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomer {
    pub email: Option<String>,
    pub password: Option<String>,
    pub fullname: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl RegisterCustomer {
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        first_blank(&[
            ("email", self.email.as_deref()),
            ("password", self.password.as_deref()),
            ("fullname", self.fullname.as_deref()),
            ("phone", self.phone.as_deref()),
        ])
    }
}

/// Body of `POST /api/users/register-with-role`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterWithRole {
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
}

impl RegisterWithRole {
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        first_blank(&[
            ("email", self.email.as_deref()),
            ("password", self.password.as_deref()),
            ("role", self.role.as_deref()),
        ])
    }
}

/// Body of `POST /api/users/login-customer`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of `PUT /api/users/{id}/profile`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fullname: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_register_customer_requires_phone() {
        let body: RegisterCustomer = serde_json::from_value(serde_json::json!({
            "email": "a@b.co",
            "password": "hunter22",
            "fullname": "A B",
        }))
        .unwrap();
        assert_eq!(body.missing_field(), Some("phone"));
    }

    #[test]
    fn test_date_of_birth_parses_iso_date() {
        let body: ProfileUpdate =
            serde_json::from_value(serde_json::json!({ "dateOfBirth": "1990-04-01" })).unwrap();
        assert_eq!(body.date_of_birth, NaiveDate::from_ymd_opt(1990, 4, 1));
    }

    #[test]
    fn test_user_with_profile_flattens_user() {
        let user = UserWithProfile {
            user: User {
                id: UserId::new(4),
                email: Email::parse("rider@example.com").unwrap(),
                phone: None,
                role: UserRole::Rider,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            profile: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], 4);
        assert_eq!(json["email"], "rider@example.com");
        assert_eq!(json["role"], "rider");
        assert!(json["profile"].is_null());
        assert!(json.get("passwordHash").is_none());
    }
}
