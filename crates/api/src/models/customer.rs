//! Customer records and request bodies.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use scoop_core::{CustomerId, UserId};

use super::first_blank;

/// A customer profile. Guests have no `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub user_id: Option<UserId>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/customers`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub address: Option<String>,
    pub apartment: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub user_id: Option<UserId>,
}

impl NewCustomer {
    /// Name of the first required field that is missing or blank.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        first_blank(&[
            ("firstname", self.firstname.as_deref()),
            ("lastname", self.lastname.as_deref()),
            ("email", self.email.as_deref()),
            ("phone", self.phone.as_deref()),
            ("address", self.address.as_deref()),
            ("city", self.city.as_deref()),
            ("country", self.country.as_deref()),
            ("postalCode", self.postal_code.as_deref()),
        ])
    }

    /// `"firstname lastname"`, stored alongside the parts.
    #[must_use]
    pub fn fullname(&self) -> Option<String> {
        match (self.firstname.as_deref(), self.lastname.as_deref()) {
            (Some(first), Some(last)) => Some(format!("{} {}", first.trim(), last.trim())),
            (Some(only), None) | (None, Some(only)) => Some(only.trim().to_owned()),
            (None, None) => None,
        }
    }
}

/// Body of `PUT /api/customers/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub fullname: Option<String>,
    pub email: Option<String>,
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

impl CustomerUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.firstname.is_none()
            && self.lastname.is_none()
            && self.fullname.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.gender.is_none()
            && self.date_of_birth.is_none()
            && self.company.is_none()
            && self.address.is_none()
            && self.apartment.is_none()
            && self.postal_code.is_none()
            && self.city.is_none()
            && self.country.is_none()
    }
}

/// Aggregate counts over the customer table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStatistics {
    pub total_customers: i64,
    pub registered_customers: i64,
    pub guest_customers: i64,
    pub countries_count: i64,
    pub cities_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> NewCustomer {
        NewCustomer {
            firstname: Some("Ada".to_owned()),
            lastname: Some("Lovelace".to_owned()),
            email: Some("ada@example.com".to_owned()),
            phone: Some("0300 1234567".to_owned()),
            address: Some("12 Analytical St".to_owned()),
            city: Some("Lahore".to_owned()),
            country: Some("Pakistan".to_owned()),
            postal_code: Some("54000".to_owned()),
            ..NewCustomer::default()
        }
    }

    #[test]
    fn test_complete_customer_has_no_missing_field() {
        assert_eq!(complete().missing_field(), None);
    }

    #[test]
    fn test_blank_field_is_reported_in_order() {
        let customer = NewCustomer {
            lastname: Some("   ".to_owned()),
            city: None,
            ..complete()
        };
        assert_eq!(customer.missing_field(), Some("lastname"));
    }

    #[test]
    fn test_fullname_joins_parts() {
        assert_eq!(complete().fullname().as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_update_emptiness() {
        assert!(CustomerUpdate::default().is_empty());
        let update = CustomerUpdate {
            city: Some("Karachi".to_owned()),
            ..CustomerUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
