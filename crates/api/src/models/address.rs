//! Customer addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scoop_core::{AddressId, CustomerId};

use super::first_blank;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub address_type: String,
    pub street_address: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/users/{userId}/addresses`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub address_type: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl NewAddress {
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        first_blank(&[
            ("addressType", self.address_type.as_deref()),
            ("streetAddress", self.street_address.as_deref()),
            ("city", self.city.as_deref()),
            ("state", self.state.as_deref()),
            ("country", self.country.as_deref()),
            ("postalCode", self.postal_code.as_deref()),
        ])
    }
}
