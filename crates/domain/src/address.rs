//! Delivery addresses.

use common::{AddressId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::present;

/// A saved delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(rename = "address_id")]
    pub id: AddressId,
    pub user_id: UserId,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

impl Address {
    /// Returns the location fields copied onto order views.
    pub fn snapshot(&self) -> AddressSnapshot {
        AddressSnapshot {
            address_line1: self.address_line1.clone(),
            address_line2: self.address_line2.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
        }
    }
}

/// Address fields shown alongside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Raw address fields as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInput {
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_default: Option<bool>,
}

/// A validated address ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub user_id: UserId,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

impl NewAddress {
    /// Validates client input; every field except the second line is required.
    pub fn new(user_id: UserId, input: AddressInput) -> Result<Self, DomainError> {
        let required = (
            present(input.address_line1),
            present(input.city),
            present(input.state),
            present(input.postal_code),
            present(input.country),
        );
        match required {
            (Some(address_line1), Some(city), Some(state), Some(postal_code), Some(country)) => {
                Ok(Self {
                    user_id,
                    address_line1,
                    address_line2: present(input.address_line2),
                    city,
                    state,
                    postal_code,
                    country,
                    is_default: input.is_default.unwrap_or(false),
                })
            }
            _ => Err(DomainError::MissingFields("Required fields are missing")),
        }
    }

    /// Attaches the identifier assigned by the store.
    pub fn with_id(self, id: AddressId) -> Address {
        Address {
            id,
            user_id: self.user_id,
            address_line1: self.address_line1,
            address_line2: self.address_line2,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            is_default: self.is_default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> AddressInput {
        AddressInput {
            address_line1: Some("12 MG Road".into()),
            address_line2: Some("".into()),
            city: Some("Pune".into()),
            state: Some("MH".into()),
            postal_code: Some("411001".into()),
            country: Some("India".into()),
            is_default: None,
        }
    }

    #[test]
    fn valid_address_defaults_flags() {
        let address = NewAddress::new(UserId::new(1), input()).unwrap();
        assert_eq!(address.address_line2, None);
        assert!(!address.is_default);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let mut raw = input();
        raw.postal_code = Some("  ".into());
        let err = NewAddress::new(UserId::new(1), raw).unwrap_err();
        assert_eq!(err.to_string(), "Required fields are missing");
    }

    #[test]
    fn snapshot_copies_location() {
        let address = NewAddress::new(UserId::new(1), input())
            .unwrap()
            .with_id(AddressId::new(5));
        let snap = address.snapshot();
        assert_eq!(snap.city, "Pune");
        assert_eq!(snap.postal_code, "411001");
    }
}
