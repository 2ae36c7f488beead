//! Customer-designed product variants.

use chrono::{DateTime, Utc};
use common::{CustomizationId, ProductId, UserId};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::DomainError;
use crate::value_objects::Money;

/// Key under which the stored design image path is recorded.
pub const DESIGN_PATH_KEY: &str = "fullDesignPath";

/// A stored customization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customization {
    #[serde(rename = "custom_id")]
    pub id: CustomizationId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub details: Value,
    #[serde(with = "crate::value_objects::rupees")]
    pub price: Money,
    pub created_at: DateTime<Utc>,
}

/// A customization ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomization {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub details: Value,
    pub price: Money,
}

impl NewCustomization {
    /// Builds a customization from the raw details JSON and the stored design path.
    ///
    /// The details must be a JSON object; the design path is written into it.
    pub fn new(
        product_id: ProductId,
        user_id: UserId,
        raw_details: &str,
        price: Money,
        design_path: &str,
    ) -> Result<Self, DomainError> {
        let mut details = parse_details(raw_details)?;
        details.insert(
            DESIGN_PATH_KEY.to_string(),
            Value::String(design_path.to_string()),
        );
        Ok(Self {
            product_id,
            user_id,
            details: Value::Object(details),
            price,
        })
    }
}

fn parse_details(raw: &str) -> Result<Map<String, Value>, DomainError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(DomainError::InvalidCustomization),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn design_path_is_recorded_in_details() {
        let custom = NewCustomization::new(
            ProductId::new(3),
            UserId::new(1),
            r##"{"text":"Hello","color":"#fff"}"##,
            Money::from_rupees(499),
            "/uploads/design-1.png",
        )
        .unwrap();

        assert_eq!(custom.details["text"], "Hello");
        assert_eq!(custom.details[DESIGN_PATH_KEY], "/uploads/design-1.png");
    }

    #[test]
    fn non_object_details_are_rejected() {
        for raw in ["[1,2]", "\"text\"", "not json"] {
            let result = NewCustomization::new(
                ProductId::new(3),
                UserId::new(1),
                raw,
                Money::zero(),
                "/uploads/x.png",
            );
            assert_eq!(result.unwrap_err(), DomainError::InvalidCustomization);
        }
    }
}
