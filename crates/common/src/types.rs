use serde::{Deserialize, Serialize};

/// Error returned when an identifier cannot be parsed from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
    input: String,
}

impl std::fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.input)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database identifier.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database identifier.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self).map_err(|_| ParseIdError {
                    kind: $kind,
                    input: s.to_string(),
                })
            }
        }
    };
}

define_id!(
    /// Identifier of a registered customer.
    UserId,
    "user id"
);

define_id!(
    /// Identifier of a catalog product.
    ProductId,
    "product id"
);

define_id!(
    /// Identifier of a line in a customer's cart.
    CartItemId,
    "cart item id"
);

define_id!(
    /// Identifier of a saved delivery address.
    AddressId,
    "address id"
);

define_id!(
    /// Identifier of a placed order.
    OrderId,
    "order id"
);

define_id!(
    /// Identifier of a single line within a placed order.
    OrderItemId,
    "order item id"
);

define_id!(
    /// Identifier of a customer's product customization (uploaded design).
    CustomizationId,
    "customization id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_integers() {
        let json = serde_json::to_string(&UserId::new(42)).unwrap();
        assert_eq!(json, "42");

        let id: ProductId = serde_json::from_str("7").unwrap();
        assert_eq!(id.get(), 7);
    }

    #[test]
    fn ids_parse_from_text() {
        let id: OrderId = " 15 ".parse().unwrap();
        assert_eq!(id, OrderId::new(15));
    }

    #[test]
    fn invalid_id_text_is_rejected() {
        let err = "abc".parse::<CartItemId>().unwrap_err();
        assert_eq!(err.to_string(), "invalid cart item id: \"abc\"");
    }

    #[test]
    fn distinct_id_types_keep_their_values() {
        let user = UserId::from(3);
        let address = AddressId::from(3);
        assert_eq!(i64::from(user), i64::from(address));
        assert_eq!(user.to_string(), "3");
    }
}
