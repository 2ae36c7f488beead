//! Identifier types shared by every storefront crate.

pub mod types;

pub use types::{
    AddressId, CartItemId, CustomizationId, OrderId, OrderItemId, ParseIdError, ProductId, UserId,
};
