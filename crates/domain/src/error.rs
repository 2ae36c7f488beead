//! Domain error types.

use thiserror::Error;

use crate::order::OrderStatus;
use crate::value_objects::Money;

/// Errors raised by storefront business rules.
///
/// Messages are worded for end users because the API returns them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// One or more required inputs were absent or blank.
    #[error("{0}")]
    MissingFields(&'static str),

    /// Quantity was zero, negative or too large.
    #[error("quantity must be a positive integer")]
    InvalidQuantity(i64),

    /// A price string could not be interpreted as an amount.
    #[error("Invalid price: {0:?}")]
    InvalidPrice(String),

    /// A discount percentage string could not be interpreted.
    #[error("Invalid discount percentage: {0:?}")]
    InvalidPercentage(String),

    /// An arithmetic operation on money overflowed.
    #[error("Amount is too large")]
    AmountOverflow,

    /// Checkout was attempted with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The computed order total was not strictly positive.
    #[error("Invalid total amount")]
    InvalidTotal(Money),

    /// Delivered orders cannot be cancelled.
    #[error("Cannot cancel a delivered order")]
    OrderDelivered,

    /// The order was cancelled earlier.
    #[error("Order is already cancelled")]
    OrderAlreadyCancelled,

    /// The requested status change is not part of the order lifecycle.
    #[error("Invalid order status transition from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// A stored status string did not match any known order status.
    #[error("Unknown order status: {0}")]
    UnknownOrderStatus(String),

    /// A stored status string did not match any known payment status.
    #[error("Unknown payment status: {0}")]
    UnknownPaymentStatus(String),

    /// A stored provider string did not match any known auth provider.
    #[error("Unknown auth provider: {0}")]
    UnknownProvider(String),

    /// Customization details were not a JSON object.
    #[error("customizationDetails must be a JSON object")]
    InvalidCustomization,
}
