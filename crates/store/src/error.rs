use common::{AddressId, CartItemId, CustomizationId, OrderId, ProductId, UserId};
use domain::{DomainError, Money};
use thiserror::Error;

/// Errors that can occur when reading or writing storefront data.
///
/// Not-found variants carry messages the API returns verbatim.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User not found")]
    UserNotFound(UserId),

    #[error("Product not found")]
    ProductNotFound(ProductId),

    /// The cart line does not exist or belongs to another user.
    #[error("Cart item not found or unauthorized")]
    CartItemNotFound(CartItemId),

    /// The order does not exist or belongs to another user.
    #[error("Order not found or unauthorized")]
    OrderNotFound(OrderId),

    /// The customization does not exist or belongs to another user.
    #[error("Customization not found")]
    CustomizationNotFound(CustomizationId),

    /// Another account already uses this email.
    #[error("Email already exists")]
    DuplicateEmail(String),

    /// The address does not exist or belongs to another user.
    #[error("Invalid address ID")]
    AddressNotOwned(AddressId),

    /// No pending payment order with this id exists for the user.
    #[error("Payment order not found")]
    PaymentOrderNotFound(String),

    /// The payment order was already converted into an order.
    #[error("Payment has already been processed")]
    PaymentAlreadyCaptured(String),

    /// The cart changed between opening the payment and verifying it.
    #[error("Cart total {actual} does not match the payment amount {expected}")]
    AmountMismatch { expected: Money, actual: Money },

    /// A business rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
