//! Checkout error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while taking a payment or placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The payment signature did not match the order and payment ids.
    #[error("Payment verification failed")]
    SignatureMismatch,

    /// The signing secret cannot be used as an HMAC key.
    #[error("Invalid payment signing secret")]
    InvalidSecret,

    /// The gateway answered with a non-success status.
    #[error("Payment gateway rejected the request with status {status}: {body}")]
    GatewayRejected { status: u16, body: String },

    /// The gateway answered, but not with what was asked for.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// The gateway could not be reached or its reply could not be decoded.
    #[error("Payment gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A business rule was violated.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Reading or writing storefront data failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Returns true if the failure came from the payment gateway.
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            CheckoutError::GatewayRejected { .. }
                | CheckoutError::Gateway(_)
                | CheckoutError::Http(_)
        )
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
