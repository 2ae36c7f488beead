//! Checkout for the storefront.
//!
//! Paying for a cart happens in two phases:
//! 1. `begin_payment` prices the cart on the server, opens an order with the
//!    payment gateway and records it as a pending payment order.
//! 2. `complete_payment` verifies the gateway's HMAC signature and then hands
//!    the payment to the store, which converts the cart into an order in a
//!    single transaction.
//!
//! Nothing is written for an order until its signature has been verified.

pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod signature;

pub use coordinator::{CheckoutCoordinator, PaymentConfirmation, PaymentIntent};
pub use error::{CheckoutError, Result};
pub use gateway::{
    GatewayOrder, GatewayOrderRequest, InMemoryPaymentGateway, PaymentGateway, RazorpayGateway,
};
pub use signature::SignatureVerifier;
