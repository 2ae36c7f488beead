//! Payment gateway trait and implementations.

pub mod memory;
pub mod razorpay;

use std::sync::Arc;

use async_trait::async_trait;
use domain::Money;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use memory::InMemoryPaymentGateway;
pub use razorpay::RazorpayGateway;

/// An order to open with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayOrderRequest {
    /// Amount in paise.
    pub amount: Money,
    pub currency: String,
    pub receipt: String,
}

/// An order as created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in paise.
    pub amount: Money,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
}

/// Trait for opening orders with a payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens an order the customer can then pay for.
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for Arc<T> {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder> {
        (**self).create_order(request).await
    }
}
