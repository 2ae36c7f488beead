//! In-memory payment gateway.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{GatewayOrder, GatewayOrderRequest, PaymentGateway};
use crate::error::{CheckoutError, Result};

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    orders: Vec<GatewayOrder>,
    next_id: u32,
    fail_on_create: bool,
}

/// In-memory payment gateway for testing and local runs.
///
/// Issues sequential `order_0001`-style ids.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to reject order creation.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Returns the number of orders created so far.
    pub fn order_count(&self) -> usize {
        self.state.read().unwrap().orders.len()
    }

    /// Returns the orders created so far.
    pub fn orders(&self) -> Vec<GatewayOrder> {
        self.state.read().unwrap().orders.clone()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(CheckoutError::GatewayRejected {
                status: 503,
                body: "gateway unavailable".to_string(),
            });
        }

        state.next_id += 1;
        let order = GatewayOrder {
            id: format!("order_{:04}", state.next_id),
            amount: request.amount,
            currency: request.currency,
            receipt: Some(request.receipt),
            status: "created".to_string(),
        };
        state.orders.push(order.clone());

        Ok(order)
    }
}
