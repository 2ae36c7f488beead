//! Checkout coordinator: from cart to paid order.

use std::time::Instant;

use chrono::Utc;
use common::{AddressId, OrderId, UserId};
use domain::{Money, OrderDraft, OrderLine, PaymentOrder, PlaceOrder, receipt_for};
use serde::{Deserialize, Serialize};
use store::{Store, StoreExt};

use crate::error::{CheckoutError, Result};
use crate::gateway::{GatewayOrderRequest, PaymentGateway};
use crate::signature::SignatureVerifier;

/// What the browser needs to open the gateway's payment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    /// Gateway order id the customer pays against.
    pub order_id: String,
    /// Cart total, sent to the browser in rupees.
    #[serde(with = "domain::value_objects::rupees")]
    pub total_amount: Money,
    pub currency: String,
    pub items: Vec<OrderLine>,
    pub address_id: AddressId,
}

/// The gateway's callback after the customer paid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentConfirmation {
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
    pub address_id: AddressId,
}

/// Drives the two checkout phases against a store and a payment gateway.
pub struct CheckoutCoordinator<S, G>
where
    S: Store,
    G: PaymentGateway,
{
    store: S,
    gateway: G,
    verifier: SignatureVerifier,
    currency: String,
}

impl<S, G> CheckoutCoordinator<S, G>
where
    S: Store,
    G: PaymentGateway,
{
    /// Creates a new checkout coordinator.
    pub fn new(
        store: S,
        gateway: G,
        verifier: SignatureVerifier,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            verifier,
            currency: currency.into(),
        }
    }

    /// Returns the currency payments are taken in.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Prices the user's cart and opens a gateway order for it.
    ///
    /// The total is computed from the cart lines stored on the server. The
    /// gateway order is recorded as a pending payment order so that the
    /// confirmation can later be matched against it.
    #[tracing::instrument(skip(self))]
    pub async fn begin_payment(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<PaymentIntent> {
        self.store.require_address(address_id, user_id).await?;

        let cart = self.store.list_cart(user_id).await?;
        let draft = OrderDraft::from_cart(&cart)?;

        let now = Utc::now();
        let receipt = receipt_for(user_id, now);
        let order = self
            .gateway
            .create_order(GatewayOrderRequest {
                amount: draft.total(),
                currency: self.currency.clone(),
                receipt: receipt.clone(),
            })
            .await?;

        self.store
            .record_payment_order(PaymentOrder::created(
                order.id.clone(),
                user_id,
                Some(address_id),
                draft.total(),
                order.currency.clone(),
                receipt,
                now,
            ))
            .await?;

        metrics::counter!("checkout_payment_orders_created_total").increment(1);
        tracing::info!(
            gateway_order_id = %order.id,
            total_paise = draft.total().paise(),
            items = draft.lines().len(),
            "payment order created"
        );

        Ok(PaymentIntent {
            order_id: order.id,
            total_amount: draft.total(),
            currency: order.currency,
            items: draft.into_lines(),
            address_id,
        })
    }

    /// Verifies a payment and converts the user's cart into an order.
    ///
    /// The signature is checked before anything is read or written.
    #[tracing::instrument(
        skip(self, confirmation),
        fields(gateway_order_id = %confirmation.gateway_order_id)
    )]
    pub async fn complete_payment(
        &self,
        user_id: UserId,
        confirmation: PaymentConfirmation,
    ) -> Result<OrderId> {
        if let Err(err) = self.verifier.verify(
            &confirmation.gateway_order_id,
            &confirmation.gateway_payment_id,
            &confirmation.signature,
        ) {
            metrics::counter!("checkout_signature_failures_total").increment(1);
            tracing::warn!(%user_id, "payment signature mismatch");
            return Err(err);
        }

        let start = Instant::now();
        let placed = self
            .store
            .place_order(PlaceOrder {
                user_id,
                address_id: confirmation.address_id,
                gateway_order_id: confirmation.gateway_order_id,
                gateway_payment_id: confirmation.gateway_payment_id,
            })
            .await;
        metrics::histogram!("checkout_place_order_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        match placed {
            Ok(order_id) => {
                metrics::counter!("checkout_orders_placed_total").increment(1);
                tracing::info!(%user_id, %order_id, "order placed");
                Ok(order_id)
            }
            Err(err) => {
                metrics::counter!("checkout_placement_failures_total").increment(1);
                tracing::warn!(%user_id, error = %err, "order placement failed");
                Err(CheckoutError::Store(err))
            }
        }
    }
}
