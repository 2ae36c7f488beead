//! Razorpay Orders API client.

use std::time::Duration;

use async_trait::async_trait;

use super::{GatewayOrder, GatewayOrderRequest, PaymentGateway};
use crate::error::{CheckoutError, Result};

/// Razorpay-backed payment gateway.
///
/// Opens orders with `POST {base_url}/v1/orders`, authenticating with the
/// key id and secret over HTTP basic auth.
#[derive(Clone)]
pub struct RazorpayGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    /// Production API endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.razorpay.com";

    const TIMEOUT: Duration = Duration::from_secs(15);

    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Result<Self> {
        Self::with_base_url(key_id, key_secret, Self::DEFAULT_BASE_URL)
    }

    /// Creates a client against a different endpoint, such as a local mock.
    pub fn with_base_url(
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(Self::TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        })
    }

    /// Returns the public key id, which the browser checkout also needs.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    fn orders_url(&self) -> String {
        format!("{}/v1/orders", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for RazorpayGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayGateway")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[tracing::instrument(skip(self, request), fields(amount = request.amount.paise(), receipt = %request.receipt))]
    async fn create_order(&self, request: GatewayOrderRequest) -> Result<GatewayOrder> {
        let resp = self
            .http
            .post(self.orders_url())
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %body, "razorpay rejected order");
            return Err(CheckoutError::GatewayRejected {
                status: status.as_u16(),
                body,
            });
        }

        let order: GatewayOrder = resp.json().await?;
        if order.amount != request.amount {
            return Err(CheckoutError::Gateway(format!(
                "order {} was created for {} instead of {}",
                order.id, order.amount, request.amount
            )));
        }

        tracing::info!(gateway_order_id = %order.id, "razorpay order created");
        Ok(order)
    }
}
