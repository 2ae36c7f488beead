//! Payment endpoints: open a gateway order, then verify the payment and place the order.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use checkout::{PaymentConfirmation, PaymentIntent};
use common::{AddressId, OrderId};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::IdField;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentOrderRequest {
    pub user_id: Option<IdField>,
    pub address_id: Option<IdField>,
}

/// The gateway's checkout callback, forwarded by the browser.
///
/// Line items sent by older clients are ignored; the order is built from the
/// cart held on the server.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_signature: String,
    #[serde(rename = "userId")]
    pub user_id: Option<IdField>,
    #[serde(rename = "addressId")]
    pub address_id: Option<IdField>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerifiedResponse {
    pub success: bool,
    pub message: &'static str,
    pub order_id: OrderId,
}

fn address_id(field: Option<&IdField>) -> Option<AddressId> {
    field.and_then(IdField::to_id)
}

/// POST /api/payment/orders: price the caller's cart and open a gateway order.
#[tracing::instrument(skip(state, auth, req), fields(user_id = %auth.user_id))]
pub async fn create_order<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Json(req): Json<CreatePaymentOrderRequest>,
) -> Result<Json<PaymentIntent>, ApiError> {
    let user_id = auth.resolve(req.user_id.as_ref())?;
    let address_id = address_id(req.address_id.as_ref())
        .ok_or_else(|| ApiError::bad_request("Invalid address ID"))?;

    let intent = state
        .checkout
        .begin_payment(user_id, address_id)
        .await
        .map_err(ApiError::payment_order)?;
    Ok(Json(intent))
}

/// POST /api/payment/verify: check the payment signature and convert the cart into an order.
#[tracing::instrument(
    skip(state, auth, req),
    fields(user_id = %auth.user_id, gateway_order_id = %req.razorpay_order_id)
)]
pub async fn verify<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<PaymentVerifiedResponse>, ApiError> {
    let user_id = auth.resolve(req.user_id.as_ref())?;
    // ids start at 1, so a missing address fails ownership after the signature check
    let address_id = address_id(req.address_id.as_ref()).unwrap_or(AddressId::new(0));

    let order_id = state
        .checkout
        .complete_payment(
            user_id,
            PaymentConfirmation {
                gateway_order_id: req.razorpay_order_id,
                gateway_payment_id: req.razorpay_payment_id,
                signature: req.razorpay_signature,
                address_id,
            },
        )
        .await
        .map_err(ApiError::payment_verify)?;

    Ok(Json(PaymentVerifiedResponse {
        success: true,
        message: "Payment verified and order placed successfully",
        order_id,
    }))
}
