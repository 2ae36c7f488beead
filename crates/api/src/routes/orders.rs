//! Order history and cancellation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::{OrderId, UserId};
use domain::{Order, OrderStatus};
use serde::Serialize;
use store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderCancelledResponse {
    pub message: &'static str,
    pub status: OrderStatus,
}

/// GET /api/orders/{id}: the caller's orders, newest first.
#[tracing::instrument(skip(state, auth))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let user_id: UserId = id.parse().map_err(|_| ApiError::Forbidden)?;
    auth.ensure_self(user_id)?;
    Ok(Json(state.store.list_orders(user_id).await?))
}

/// PUT /api/orders/{id}/cancel
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn cancel<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OrderCancelledResponse>, ApiError> {
    let order_id: OrderId = id
        .parse()
        .map_err(|_| ApiError::not_found("Order not found or unauthorized"))?;
    let status = state.store.cancel_order(auth.user_id, order_id).await?;

    metrics::counter!("orders_cancelled_total").increment(1);
    tracing::info!(%order_id, "order cancelled");
    Ok(Json(OrderCancelledResponse {
        message: "Order cancelled successfully",
        status,
    }))
}
