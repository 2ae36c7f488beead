//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{CartItemId, CustomizationId, ProductId, UserId};
use domain::{CartItem, NewCartItem, Quantity};
use serde::{Deserialize, Serialize};
use store::{Store, StoreExt};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::{IdField, MessageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: Option<IdField>,
    pub product_id: Option<IdField>,
    pub quantity: Option<IdField>,
    pub size: Option<String>,
    pub custom_id: Option<IdField>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddedToCartResponse {
    pub message: &'static str,
    pub cart_id: CartItemId,
}

/// POST /api/cart: add a product to the caller's cart.
///
/// The unit price is copied from the catalog.
#[tracing::instrument(skip(state, auth, req), fields(user_id = %auth.user_id))]
pub async fn add<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Json(req): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<AddedToCartResponse>), ApiError> {
    let (Some(user), Some(product), Some(quantity)) = (req.user_id, req.product_id, req.quantity)
    else {
        return Err(ApiError::bad_request(
            "userId, productId, and quantity are required",
        ));
    };
    let user_id = auth.resolve(Some(&user))?;

    let product_id: ProductId = product
        .to_id()
        .ok_or_else(|| ApiError::bad_request("productId must be a valid integer"))?;
    let product = state.store.require_product(product_id).await?;

    let quantity = quantity
        .as_i64()
        .ok_or_else(|| ApiError::bad_request("quantity must be a positive integer"))?;
    let quantity = Quantity::new(quantity)?;

    let custom_id = match req.custom_id {
        None => None,
        Some(field) => Some(
            field
                .to_id::<CustomizationId>()
                .ok_or_else(|| ApiError::bad_request("customId must be a valid integer"))?,
        ),
    };
    let size = req.size.filter(|s| !s.trim().is_empty());

    let cart_id = state
        .store
        .add_to_cart(NewCartItem::for_product(
            user_id, &product, quantity, size, custom_id,
        ))
        .await?;

    tracing::info!(%cart_id, %product_id, "added to cart");
    Ok((
        StatusCode::CREATED,
        Json(AddedToCartResponse {
            message: "Added to cart",
            cart_id,
        }),
    ))
}

/// GET /api/cart/{id}: the caller's cart lines.
#[tracing::instrument(skip(state, auth))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<CartItem>>, ApiError> {
    let user_id: UserId = id.parse().map_err(|_| ApiError::Forbidden)?;
    auth.ensure_self(user_id)?;
    Ok(Json(state.store.list_cart(user_id).await?))
}

/// PUT /api/cart/{id}: set a line's quantity.
#[tracing::instrument(skip(state, auth, req), fields(user_id = %auth.user_id))]
pub async fn update_quantity<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    // only a JSON integer is accepted here
    let quantity = req
        .quantity
        .as_ref()
        .and_then(serde_json::Value::as_i64)
        .filter(|q| *q >= 1)
        .ok_or_else(|| ApiError::bad_request("Invalid quantity"))?;
    let quantity = Quantity::new(quantity)?;

    let cart_id = parse_cart_id(&id)?;
    state
        .store
        .update_cart_quantity(auth.user_id, cart_id, quantity)
        .await?;
    Ok(MessageResponse::new("Quantity updated"))
}

/// DELETE /api/cart/{id}
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn remove<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let cart_id = parse_cart_id(&id)?;
    state.store.remove_cart_item(auth.user_id, cart_id).await?;
    Ok(MessageResponse::new("Item removed from cart"))
}

fn parse_cart_id(raw: &str) -> Result<CartItemId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::not_found("Cart item not found or unauthorized"))
}
