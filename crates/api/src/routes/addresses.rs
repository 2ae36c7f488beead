//! Delivery address endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::UserId;
use domain::{Address, AddressInput, NewAddress};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::IdField;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddAddressRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<IdField>,
    #[serde(flatten)]
    pub address: AddressInput,
}

#[derive(Debug, Serialize)]
pub struct AddressAddedResponse {
    pub message: &'static str,
    pub address: Address,
}

/// POST /api/addresses
#[tracing::instrument(skip(state, auth, req), fields(user_id = %auth.user_id))]
pub async fn add<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Json(req): Json<AddAddressRequest>,
) -> Result<(StatusCode, Json<AddressAddedResponse>), ApiError> {
    let user_id = auth.resolve(req.user_id.as_ref())?;
    let address = state
        .store
        .add_address(NewAddress::new(user_id, req.address)?)
        .await?;

    tracing::info!(address_id = %address.id, "address added");
    Ok((
        StatusCode::CREATED,
        Json(AddressAddedResponse {
            message: "Address added",
            address,
        }),
    ))
}

/// GET /api/addresses/{id}: the caller's saved addresses.
#[tracing::instrument(skip(state, auth))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Address>>, ApiError> {
    let user_id: UserId = id.parse().map_err(|_| ApiError::Forbidden)?;
    auth.ensure_self(user_id)?;
    Ok(Json(state.store.list_addresses(user_id).await?))
}
