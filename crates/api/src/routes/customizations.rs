//! Customized product uploads.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use common::{CustomizationId, ProductId};
use domain::{Money, NewCustomization};
use serde::Serialize;
use store::{Store, StoreExt};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::IdField;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationCreatedResponse {
    pub message: &'static str,
    pub custom_id: CustomizationId,
}

/// Multipart fields of a customization upload.
#[derive(Debug, Default)]
struct CustomizationForm {
    user_id: Option<String>,
    product_id: Option<String>,
    details: Option<String>,
    price: Option<String>,
    design: Option<DesignFile>,
}

#[derive(Debug)]
struct DesignFile {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

impl CustomizationForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "fullDesign" {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                form.design = Some(DesignFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            let text = Some(text).filter(|t| !t.trim().is_empty());
            match name.as_str() {
                "userId" => form.user_id = text,
                "productId" => form.product_id = text,
                "customizationDetails" => form.details = text,
                "price" => form.price = text,
                other => tracing::debug!(field = other, "ignoring unknown form field"),
            }
        }
        Ok(form)
    }
}

/// POST /api/customized-products: store a customer's design for a product.
///
/// The design file is saved first and its public path is recorded in the
/// customization details under `fullDesignPath`.
#[tracing::instrument(skip(state, auth, multipart), fields(user_id = %auth.user_id))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CustomizationCreatedResponse>), ApiError> {
    let form = CustomizationForm::read(multipart).await?;
    let user_id = auth.resolve(form.user_id.map(IdField::Text).as_ref())?;

    let (Some(product_id), Some(details), Some(price), Some(design)) =
        (form.product_id, form.details, form.price, form.design)
    else {
        return Err(ApiError::bad_request(
            "productId, customizationDetails, price, and fullDesign are required",
        ));
    };

    let product_id: ProductId = product_id
        .parse()
        .map_err(|_| ApiError::bad_request("productId must be a valid integer"))?;
    state.store.require_product(product_id).await?;
    let price = Money::parse(&price)?;
    // reject malformed details before anything is written to disk
    NewCustomization::new(product_id, user_id, &details, price, "")?;

    let design_path = state
        .uploads
        .save_design(design.file_name.as_deref(), &design.bytes)
        .await
        .map_err(ApiError::internal)?;

    let customization = state
        .store
        .create_customization(NewCustomization::new(
            product_id,
            user_id,
            &details,
            price,
            &design_path,
        )?)
        .await?;

    tracing::info!(custom_id = %customization.id, %design_path, "customization created");
    Ok((
        StatusCode::CREATED,
        Json(CustomizationCreatedResponse {
            message: "Customized product created",
            custom_id: customization.id,
        }),
    ))
}
