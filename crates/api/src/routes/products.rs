//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::ProductId;
use domain::{Product, ProductQuery};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductParams {
    pub category: Option<String>,
    pub exclude: Option<String>,
}

impl ProductParams {
    fn into_query(self) -> ProductQuery {
        ProductQuery {
            category: self.category.filter(|c| !c.trim().is_empty()),
            // an unparseable id excludes nothing
            exclude: self.exclude.and_then(|id| id.parse().ok()),
        }
    }
}

/// GET /api/products: list products, optionally by category.
#[tracing::instrument(skip(state))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ProductParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.store.list_products(params.into_query()).await?;
    Ok(Json(products))
}

/// GET /api/product/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let not_found = || ApiError::not_found("Product not found");
    let product_id: ProductId = id.parse().map_err(|_| not_found())?;
    let product = state
        .store
        .get_product(product_id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(product))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_into_query() {
        let query = ProductParams {
            category: Some("Tees".into()),
            exclude: Some("12".into()),
        }
        .into_query();
        assert_eq!(query.category.as_deref(), Some("Tees"));
        assert_eq!(query.exclude, Some(ProductId::new(12)));

        let query = ProductParams {
            category: Some(" ".into()),
            exclude: Some("abc".into()),
        }
        .into_query();
        assert_eq!(query, ProductQuery::default());
    }
}
