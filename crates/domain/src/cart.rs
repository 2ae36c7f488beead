//! Shopping cart lines.

use chrono::{DateTime, Utc};
use common::{CartItemId, CustomizationId, ProductId, UserId};
use serde::Serialize;

use crate::catalog::Product;
use crate::error::DomainError;
use crate::value_objects::{Money, Quantity};

/// A line in a customer's cart.
///
/// Title, image, price and brand are copied from the catalog when the line is
/// added, so the cart keeps the price the customer saw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    #[serde(rename = "cart_id")]
    pub id: CartItemId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub title: String,
    pub image_url: String,
    #[serde(rename = "discounted_price", with = "crate::value_objects::rupees")]
    pub unit_price: Money,
    pub brand: String,
    pub quantity: Quantity,
    pub size: Option<String>,
    pub custom_id: Option<CustomizationId>,
    pub customization_details: Option<serde_json::Value>,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Returns `unit_price × quantity`.
    pub fn line_total(&self) -> Result<Money, DomainError> {
        self.unit_price.checked_multiply(self.quantity)
    }

    /// Returns true if `other` would be merged into this line.
    pub fn same_line(&self, other: &NewCartItem) -> bool {
        self.user_id == other.user_id
            && self.product_id == other.product_id
            && self.size == other.size
            && self.custom_id == other.custom_id
    }
}

/// A cart line ready to be added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub title: String,
    pub image_url: String,
    pub unit_price: Money,
    pub brand: String,
    pub quantity: Quantity,
    pub size: Option<String>,
    pub custom_id: Option<CustomizationId>,
}

impl NewCartItem {
    /// Snapshots a catalog product into a cart line at its discounted price.
    pub fn for_product(
        user_id: UserId,
        product: &Product,
        quantity: Quantity,
        size: Option<String>,
        custom_id: Option<CustomizationId>,
    ) -> Self {
        Self {
            user_id,
            product_id: product.id,
            title: product.title.clone(),
            image_url: product.image_url.clone(),
            unit_price: product.discounted_price,
            brand: product.brand.clone(),
            quantity,
            size: size
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            custom_id,
        }
    }
}

/// Sums the line totals of a cart.
pub fn cart_total(items: &[CartItem]) -> Result<Money, DomainError> {
    items
        .iter()
        .try_fold(Money::zero(), |acc, item| acc.checked_add(item.line_total()?))
}
