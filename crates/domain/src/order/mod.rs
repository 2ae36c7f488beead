//! Placed orders: status machine, drafts and customer-facing views.

mod draft;
mod state;

pub use draft::{OrderDraft, OrderLine};
pub use state::OrderStatus;

use chrono::{DateTime, Utc};
use common::{CustomizationId, OrderId, OrderItemId, ProductId};
use serde::Serialize;

use crate::address::AddressSnapshot;
use crate::catalog::Product;
use crate::value_objects::{Money, Quantity};

/// Title shown for order lines whose product left the catalog.
pub const UNKNOWN_PRODUCT_TITLE: &str = "Unknown Product";
/// Image shown for order lines whose product left the catalog.
pub const PLACEHOLDER_IMAGE_URL: &str = "https://via.placeholder.com/150";
/// Shown when neither the order line nor the catalog has a value.
pub const NOT_AVAILABLE: &str = "N/A";

/// A placed order with its address and items, as shown to the customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub order_id: OrderId,
    #[serde(with = "crate::value_objects::rupees")]
    pub total_amount: Money,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub address: AddressSnapshot,
    pub items: Vec<OrderItem>,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemRecord {
    pub order_item_id: OrderItemId,
    pub product_id: ProductId,
    pub custom_id: Option<CustomizationId>,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub size: Option<String>,
}

/// Catalog details used to describe an order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSummary {
    pub title: String,
    pub image_url: String,
    pub brand: String,
    pub size_label: Option<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            image_url: product.image_url.clone(),
            brand: product.brand.clone(),
            size_label: product.size_label(),
        }
    }
}

/// An order line enriched with catalog details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub order_item_id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    #[serde(rename = "price", with = "crate::value_objects::rupees")]
    pub unit_price: Money,
    pub title: String,
    pub image_url: String,
    pub size: String,
    pub brand: String,
    pub custom_id: Option<CustomizationId>,
}

impl OrderItem {
    /// Describes a persisted line, falling back to placeholders for products
    /// that are no longer in the catalog.
    pub fn describe(record: OrderItemRecord, product: Option<ProductSummary>) -> Self {
        let (title, image_url, brand, catalog_size) = match product {
            Some(p) => (p.title, p.image_url, p.brand, p.size_label),
            None => (
                UNKNOWN_PRODUCT_TITLE.to_string(),
                PLACEHOLDER_IMAGE_URL.to_string(),
                NOT_AVAILABLE.to_string(),
                None,
            ),
        };
        let size = record
            .size
            .or(catalog_size)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            order_item_id: record.order_item_id,
            product_id: record.product_id,
            quantity: record.quantity,
            unit_price: record.unit_price,
            title,
            image_url,
            size,
            brand,
            custom_id: record.custom_id,
        }
    }
}
