//! Turning a cart into order lines.

use common::{CustomizationId, ProductId};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::error::DomainError;
use crate::value_objects::{Money, Quantity};

/// One line of an order about to be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Unit price; clients see rupees.
    #[serde(rename = "price", with = "crate::value_objects::rupees")]
    pub unit_price: Money,
    pub custom_id: Option<CustomizationId>,
    pub size: Option<String>,
}

impl OrderLine {
    /// Returns `unit_price × quantity`.
    pub fn total(&self) -> Result<Money, DomainError> {
        self.unit_price.checked_multiply(self.quantity)
    }
}

/// Order lines and their total, checked before anything is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    lines: Vec<OrderLine>,
    total: Money,
}

impl OrderDraft {
    /// Builds a draft from cart lines.
    ///
    /// Fails if the cart is empty or the total is not strictly positive.
    pub fn from_cart(items: &[CartItem]) -> Result<Self, DomainError> {
        let lines: Vec<OrderLine> = items
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                custom_id: item.custom_id,
                size: item.size.clone(),
            })
            .collect();
        Self::from_lines(lines)
    }

    /// Builds a draft from already assembled lines.
    pub fn from_lines(lines: Vec<OrderLine>) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::EmptyCart);
        }

        let total = lines
            .iter()
            .try_fold(Money::zero(), |acc, line| acc.checked_add(line.total()?))?;
        if !total.is_positive() {
            return Err(DomainError::InvalidTotal(total));
        }

        Ok(Self { lines, total })
    }

    /// Returns the order lines.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the order total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Consumes the draft, returning its lines.
    pub fn into_lines(self) -> Vec<OrderLine> {
        self.lines
    }
}
