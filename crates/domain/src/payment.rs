//! Payment orders opened with the gateway and the command that settles them.

use chrono::{DateTime, Utc};
use common::{AddressId, OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Money;

/// Lifecycle of a gateway payment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Opened with the gateway, awaiting the customer's payment.
    #[default]
    Created,
    /// Signature verified and converted into an order.
    Paid,
}

impl PaymentStatus {
    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "created",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(PaymentStatus::Created),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(DomainError::UnknownPaymentStatus(other.to_string())),
        }
    }
}

/// A payment order opened with the gateway for a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentOrder {
    pub gateway_order_id: String,
    pub user_id: UserId,
    pub address_id: Option<AddressId>,
    pub amount: Money,
    pub currency: String,
    pub receipt: String,
    pub status: PaymentStatus,
    pub order_id: Option<OrderId>,
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentOrder {
    /// Records a freshly created gateway order.
    pub fn created(
        gateway_order_id: impl Into<String>,
        user_id: UserId,
        address_id: Option<AddressId>,
        amount: Money,
        currency: impl Into<String>,
        receipt: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            gateway_order_id: gateway_order_id.into(),
            user_id,
            address_id,
            amount,
            currency: currency.into(),
            receipt: receipt.into(),
            status: PaymentStatus::Created,
            order_id: None,
            gateway_payment_id: None,
            created_at,
        }
    }
}

/// Builds the receipt reference sent to the gateway.
pub fn receipt_for(user_id: UserId, at: DateTime<Utc>) -> String {
    format!("order_rcptid_{}_{}", user_id, at.timestamp_millis())
}

/// Converts a verified payment and the user's cart into an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub user_id: UserId,
    pub address_id: AddressId,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
}
