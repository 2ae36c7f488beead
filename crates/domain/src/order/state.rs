//! Order status machine.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of a placed order.
///
/// Status transitions:
/// ```text
/// Placed ──► OrderConfirmed ──► Shipped ──► OutForDelivery ──► Delivered
///    │             │               │               │
///    └─────────────┴───────────────┴───────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment verified and order persisted.
    #[default]
    Placed,

    /// Accepted by the store.
    OrderConfirmed,

    /// Handed over to the courier.
    Shipped,

    /// With the courier for final delivery.
    OutForDelivery,

    /// Received by the customer (terminal state).
    Delivered,

    /// Cancelled by the customer (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the next forward status, if any.
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Placed => Some(OrderStatus::OrderConfirmed),
            OrderStatus::OrderConfirmed => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::OutForDelivery),
            OrderStatus::OutForDelivery => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    /// Returns true if moving to `to` is a valid transition.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        match to {
            OrderStatus::Cancelled => !self.is_terminal(),
            _ => self.next() == Some(to),
        }
    }

    /// Checks that the order may still be cancelled.
    pub fn ensure_cancellable(&self) -> Result<(), DomainError> {
        match self {
            OrderStatus::Delivered => Err(DomainError::OrderDelivered),
            OrderStatus::Cancelled => Err(DomainError::OrderAlreadyCancelled),
            _ => Ok(()),
        }
    }

    /// Validates and performs a transition.
    pub fn transition(&self, to: OrderStatus) -> Result<OrderStatus, DomainError> {
        if to == OrderStatus::Cancelled {
            self.ensure_cancellable()?;
        }
        if !self.can_transition_to(to) {
            return Err(DomainError::InvalidStatusTransition { from: *self, to });
        }
        Ok(to)
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "placed",
            OrderStatus::OrderConfirmed => "order_confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placed" => Ok(OrderStatus::Placed),
            "order_confirmed" => Ok(OrderStatus::OrderConfirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::UnknownOrderStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 6] = [
        OrderStatus::Placed,
        OrderStatus::OrderConfirmed,
        OrderStatus::Shipped,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_default_status() {
        assert_eq!(OrderStatus::default(), OrderStatus::Placed);
    }

    #[test]
    fn test_forward_transitions_are_single_step() {
        assert!(OrderStatus::Placed.can_transition_to(OrderStatus::OrderConfirmed));
        assert!(!OrderStatus::Placed.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::OutForDelivery.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Placed));
    }

    #[test]
    fn test_cancellable_statuses() {
        for status in ALL {
            assert_eq!(
                status.can_transition_to(OrderStatus::Cancelled),
                !status.is_terminal(),
                "{status}"
            );
        }
    }

    #[test]
    fn test_cancel_errors() {
        assert_eq!(
            OrderStatus::Delivered.ensure_cancellable(),
            Err(DomainError::OrderDelivered)
        );
        assert_eq!(
            OrderStatus::Cancelled.transition(OrderStatus::Cancelled),
            Err(DomainError::OrderAlreadyCancelled)
        );
        assert_eq!(
            OrderStatus::Shipped.transition(OrderStatus::Cancelled),
            Ok(OrderStatus::Cancelled)
        );
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = OrderStatus::Placed
            .transition(OrderStatus::Delivered)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid order status transition from placed to delivered"
        );
    }

    #[test]
    fn test_text_round_trip() {
        for status in ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }
}
