//! HTTP route handlers.

pub mod addresses;
pub mod cart;
pub mod customizations;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;

use serde::{Deserialize, Serialize};

/// An integer sent either as a JSON number or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdField {
    Number(i64),
    Text(String),
}

impl IdField {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            IdField::Number(n) => Some(*n),
            IdField::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Converts to a typed identifier, if the value is an integer.
    pub fn to_id<T: From<i64>>(&self) -> Option<T> {
        self.as_i64().map(T::from)
    }
}

/// Body of responses that only confirm an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> axum::Json<Self> {
        axum::Json(Self { message })
    }
}
