//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::DomainError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
///
/// Every response carries a `message`; payment failures also carry `error`.
#[derive(Debug)]
pub enum ApiError {
    /// No bearer token was sent.
    MissingToken,
    /// The bearer token is malformed, forged or expired.
    InvalidToken,
    /// The token is valid but does not identify a current account.
    Unauthenticated(&'static str),
    /// The token is valid but belongs to someone else.
    Forbidden,
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
    /// Business rule violation.
    Domain(DomainError),
    /// Persistence error.
    Store(StoreError),
    /// Failure on one of the payment endpoints.
    Payment {
        status: StatusCode,
        message: &'static str,
        detail: String,
    },
    /// Internal server error.
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl std::fmt::Display) -> Self {
        ApiError::Internal(message.to_string())
    }

    /// Maps a checkout failure on `POST /api/payment/orders`.
    pub fn payment_order(err: CheckoutError) -> Self {
        let client_fault = matches!(
            err,
            CheckoutError::Domain(_)
                | CheckoutError::Store(StoreError::Domain(_) | StoreError::AddressNotOwned(_))
        );
        if client_fault {
            return ApiError::payment(StatusCode::BAD_REQUEST, err);
        }
        ApiError::Payment {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Error creating payment order",
            detail: err.to_string(),
        }
    }

    /// Maps a checkout failure on `POST /api/payment/verify`.
    ///
    /// A bad signature is the client's fault; every later failure rolled the
    /// placement back and is reported as a server error.
    pub fn payment_verify(err: CheckoutError) -> Self {
        match err {
            CheckoutError::SignatureMismatch => ApiError::Payment {
                status: StatusCode::BAD_REQUEST,
                message: "Payment verification failed",
                detail: err.to_string(),
            },
            other => ApiError::Payment {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Error processing payment",
                detail: other.to_string(),
            },
        }
    }

    fn payment(status: StatusCode, err: CheckoutError) -> Self {
        let detail = err.to_string();
        let message = match &err {
            CheckoutError::Domain(DomainError::EmptyCart)
            | CheckoutError::Store(StoreError::Domain(DomainError::EmptyCart)) => "Cart is empty",
            CheckoutError::Domain(DomainError::InvalidTotal(_))
            | CheckoutError::Store(StoreError::Domain(DomainError::InvalidTotal(_))) => {
                "Invalid total amount"
            }
            CheckoutError::Store(StoreError::AddressNotOwned(_)) => "Invalid address ID",
            _ => "Invalid payment request",
        };
        ApiError::Payment {
            status,
            message,
            detail,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Payment {
                status,
                message,
                detail,
            } => {
                if status.is_server_error() {
                    tracing::error!(error = %detail, "{message}");
                }
                let body = serde_json::json!({ "message": message, "error": detail });
                return (status, Json(body)).into_response();
            }
            ApiError::MissingToken => (StatusCode::UNAUTHORIZED, "No token provided".to_string()),
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Unauthorized".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "internal server error");
        }

        let body = serde_json::json!({ "message": message });
        (status, Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::UnknownOrderStatus(_)
        | DomainError::UnknownPaymentStatus(_)
        | DomainError::UnknownProvider(_) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        _ => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match err {
        StoreError::Domain(domain_err) => domain_error_to_response(domain_err),
        StoreError::UserNotFound(_)
        | StoreError::ProductNotFound(_)
        | StoreError::CartItemNotFound(_)
        | StoreError::OrderNotFound(_)
        | StoreError::CustomizationNotFound(_)
        | StoreError::PaymentOrderNotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::DuplicateEmail(_) | StoreError::AddressNotOwned(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        StoreError::PaymentAlreadyCaptured(_) | StoreError::AmountMismatch { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        StoreError::Database(_) | StoreError::Migration(_) | StoreError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}
