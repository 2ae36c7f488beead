//! HTTP API server for the storefront backend.
//!
//! Provides REST endpoints for accounts, catalog, cart, addresses, orders and
//! checkout, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod seed;
pub mod state;
pub mod uploads;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, Request, header};
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use config::Config;
pub use error::ApiError;
pub use state::{AppState, SharedGateway};

/// Creates the Axum application router with all routes and shared state.
///
/// `cors_origin` is a comma-separated list of allowed browser origins.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
    cors_origin: &str,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let design_files = ServeDir::new(state.uploads.dir());

    Router::new()
        .route("/health", get(routes::health::check))
        // accounts
        .route("/api/register", post(routes::users::register::<S>))
        .route("/api/login", post(routes::users::login::<S>))
        .route("/api/google-login", post(routes::users::google_login::<S>))
        .route("/api/validate-token", get(routes::users::validate_token::<S>))
        .route("/api/user/{id}", put(routes::users::update::<S>))
        // catalog
        .route("/api/products", get(routes::products::list::<S>))
        .route("/api/product/{id}", get(routes::products::get::<S>))
        .route(
            "/api/customized-products",
            post(routes::customizations::create::<S>)
                .layer(DefaultBodyLimit::max(uploads::MAX_UPLOAD_BYTES)),
        )
        // cart
        .route("/api/cart", post(routes::cart::add::<S>))
        .route(
            "/api/cart/{id}",
            get(routes::cart::list::<S>)
                .put(routes::cart::update_quantity::<S>)
                .delete(routes::cart::remove::<S>),
        )
        // addresses and orders
        .route("/api/addresses", post(routes::addresses::add::<S>))
        .route("/api/addresses/{id}", get(routes::addresses::list::<S>))
        .route("/api/orders/{id}", get(routes::orders::list::<S>))
        .route("/api/orders/{id}/cancel", put(routes::orders::cancel::<S>))
        // checkout
        .route("/api/payment/orders", post(routes::payments::create_order::<S>))
        .route("/api/payment/verify", post(routes::payments::verify::<S>))
        .with_state(state)
        .nest_service(uploads::PUBLIC_PREFIX, design_files)
        .merge(metrics_router)
        .layer(cors(cors_origin))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "http_request",
                        request_id = %uuid::Uuid::new_v4(),
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// CORS for the storefront frontend.
fn cors(origins: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
