//! Shared application state.

use std::sync::Arc;

use checkout::{CheckoutCoordinator, CheckoutError, PaymentGateway, SignatureVerifier};
use store::Store;

use crate::auth::{Passwords, TokenService};
use crate::config::Config;
use crate::uploads::UploadStore;

/// Payment gateway behind a trait object so tests can swap in the in-memory one.
pub type SharedGateway = Arc<dyn PaymentGateway>;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub store: S,
    pub checkout: CheckoutCoordinator<S, SharedGateway>,
    pub tokens: TokenService,
    pub passwords: Passwords,
    pub uploads: UploadStore,
}

impl<S: Store + Clone> AppState<S> {
    /// Wires the store and gateway together with the configured secrets.
    pub fn from_config(
        store: S,
        gateway: SharedGateway,
        config: &Config,
    ) -> Result<Self, CheckoutError> {
        let verifier = SignatureVerifier::new(config.razorpay_key_secret.expose())?;
        let checkout = CheckoutCoordinator::new(
            store.clone(),
            gateway,
            verifier,
            config.payment_currency.clone(),
        );

        Ok(Self {
            store,
            checkout,
            tokens: TokenService::new(config.jwt_secret.expose().as_bytes(), config.jwt_ttl_secs),
            passwords: Passwords::new(config.bcrypt_cost),
            uploads: UploadStore::new(&config.upload_dir),
        })
    }
}
