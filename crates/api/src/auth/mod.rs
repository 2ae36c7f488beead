//! Bearer-token authentication.

pub mod password;
pub mod token;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use common::UserId;
use store::Store;

use crate::error::ApiError;
use crate::routes::IdField;
use crate::state::AppState;

pub use password::Passwords;
pub use token::{Claims, TokenService};

/// The caller identified by a valid `Authorization: Bearer` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: String,
}

impl AuthUser {
    /// Fails with 403 unless `user_id` is the caller.
    pub fn ensure_self(&self, user_id: UserId) -> Result<(), ApiError> {
        if user_id == self.user_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }

    /// Resolves an optional `userId` from a request body.
    ///
    /// An absent value means the caller; anything else must name the caller.
    pub fn resolve(&self, claimed: Option<&IdField>) -> Result<UserId, ApiError> {
        match claimed {
            None => Ok(self.user_id),
            Some(field) => {
                let user_id = field.to_id::<UserId>().ok_or(ApiError::Forbidden)?;
                self.ensure_self(user_id)?;
                Ok(user_id)
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<Arc<AppState<S>>> for AuthUser
where
    S: Store + Clone + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::MissingToken)?;
        let claims = state.tokens.verify(token)?;
        Ok(AuthUser {
            user_id: claims.user_id,
            email: claims.email,
        })
    }
}
