//! Account endpoints: sign-up, sign-in, token validation and profile edits.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::UserId;
use domain::{GoogleProfile, NewUser, Registration, User, UserProfile, UserUpdate, normalize_email};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::MessageResponse;
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: UserProfile,
}

#[derive(Serialize)]
pub struct UserUpdatedResponse {
    pub message: &'static str,
    pub user: UserProfile,
}

fn session<S: Store>(state: &AppState<S>, user: &User) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(SessionResponse {
        token: state.tokens.issue(user)?,
        user: user.profile(),
    }))
}

// -- Handlers --

/// POST /api/register: create an email/password account.
#[tracing::instrument(skip(state, req))]
pub async fn register<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let registration = Registration::new(req.email, req.name, req.password, req.phone_number)?;
    let hash = state.passwords.hash(registration.password.clone()).await?;
    let user = state
        .store
        .create_user(NewUser::manual(registration, hash))
        .await?;

    metrics::counter!("users_registered_total", "provider" => "manual").increment(1);
    tracing::info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        MessageResponse::new("User registered successfully"),
    ))
}

/// POST /api/login: exchange email and password for a token.
#[tracing::instrument(skip(state, req))]
pub async fn login<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let (Some(email), Some(password)) = (
        req.email.filter(|e| !e.trim().is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let invalid = || ApiError::bad_request("Invalid email or password");
    let user = state
        .store
        .find_user_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(invalid)?;
    // Google accounts have no password to check
    let hash = user.password_hash.clone().ok_or_else(invalid)?;

    if !state.passwords.verify(password, hash).await? {
        metrics::counter!("auth_login_failures_total").increment(1);
        tracing::info!(user_id = %user.id, "password mismatch");
        return Err(invalid());
    }

    session(&state, &user)
}

/// POST /api/google-login: sign in with a Google profile, creating the account on first use.
#[tracing::instrument(skip(state, req))]
pub async fn google_login<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let profile = GoogleProfile::new(req.email, req.name, req.picture, req.phone_number)?;

    if let Some(user) = state.store.find_user_by_email(&profile.email).await? {
        return session(&state, &user);
    }

    let user = state.store.create_user(NewUser::google(profile)).await?;
    metrics::counter!("users_registered_total", "provider" => "google").increment(1);
    tracing::info!(user_id = %user.id, "google user created");
    session(&state, &user)
}

/// GET /api/validate-token: return the caller's profile.
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn validate_token<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    // a valid token for a deleted account is still a failed login
    let user = state
        .store
        .find_user(auth.user_id)
        .await?
        .ok_or(ApiError::Unauthenticated("User not found"))?;

    Ok(Json(UserResponse {
        user: user.profile(),
    }))
}

/// PUT /api/user/{id}: edit the caller's own profile.
#[tracing::instrument(skip(state, auth, req))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserUpdatedResponse>, ApiError> {
    let user_id: UserId = id.parse().map_err(|_| ApiError::Forbidden)?;
    auth.ensure_self(user_id)?;
    let update = UserUpdate::new(req.name, req.email, req.phone_number)?;
    let user = state.store.update_user(user_id, update).await?;

    Ok(Json(UserUpdatedResponse {
        message: "User updated successfully",
        user: user.profile(),
    }))
}
