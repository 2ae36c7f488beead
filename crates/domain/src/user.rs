//! Customer accounts and sign-up inputs.

use chrono::{DateTime, Utc};
use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::present;

/// How a customer authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email and password.
    #[default]
    Manual,
    /// Google sign-in.
    Google,
}

impl AuthProvider {
    /// Returns the provider name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Manual => "manual",
            AuthProvider::Google => "google",
        }
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AuthProvider {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(AuthProvider::Manual),
            "google" => Ok(AuthProvider::Google),
            other => Err(DomainError::UnknownProvider(other.to_string())),
        }
    }
}

/// A stored customer account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    /// bcrypt hash; `None` for accounts created through Google sign-in.
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub provider: AuthProvider,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns the public view of this account.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            user_id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            provider: self.provider,
            picture: self.picture.clone(),
        }
    }
}

/// Account data safe to return to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub provider: AuthProvider,
    pub picture: Option<String>,
}

/// Normalizes an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validated email/password sign-up input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
    pub phone_number: Option<String>,
}

impl Registration {
    /// Validates raw sign-up fields.
    pub fn new(
        email: Option<String>,
        name: Option<String>,
        password: Option<String>,
        phone_number: Option<String>,
    ) -> Result<Self, DomainError> {
        // passwords keep their whitespace
        let password = password.filter(|p| !p.is_empty());
        match (present(email), present(name), password) {
            (Some(email), Some(name), Some(password)) => Ok(Self {
                email: normalize_email(&email),
                name,
                password,
                phone_number: present(phone_number),
            }),
            _ => Err(DomainError::MissingFields(
                "Email, name, and password are required",
            )),
        }
    }
}

/// Profile data supplied by Google sign-in.
#[derive(Debug, Clone)]
pub struct GoogleProfile {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub phone_number: Option<String>,
}

impl GoogleProfile {
    /// Validates the fields sent after a Google sign-in.
    pub fn new(
        email: Option<String>,
        name: Option<String>,
        picture: Option<String>,
        phone_number: Option<String>,
    ) -> Result<Self, DomainError> {
        match (present(email), present(name)) {
            (Some(email), Some(name)) => Ok(Self {
                email: normalize_email(&email),
                name,
                picture: present(picture),
                phone_number: present(phone_number),
            }),
            _ => Err(DomainError::MissingFields("Email and name are required")),
        }
    }
}

/// An account ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub phone_number: Option<String>,
    pub provider: AuthProvider,
    pub picture: Option<String>,
}

impl NewUser {
    /// Builds an email/password account from a registration and its password hash.
    pub fn manual(registration: Registration, password_hash: String) -> Self {
        Self {
            email: registration.email,
            name: registration.name,
            password_hash: Some(password_hash),
            phone_number: registration.phone_number,
            provider: AuthProvider::Manual,
            picture: None,
        }
    }

    /// Builds a Google account; these have no password.
    pub fn google(profile: GoogleProfile) -> Self {
        Self {
            email: profile.email,
            name: profile.name,
            password_hash: None,
            phone_number: profile.phone_number,
            provider: AuthProvider::Google,
            picture: profile.picture,
        }
    }
}

/// Validated profile edit.
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
}

impl UserUpdate {
    /// Validates raw profile edit fields.
    pub fn new(
        name: Option<String>,
        email: Option<String>,
        phone_number: Option<String>,
    ) -> Result<Self, DomainError> {
        match (present(name), present(email)) {
            (Some(name), Some(email)) => Ok(Self {
                name,
                email: normalize_email(&email),
                phone_number: present(phone_number),
            }),
            _ => Err(DomainError::MissingFields("Name and email are required")),
        }
    }
}
