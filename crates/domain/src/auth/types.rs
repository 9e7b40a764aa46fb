//! Session credential and account types

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Keys under which the session is persisted.
///
/// The three keys are written and cleared together, except during a refresh
/// cycle where only [`SessionKey::AccessToken`] is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionKey {
    /// Short-lived bearer credential.
    #[serde(rename = "authToken")]
    AccessToken,
    /// Long-lived credential used only to mint access tokens.
    #[serde(rename = "authRefreshToken")]
    RefreshToken,
    /// JSON-serialized last-known [`UserProfile`].
    #[serde(rename = "authUser")]
    CachedProfile,
}

impl SessionKey {
    /// Every session key, in persistence order.
    pub const ALL: [Self; 3] = [Self::AccessToken, Self::RefreshToken, Self::CachedProfile];

    /// Returns the storage key name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "authToken",
            Self::RefreshToken => "authRefreshToken",
            Self::CachedProfile => "authUser",
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Books stays.
    #[default]
    Guest,
    /// Lists properties and manages their bookings.
    Host,
}

/// Last-known user record. Advisory only, the backend is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user id
    pub id: u64,
    /// Email address
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account role
    #[serde(default, rename = "user_type", alias = "role")]
    pub role: UserRole,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
    /// Account creation timestamp, as sent by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// In-memory view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionCredentials {
    /// Bearer credential; absence means unauthenticated.
    pub access_token: Option<String>,
    /// Refresh credential.
    pub refresh_token: Option<String>,
    /// Cached profile.
    pub profile: Option<UserProfile>,
}

impl SessionCredentials {
    /// Returns true when an access token is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Returns true when nothing is held.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.profile.is_none()
    }
}

/// `POST /auth/login` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl LoginRequest {
    /// Creates a login payload.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Checks that both fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MissingField`] for the first empty field.
    pub fn validate(&self) -> DomainResult<()> {
        if self.email.trim().is_empty() {
            return Err(DomainError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(DomainError::MissingField("password"));
        }
        Ok(())
    }
}

/// Tokens and user returned by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthTokens {
    /// Fresh access token
    #[serde(alias = "accessToken")]
    pub access_token: String,
    /// Fresh refresh token
    #[serde(alias = "refreshToken")]
    pub refresh_token: String,
    /// Logged-in user
    pub user: UserProfile,
}

/// Body of a signup response.
///
/// Some deployments log the new user in directly, others only echo the
/// created user back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignupResponse {
    /// Access token, when the backend logs the user in directly.
    #[serde(default, alias = "accessToken")]
    pub access_token: Option<String>,
    /// Refresh token, when the backend logs the user in directly.
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
    /// Created user.
    #[serde(default)]
    pub user: Option<UserProfile>,
}

impl SignupResponse {
    /// Returns the session tokens if the response carried a complete set.
    #[must_use]
    pub fn into_tokens(self) -> Option<AuthTokens> {
        match (self.access_token, self.refresh_token, self.user) {
            (Some(access_token), Some(refresh_token), Some(user)) => Some(AuthTokens {
                access_token,
                refresh_token,
                user,
            }),
            _ => None,
        }
    }
}

/// `POST /auth/refresh` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshResponse {
    /// Newly minted access token
    #[serde(alias = "accessToken")]
    pub access_token: String,
}

/// Signup form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAccount {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
}

impl NewAccount {
    /// Validates required fields, email format and password length.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self) -> DomainResult<()> {
        if self.email.trim().is_empty() {
            return Err(DomainError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(DomainError::MissingField("password"));
        }
        if self.first_name.trim().is_empty() {
            return Err(DomainError::MissingField("first_name"));
        }
        if self.last_name.trim().is_empty() {
            return Err(DomainError::MissingField("last_name"));
        }
        if !is_valid_email(&self.email) {
            return Err(DomainError::InvalidEmail(self.email.clone()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        Ok(())
    }

    /// Returns the login payload for the same credentials.
    #[must_use]
    pub fn login_request(&self) -> LoginRequest {
        LoginRequest::new(self.email.clone(), self.password.clone())
    }
}

/// Partial profile update for `PATCH /auth/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct ProfileUpdate {
    /// New given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New avatar URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
}

impl ProfileUpdate {
    /// Returns true if no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.profile_pic_url.is_none()
    }

    /// Merges the set fields into `profile`.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(first_name) = &self.first_name {
            profile.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &self.last_name {
            profile.last_name.clone_from(last_name);
        }
        if let Some(url) = &self.profile_pic_url {
            profile.profile_pic_url = Some(url.clone());
        }
    }
}

/// `PATCH /auth/profile` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdateResponse {
    /// Updated user
    pub user: UserProfile,
}

/// Returns true if `email` looks like an email address.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.as_ref().is_some_and(|re| re.is_match(email))
}

/// Get a preview of a token (first 8 chars + ...), safe for logs.
#[must_use]
pub fn token_preview(token: &str) -> String {
    if token.len() > 12 {
        let cut = token
            .char_indices()
            .nth(8)
            .map_or(token.len(), |(idx, _)| idx);
        format!("{}...", &token[..cut])
    } else {
        token.to_string()
    }
}
