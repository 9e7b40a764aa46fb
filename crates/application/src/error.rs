//! Application error types

use shortlet_domain::DomainError;
use thiserror::Error;

use crate::ports::{TokenStoreError, TransportError};

/// Why a refresh cycle failed.
///
/// Cloned to every request that was queued behind the failed refresh.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    /// The refresh endpoint answered with an error status.
    #[error("refresh rejected ({status}): {message}")]
    Rejected {
        /// HTTP status
        status: u16,
        /// Extracted message
        message: String,
    },

    /// The refresh request never got a response.
    #[error("refresh request failed: {0}")]
    Transport(#[from] TransportError),

    /// No refresh token is stored.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The refresh endpoint answered 2xx without a usable token.
    #[error("malformed refresh response: {0}")]
    Malformed(String),

    /// The refresh did not complete within the configured bound.
    #[error("refresh timed out")]
    Timeout,

    /// The new token could not be persisted.
    #[error("could not persist refreshed token: {0}")]
    Storage(String),
}

/// Errors surfaced to callers of the API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No usable session: the session has been cleared and the user must log
    /// in again.
    #[error("not authenticated: {reason}")]
    Unauthenticated {
        /// What ended the session.
        reason: String,
    },

    /// The request was queued behind a refresh that failed.
    #[error("session refresh failed: {0}")]
    RefreshFailed(#[source] RefreshError),

    /// The backend still answered 401 after a successful refresh. The
    /// session is kept; this is not an authentication failure.
    #[error("refreshed credential was rejected")]
    TokenRejected,

    /// The backend rejected the request.
    #[error("request rejected ({status}): {message}")]
    Remote {
        /// HTTP status
        status: u16,
        /// Message extracted from the response body
        message: String,
    },

    /// No response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Client-side validation failed; nothing was sent.
    #[error("validation error: {0}")]
    Validation(#[from] DomainError),

    /// A response body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Reading or writing the persisted session failed.
    #[error("session storage error: {0}")]
    Storage(#[from] TokenStoreError),

    /// Waiting on an in-flight refresh exceeded the configured bound.
    #[error("operation timed out")]
    Timeout,

    /// The refresh this request was waiting on was abandoned.
    #[error("operation cancelled")]
    Cancelled,
}

impl ClientError {
    /// True for every outcome that ends with the user logged out.
    #[must_use]
    pub const fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated { .. } | Self::RefreshFailed(_)
        )
    }

    /// HTTP status of a remote rejection.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            Self::Validation(e) => e.to_string(),
            Self::Transport(_) | Self::Timeout => {
                "Could not reach the server. Please try again.".to_string()
            }
            Self::TokenRejected => "The server rejected the request.".to_string(),
            e if e.is_unauthenticated() => "Your session has expired. Please log in again.".to_string(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
