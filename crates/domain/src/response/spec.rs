//! API response type

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Response received from the booking API.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
    /// Round-trip time
    pub duration: Duration,
}

/// Error body shapes the backend produces.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
}

impl ApiResponse {
    /// Creates a response from a status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns true for `401 Unauthorized`.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Returns the body as lossy UTF-8 text.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserializes the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Extracts a human-readable error message from the body.
    ///
    /// Looks for `message`, then `description`, then `msg` in a JSON body,
    /// then falls back to the raw text, then to a generic status line.
    #[must_use]
    pub fn error_message(&self) -> String {
        if let Ok(body) = self.json::<ErrorBody>()
            && let Some(message) = body.message.or(body.description).or(body.msg)
        {
            return message;
        }

        let text = self.text();
        let text = text.trim();
        if text.is_empty() || text.starts_with('<') {
            format!("request failed with status {}", self.status)
        } else {
            text.to_string()
        }
    }
}
