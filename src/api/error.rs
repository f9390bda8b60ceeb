//! Errors surfaced by the API gateway.

use thiserror::Error;

/// Statuses that mean the session is no longer accepted by the backend.
pub const AUTH_FAILURE_STATUSES: [u16; 3] = [401, 403, 422];

pub fn is_auth_failure(status: u16) -> bool {
    AUTH_FAILURE_STATUSES.contains(&status)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Session was rejected. The store is already cleared and navigation is
    /// back on the login page; callers stop without touching the body.
    #[error("Session expired (status {status})")]
    SessionExpired { status: u16 },

    /// Non-2xx response. `message` is the server's, when it sent one.
    #[error("{}", http_message(.status, .message))]
    Http {
        status: u16,
        message: Option<String>,
    },

    /// 2xx response carrying `success: false`.
    #[error("{message}")]
    Rejected { message: String },

    /// The request never produced a usable HTTP response.
    #[error("Connection error: {0}")]
    Transport(String),

    /// Body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    MalformedPayload(String),
}

impl ApiError {
    /// Build the error for a non-2xx status, preferring the server's `message`.
    pub fn from_status(status: u16, body: Option<&serde_json::Value>) -> Self {
        let message = body
            .and_then(|b| b.get("message"))
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        ApiError::Http { status, message }
    }

    /// Message to show the user, with `fallback` standing in when the server
    /// gave no explanation.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Http { message: Some(m), .. } => m.clone(),
            ApiError::Http { message: None, .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::SessionExpired { status } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn http_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(m) => m.clone(),
        None => format!("status {}", status),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
