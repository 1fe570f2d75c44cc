//! Error types for the task-manager API client.
//!
//! # Design
//! 401 and 422 get dedicated variants because callers treat them
//! differently: `Unauthorized` means "prompt for re-login", and
//! `Validation` carries the service's structured detail when the body
//! decodes as one. Every other non-2xx response lands in `Status` with
//! the raw status code and body for debugging. The client performs no
//! recovery of its own; every variant propagates to the immediate
//! caller.

use thiserror::Error;

use crate::types::HttpValidationError;

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response body could not be
    /// read (connection refused, DNS failure, mid-stream disconnect).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server returned 401 — the bearer token is missing, expired
    /// or invalid.
    #[error("not authorized (HTTP 401): {body}")]
    Unauthorized { body: String },

    /// The server returned 422. `detail` is decoded best-effort from
    /// the body; a body that does not match the expected shape leaves
    /// it `None` rather than failing.
    #[error("validation failed (HTTP 422): {body}")]
    Validation {
        detail: Option<HttpValidationError>,
        body: String,
    },

    /// The server returned a non-2xx status other than 401/422.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be deserialized into the expected
    /// type.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Classify a non-success response by status code.
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => ApiError::Unauthorized { body },
            422 => ApiError::Validation {
                detail: serde_json::from_str(&body).ok(),
                body,
            },
            _ => ApiError::Status { status, body },
        }
    }

    /// The HTTP status code behind this error, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Validation { .. } => Some(422),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode(_) => None,
        }
    }
}
