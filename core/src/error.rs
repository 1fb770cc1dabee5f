//! Error types for the Olog API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the resource does not exist" from "the server returned an unexpected
//! status." All other non-2xx responses land in `HttpError` with the raw
//! status code and body for debugging. `SilentFailure` is deliberately
//! separate from both: the transport succeeded, the status was fine, and the
//! server still did not persist what was submitted.

use std::fmt;

/// Errors returned by `OlogClient` and `BlockingClient` operations.
#[derive(Debug)]
pub enum ApiError {
    /// The server returned 404 — the requested resource does not exist.
    NotFound,

    /// The server returned a non-2xx status other than 404.
    HttpError { status: u16, body: String },

    /// A write was acknowledged with a 2xx status but the object echoed by
    /// the server differs from the one submitted.
    SilentFailure { submitted: String, echoed: String },

    /// A write payload names an `owner` other than the authenticated user.
    /// Raised before any request is built; the server would reject it anyway.
    OwnerMismatch { owner: String, user: String },

    /// A textual timestamp matched none of the accepted formats.
    InvalidTimestamp(String),

    /// The response body could not be deserialized into the expected type.
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    SerializationError(String),

    /// The HTTP round-trip itself failed (connect, TLS, read).
    Transport(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound => write!(f, "resource not found"),
            ApiError::HttpError { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
            ApiError::SilentFailure { submitted, echoed } => {
                write!(
                    f,
                    "server acknowledged the write but stored {echoed} instead of {submitted}"
                )
            }
            ApiError::OwnerMismatch { owner, user } => {
                write!(
                    f,
                    "payload owner {owner:?} does not match the authenticated user {user:?}"
                )
            }
            ApiError::InvalidTimestamp(input) => {
                write!(f, "timestamp {input:?} matches no accepted format")
            }
            ApiError::DeserializationError(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
            ApiError::SerializationError(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            ApiError::Transport(msg) => {
                write!(f, "transport failed: {msg}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
