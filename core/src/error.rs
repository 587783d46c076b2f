//! Error types for the request transport.
//!
//! # Design
//! Executor failures are carried as the error source without translation, so
//! callers can downcast to the concrete HTTP library error when they need to.
//! Non-2xx statuses are not errors at this layer.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors returned by `Transport` operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The target uri was empty.
    #[error("invalid uri: {0:?}")]
    InvalidUri(String),

    /// The bearer token contains a character that cannot be base64 encoded
    /// as a single byte.
    #[error("bearer token contains a character outside Latin-1: {0:?}")]
    InvalidCredential(char),

    /// A JSON payload held a value that has no flat field encoding.
    #[error("field {key:?} cannot be encoded as a flat value")]
    UnsupportedField { key: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The underlying HTTP round trip failed.
    #[error("transport failed: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// The response body was not valid JSON.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl TransportError {
    /// Wrap an executor failure.
    pub fn transport(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        TransportError::Transport(err.into())
    }
}
