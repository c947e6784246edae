//! Error type for the adapter.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the record does not exist" from "the server returned an unexpected
//! status." Transport implementations construct `NotFound`, `HttpError` and
//! `Network`; the adapter propagates them unchanged and never retries or
//! reclassifies.

use std::fmt;

use crate::types::OperationKind;

/// Errors returned by the adapter and by transport implementations.
#[derive(Debug)]
pub enum ApiError {
    /// The operation kind has no HTTP translation.
    UnsupportedOperation(OperationKind),

    /// The operation requires a parameter that was not supplied.
    MissingParameter(&'static str),

    /// The server returned 404 — the requested record does not exist.
    NotFound,

    /// The server returned a non-2xx status other than 404.
    HttpError { status: u16, body: String },

    /// The request never reached the server or the connection failed.
    Network(String),

    /// The request payload could not be serialized to JSON.
    SerializationError(String),

    /// The response body did not match the expected shape.
    DeserializationError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::UnsupportedOperation(kind) => {
                write!(f, "unsupported operation: {kind}")
            }
            ApiError::MissingParameter(name) => {
                write!(f, "missing required parameter `{name}`")
            }
            ApiError::NotFound => write!(f, "record not found"),
            ApiError::HttpError { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
            ApiError::Network(msg) => write!(f, "network failure: {msg}"),
            ApiError::SerializationError(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            ApiError::DeserializationError(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
