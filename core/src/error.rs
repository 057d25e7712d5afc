//! Error types for the Clarifai binding.
//!
//! # Design
//! Validation failures are raised before any request is built, so callers can
//! tell "nothing was sent" apart from transport and decode failures. Transport
//! errors are carried through unchanged. A non-`OK` `status_code` inside a
//! well-formed body is *not* an error; callers inspect it themselves.

use thiserror::Error;

/// Precondition failures detected before any network call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// A tag request carried an empty `url` list.
    #[error("at least one url required")]
    MissingUrls,

    /// A feedback form named neither docids nor urls.
    #[error("at least one docid or url required")]
    MissingTarget,

    /// A feedback form named both docids and urls.
    #[error("exactly one of docids or urls must be provided, not both")]
    ConflictingTargets,
}

/// Failures reported by a `Transport` implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network-level request failure with context. The source is boxed so
    /// any `Transport` implementation can report its own client's errors.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The service rejected the access token even after a refresh.
    #[error("TOKEN_INVALID: access token rejected")]
    TokenInvalid,

    /// HTTP 429. The transport stays marked as throttled until a later call
    /// succeeds.
    #[error("THROTTLED: request rate exceeded")]
    Throttled,

    /// HTTP 400, reported by the service as `ALL_ERROR`.
    #[error("ALL_ERROR: {body}")]
    BadRequest { body: String },

    /// HTTP 500, reported by the service as `CLARIFAI_ERROR`.
    #[error("CLARIFAI_ERROR: {body}")]
    Server { body: String },

    /// Any other non-success status.
    #[error("UNEXPECTED_STATUS_CODE: HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The token endpoint answered with something that is not a token.
    #[error("token request failed: {0}")]
    Token(String),
}

impl TransportError {
    pub fn network<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Network {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Errors returned by `ClarifaiClient` operations.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body did not match the expected JSON shape.
    #[error("failed to decode {context} response: {source}")]
    Decode {
        context: &'static str,
        source: serde_json::Error,
    },

    /// The request payload could not be serialized to JSON.
    #[error("failed to serialize request: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// Missing or unusable configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ApiError>;
