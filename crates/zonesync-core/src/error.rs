//! Error types for zonesync
//!
//! This module defines all error types used throughout the crate.

use std::fmt;

use thiserror::Error;

use crate::model::{Endpoint, WriteOp};

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Provider-specific error, surfaced verbatim from the provider
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Remote object not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A DNS name does not belong to any owned zone
    #[error("No owned zone matches {0}")]
    ZoneNotFound(String),

    /// Record type outside the supported set
    #[error("Unsupported record type: {0}")]
    UnsupportedRecordType(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// One or more changes could not be applied
    #[error(transparent)]
    Apply(#[from] AggregateError),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// A write operation that failed, with the error that caused it
#[derive(Debug)]
pub struct OpFailure {
    /// The operation that was attempted
    pub op: WriteOp,
    /// The provider error
    pub error: Error,
}

impl fmt::Display for OpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} record set (zone: {}, name: {}, type: {}): {}",
            self.op.kind(),
            self.op.zone(),
            self.op.name(),
            self.op.record_type(),
            self.error
        )
    }
}

/// Failures collected over one apply pass
///
/// Holds every failed write and every endpoint that was dropped because it
/// did not resolve to an owned zone.
#[derive(Debug, Default)]
pub struct AggregateError {
    /// Failed write operations, in execution order
    pub failures: Vec<OpFailure>,
    /// Endpoints outside every owned zone
    pub unresolved: Vec<Endpoint>,
}

impl AggregateError {
    /// Whether anything went wrong
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty() && self.unresolved.is_empty()
    }

    /// Convert into a `Result`, failing if any failure was recorded
    pub fn into_result(self) -> std::result::Result<(), AggregateError> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} operation(s) failed, {} endpoint(s) outside owned zones",
            self.failures.len(),
            self.unresolved.len()
        )?;
        for failure in &self.failures {
            write!(f, "; {failure}")?;
        }
        for endpoint in &self.unresolved {
            write!(f, "; unresolvable zone for {} ({})", endpoint.dns_name, endpoint.record_type)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}
