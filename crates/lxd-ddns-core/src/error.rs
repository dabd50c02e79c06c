//! Error types for the DNS synchronizer
//!
//! Only [`Error::Lookup`] is recoverable inside a reconciliation cycle.
//! Every other variant aborts the cycle and, in the daemon, the process.

use thiserror::Error;

/// Result type alias for synchronizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DNS synchronizer
#[derive(Error, Debug)]
pub enum Error {
    /// Listing containers failed
    #[error("Container source error: {0}")]
    ContainerSource(String),

    /// Resolver-specific failure (timeout, SERVFAIL, NXDOMAIN, refused)
    #[error("DNS lookup failed: {0}")]
    Lookup(String),

    /// The update tool could not be started or fed
    #[error("Zone update error: {0}")]
    ZoneUpdate(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a container source error
    pub fn container_source(msg: impl Into<String>) -> Self {
        Self::ContainerSource(msg.into())
    }

    /// Create a resolver lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a zone update error
    pub fn zone_update(msg: impl Into<String>) -> Self {
        Self::ZoneUpdate(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this is a resolver-specific failure
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup(_))
    }
}
