//! Error taxonomy for token issuance and configuration.
//!
//! Issuance failures carry one of three [`ErrorKind`]s so callers can branch
//! on the kind instead of matching message text. Messages are fixed strings:
//! nothing derived from the signing secret ever reaches them.

use serde::{Deserialize, Serialize};

/// Machine-readable kind of an issuance failure.
///
/// Serializes to the contract names (`"ConfigurationError"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Signing secret missing or unusable. Operator action needed.
    ConfigurationError,
    /// Record identifier missing or empty. Caller-correctable.
    InvalidInputError,
    /// The signing primitive failed unexpectedly.
    SigningError,
}

impl ErrorKind {
    /// Contract name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "ConfigurationError",
            Self::InvalidInputError => "InvalidInputError",
            Self::SigningError => "SigningError",
        }
    }

    /// True when the caller can fix the request (4xx-equivalent).
    ///
    /// A consuming panel shows "please select a valid record" for these and
    /// "service unavailable" for everything else.
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidInputError)
    }

    /// HTTP status code equivalent.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ConfigurationError => 503,
            Self::InvalidInputError => 400,
            Self::SigningError => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by [`crate::TokenIssuer::issue`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IssueError {
    /// No usable signing secret was configured.
    #[error("token signing is not configured")]
    Configuration,

    /// The record identifier was absent or empty.
    #[error("a record identifier is required")]
    InvalidInput,

    /// HMAC or claim serialization failed.
    #[error("failed to sign token: {0}")]
    Signing(&'static str),
}

impl IssueError {
    /// The contract kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration => ErrorKind::ConfigurationError,
            Self::InvalidInput => ErrorKind::InvalidInputError,
            Self::Signing(_) => ErrorKind::SigningError,
        }
    }
}

/// Error raised while loading configuration at process start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// None of the accepted secret variables is set to a non-empty value.
    #[error("signing secret not configured: set {0}")]
    MissingSecret(&'static str),

    /// A setting was present but could not be parsed.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        /// Environment variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
