//! # crm-record-token
//!
//! Short-lived signed tokens scoped to a CRM record.
//!
//! A CRM-embedded panel asks for a token for the record it is showing, then
//! opens an external application with that token in the URL. The external
//! application verifies the token with the same shared secret.
//!
//! ## Core Contract
//!
//! 1. Given a record identifier, issue a token asserting
//!    `{ recordId, iat, exp = iat + 3600 }`, signed with HMAC-SHA256
//! 2. Fail with a tagged error: configuration, invalid input, or signing
//! 3. Never expose the signing secret, or anything derived from it other
//!    than the signature
//!
//! ## Architecture
//!
//! ```text
//! recordId → TokenIssuer → ClaimSet → SignedToken (HS256 JWT)
//!                 ↑                          ↓
//!            IssuerConfig              TokenVerifier (signature, record, expiry)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod issuer;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{IssuerConfig, LogFormat, ServiceConfig, SigningSecret};
pub use error::{ConfigError, ErrorKind, IssueError};
pub use issuer::{IssuedToken, TokenIssuer};
pub use types::{ClaimSet, EmptyRecordId, RecordId, SignedToken, TOKEN_ALGORITHM};
pub use types::verification::{
    CacheConfig, CacheStats, TokenVerifier, VerificationError, VerificationMode,
    VerificationResult,
};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};

/// Lifetime of every issued token, in seconds.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;
