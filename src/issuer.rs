//! Record token issuer.
//!
//! Given a record identifier, mint a signed token asserting it, valid for
//! [`TOKEN_TTL_SECS`](crate::TOKEN_TTL_SECS) seconds from now.
//!
//! ## Validation Order
//!
//! 1. Signing secret configured, else [`IssueError::Configuration`]
//! 2. Record identifier non-empty, else [`IssueError::InvalidInput`]
//! 3. Sign the claim set; primitive failures become [`IssueError::Signing`]
//!
//! Issuance is pure computation: no I/O, no shared mutable state. One issuer
//! can be cloned into every request handler and called concurrently.

use std::sync::Arc;

use tracing::{debug, error};

use crate::clock::{Clock, SystemClock};
use crate::config::IssuerConfig;
use crate::error::IssueError;
use crate::types::{ClaimSet, RecordId, SignedToken};

/// A freshly minted token together with the claims it asserts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The signed token, handed to the caller verbatim.
    pub token: SignedToken,
    /// Claims embedded in `token`.
    pub claims: ClaimSet,
}

impl IssuedToken {
    /// Expiry of the token, Unix seconds.
    pub fn expires_at(&self) -> i64 {
        self.claims.expires_at
    }
}

/// Stateless token issuer.
///
/// ## Security
///
/// The issuer holds the signing secret. The secret only leaves it as HMAC
/// key material; it is never part of a token, an error, or a log event.
#[derive(Clone)]
pub struct TokenIssuer {
    config: IssuerConfig,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Create an issuer reading time from the system clock.
    pub fn new(config: IssuerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an issuer reading time from `clock`.
    pub fn with_clock(config: IssuerConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    /// Whether this issuer can sign tokens at all.
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Issue a token scoped to `record_id`.
    pub fn issue(&self, record_id: &str) -> Result<IssuedToken, IssueError> {
        let secret = self.config.secret().ok_or(IssueError::Configuration)?;
        let record_id = RecordId::new(record_id).map_err(|_| IssueError::InvalidInput)?;

        let claims = ClaimSet::issue(record_id, self.clock.now_unix());

        let token = SignedToken::sign(secret, &claims).map_err(|e| {
            error!(record_id = %claims.record_id, error = %e, "token signing failed");
            e
        })?;

        debug!(
            record_id = %claims.record_id,
            expires_at = claims.expires_at,
            "issued record token"
        );

        Ok(IssuedToken { token, claims })
    }

    /// Issue a token for an optional identifier, as received from a caller.
    ///
    /// `None` is treated like an empty identifier.
    pub fn issue_optional(&self, record_id: Option<&str>) -> Result<IssuedToken, IssueError> {
        self.issue(record_id.unwrap_or_default())
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
