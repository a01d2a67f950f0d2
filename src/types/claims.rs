//! Claim set carried inside a record token.
//!
//! ## Wire Shape
//!
//! ```json
//! {"recordId":"deal-123","iat":1000,"exp":4600}
//! ```
//!
//! `iat`/`exp` use the registered JWT claim names so off-the-shelf JWT
//! verifiers enforce expiry without extra configuration.

use serde::{Deserialize, Serialize};

use super::record::RecordId;
use crate::TOKEN_TTL_SECS;

/// Claims asserted by a record token.
///
/// ## Invariant
///
/// Claim sets built by [`ClaimSet::issue`] always satisfy
/// `expires_at - issued_at == TOKEN_TTL_SECS`. Decoded claim sets are taken
/// as-is; the verifier only trusts them after the signature checks out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Record the token is scoped to.
    #[serde(rename = "recordId")]
    pub record_id: RecordId,
    /// Issue time, Unix seconds.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    /// Expiry time, Unix seconds.
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl ClaimSet {
    /// Build the claims for a token issued at `issued_at`.
    pub fn issue(record_id: RecordId, issued_at: i64) -> Self {
        Self {
            record_id,
            issued_at,
            expires_at: issued_at + TOKEN_TTL_SECS,
        }
    }

    /// Whether the token has expired at `now`.
    ///
    /// The expiry instant itself is already outside the validity window.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expires_at
    }
}
