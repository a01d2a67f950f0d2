//! Signed record tokens.
//!
//! ## Format
//!
//! A token is a standard HS256 JWT:
//!
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(HMAC-SHA256(secret, header "." claims))
//! ```
//!
//! with header `{"typ":"JWT","alg":"HS256"}` and claims as described in
//! [`super::claims`]. Encoding and decoding go through `jsonwebtoken`, so the
//! external application can verify with any stock JWT library.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::claims::ClaimSet;
use super::verification::VerificationError;
use crate::config::SigningSecret;
use crate::error::IssueError;

/// The only algorithm this crate signs with or accepts.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Compact signed token asserting a [`ClaimSet`].
///
/// Holders of the signing secret can verify it; nobody else can mint one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignedToken(String);

impl SignedToken {
    /// Sign a claim set with the given secret.
    pub fn sign(secret: &SigningSecret, claims: &ClaimSet) -> Result<Self, IssueError> {
        encode(
            &Header::new(TOKEN_ALGORITHM),
            claims,
            &EncodingKey::from_secret(secret.expose()),
        )
        .map(Self)
        .map_err(|e| match e.kind() {
            JwtErrorKind::Json(_) => IssueError::Signing("claim serialization failed"),
            _ => IssueError::Signing("token encoding failed"),
        })
    }

    /// Check the signature and decode the claims.
    ///
    /// This does NOT check expiry or the record binding; see
    /// [`super::verification::TokenVerifier`] for the full check. Expiry is
    /// left to the verifier's clock rather than the library's wall clock.
    pub fn verify_signature(&self, secret: &SigningSecret) -> Result<ClaimSet, VerificationError> {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;

        decode::<ClaimSet>(
            &self.0,
            &DecodingKey::from_secret(secret.expose()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            JwtErrorKind::InvalidSignature => VerificationError::SignatureMismatch,
            JwtErrorKind::InvalidAlgorithm | JwtErrorKind::InvalidAlgorithmName => {
                VerificationError::UnsupportedAlgorithm
            }
            JwtErrorKind::InvalidToken => VerificationError::Malformed("expected three segments"),
            JwtErrorKind::Base64(_) => VerificationError::Malformed("segment is not base64url"),
            JwtErrorKind::Json(_) | JwtErrorKind::Utf8(_) => {
                VerificationError::Malformed("segment is not valid JSON")
            }
            JwtErrorKind::MissingRequiredClaim(_) => {
                VerificationError::Malformed("claims are not a valid claim set")
            }
            _ => VerificationError::Malformed("token rejected"),
        })
    }

    /// Get the token as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create a token from a string (for verification).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Consume the token, returning its string form.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Check if this looks like a compact token (three non-empty base64url segments).
    pub fn is_valid_format(&self) -> bool {
        let segments: Vec<&str> = self.0.split('.').collect();
        segments.len() == 3
            && segments.iter().all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c == '-' || c == '_' || c.is_ascii_alphanumeric())
            })
    }
}

impl std::fmt::Display for SignedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
