//! Token verification for record tokens.
//!
//! ## Purpose
//!
//! The external application that receives a token must reject it when the
//! signature does not verify, when it was issued for a different record, or
//! when its expiry has passed. This module implements exactly those checks so
//! the contract can be exercised in-process (tests, benchmarks, and the
//! service's `/api/verify_token` endpoint).
//!
//! ## Check Order
//!
//! 1. Compact format and `HS256` header
//! 2. HMAC signature
//! 3. Record binding: `recordId` equals the record the caller expects
//! 4. Expiry: `now < exp`, evaluated independently of signature validity
//!
//! ## Verification Modes
//!
//! | Mode | Use Case | Cost |
//! |------|----------|------|
//! | `LocalSecret` | Single-node deployment, tests | Full HMAC per call |
//! | `Cached` | Repeated verification of the same tokens | HMAC on miss only |
//!
//! The cache only remembers the outcome of step 2 (plus decoded claims),
//! keyed by the SHA-256 digest of the exact token string. Steps 3 and 4 run
//! on every call, so a cached token still expires on time.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use super::claims::ClaimSet;
use super::token::SignedToken;
use crate::clock::{Clock, SystemClock};
use crate::config::SigningSecret;

/// Reason a token failed verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Token is not a well-formed compact token.
    #[error("token is malformed: {0}")]
    Malformed(&'static str),

    /// Header names an algorithm other than HS256.
    #[error("token algorithm is not accepted")]
    UnsupportedAlgorithm,

    /// Signature does not match the shared secret.
    #[error("token signature does not verify")]
    SignatureMismatch,

    /// Token is validly signed but scoped to a different record.
    #[error("token was issued for a different record")]
    RecordMismatch,

    /// Token expiry has passed.
    #[error("token expired at {expired_at}")]
    Expired {
        /// The token's `exp` claim.
        expired_at: i64,
    },
}

impl VerificationError {
    /// Short machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::UnsupportedAlgorithm => "unsupported_algorithm",
            Self::SignatureMismatch => "invalid_signature",
            Self::RecordMismatch => "record_mismatch",
            Self::Expired { .. } => "token_expired",
        }
    }
}

/// Configuration for the token verification cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries in the cache.
    pub max_entries: usize,
    /// Whether to enable the cache.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            enabled: true,
        }
    }
}

/// Verification mode for record tokens.
#[derive(Debug, Clone)]
pub enum VerificationMode {
    /// Verify every call with the shared secret.
    LocalSecret {
        /// The secret shared with the issuer.
        secret: SigningSecret,
    },

    /// Verify with an LRU cache of signature outcomes.
    Cached {
        /// The secret shared with the issuer.
        secret: SigningSecret,
        /// Cache configuration.
        config: CacheConfig,
    },
}

impl VerificationMode {
    /// Create a local secret verification mode.
    pub fn local_secret(secret: SigningSecret) -> Self {
        Self::LocalSecret { secret }
    }

    /// Create a cached verification mode with default configuration.
    pub fn cached(secret: SigningSecret) -> Self {
        Self::Cached {
            secret,
            config: CacheConfig::default(),
        }
    }

    /// Create a cached verification mode with custom configuration.
    pub fn cached_with_config(secret: SigningSecret, config: CacheConfig) -> Self {
        Self::Cached { secret, config }
    }
}

/// Cache key: SHA-256 of the full token string.
///
/// Collision resistant, so an entry only ever answers for the token that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct VerificationCacheKey([u8; 32]);

impl VerificationCacheKey {
    fn compute(token: &SignedToken) -> Self {
        Self(Sha256::digest(token.as_str().as_bytes()).into())
    }
}

type SignatureOutcome = Result<ClaimSet, VerificationError>;

/// Successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Claims of the verified token.
    pub claims: ClaimSet,
    /// Whether the signature outcome came from cache.
    pub cache_hit: bool,
}

/// Token verifier with optional caching.
///
/// Thread-safe and suitable for use in async services.
///
/// # Example
///
/// ```rust,ignore
/// use crm_record_token::{TokenVerifier, VerificationMode};
///
/// let verifier = TokenVerifier::new(VerificationMode::cached(secret));
/// let result = verifier.verify(&token, "deal-123")?;
/// println!("valid until {}", result.claims.expires_at);
/// ```
pub struct TokenVerifier {
    mode: VerificationMode,
    cache: Option<Arc<RwLock<LruCache<VerificationCacheKey, SignatureOutcome>>>>,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    /// Create a new token verifier using the system clock.
    pub fn new(mode: VerificationMode) -> Self {
        Self::with_clock(mode, Arc::new(SystemClock))
    }

    /// Create a verifier reading time from `clock`.
    pub fn with_clock(mode: VerificationMode, clock: Arc<dyn Clock>) -> Self {
        let cache = match &mode {
            VerificationMode::Cached { config, .. } if config.enabled => {
                let size = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
                Some(Arc::new(RwLock::new(LruCache::new(size))))
            }
            _ => None,
        };

        Self { mode, cache, clock }
    }

    fn secret(&self) -> &SigningSecret {
        match &self.mode {
            VerificationMode::LocalSecret { secret } => secret,
            VerificationMode::Cached { secret, .. } => secret,
        }
    }

    /// Verify `token` for `expected_record_id` at the clock's current time.
    pub fn verify(
        &self,
        token: &SignedToken,
        expected_record_id: &str,
    ) -> Result<VerificationResult, VerificationError> {
        self.verify_at(token, expected_record_id, self.clock.now_unix())
    }

    /// Verify `token` for `expected_record_id` at an explicit instant.
    pub fn verify_at(
        &self,
        token: &SignedToken,
        expected_record_id: &str,
        now: i64,
    ) -> Result<VerificationResult, VerificationError> {
        let (outcome, cache_hit) = self.check_signature(token);
        let claims = outcome?;

        if claims.record_id != *expected_record_id {
            return Err(VerificationError::RecordMismatch);
        }

        if claims.is_expired_at(now) {
            return Err(VerificationError::Expired {
                expired_at: claims.expires_at,
            });
        }

        Ok(VerificationResult { claims, cache_hit })
    }

    fn check_signature(&self, token: &SignedToken) -> (SignatureOutcome, bool) {
        let Some(cache) = &self.cache else {
            return (token.verify_signature(self.secret()), false);
        };

        let key = VerificationCacheKey::compute(token);

        if let Some(outcome) = cache.read().peek(&key) {
            return (outcome.clone(), true);
        }

        let outcome = token.verify_signature(self.secret());
        cache.write().put(key, outcome.clone());

        (outcome, false)
    }

    /// Get cache statistics.
    ///
    /// Returns `None` if caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| {
            let cache = cache.read();
            CacheStats {
                len: cache.len(),
                cap: cache.cap().get(),
            }
        })
    }

    /// Clear the verification cache.
    ///
    /// Does nothing if caching is disabled.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.write().clear();
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Current number of entries in the cache.
    pub len: usize,
    /// Maximum capacity of the cache.
    pub cap: usize,
}
