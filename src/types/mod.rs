//! Core types for record tokens.

pub mod record;
pub mod claims;
pub mod token;
pub mod verification;

pub use record::{RecordId, EmptyRecordId};
pub use claims::ClaimSet;
pub use token::{SignedToken, TOKEN_ALGORITHM};
pub use verification::{
    TokenVerifier, VerificationMode, VerificationResult, VerificationError,
    CacheConfig, CacheStats,
};
