//! Service state management.

use std::sync::Arc;

use crate::config::IssuerConfig;
use crate::issuer::TokenIssuer;
use crate::types::verification::{TokenVerifier, VerificationMode};

/// Shared service state.
///
/// Holds the issuer and, when a secret is configured, a cached verifier
/// sharing the same secret. Both are read-only after construction.
#[derive(Clone)]
pub struct ServiceState {
    /// Token issuer for `/api/token`.
    pub issuer: TokenIssuer,
    verifier: Option<Arc<TokenVerifier>>,
}

impl ServiceState {
    /// Build state from an issuer configuration.
    pub fn new(config: IssuerConfig) -> Self {
        let verifier = config
            .secret()
            .map(|secret| Arc::new(TokenVerifier::new(VerificationMode::cached(secret.clone()))));

        Self {
            issuer: TokenIssuer::new(config),
            verifier,
        }
    }

    /// Verifier, if the service can verify tokens.
    pub fn verifier(&self) -> Option<&TokenVerifier> {
        self.verifier.as_deref()
    }

    /// Whether the signing secret is configured.
    pub fn is_ready(&self) -> bool {
        self.issuer.is_configured()
    }
}
