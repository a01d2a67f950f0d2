//! Axum routes for the record token service.

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ErrorKind, IssueError};
use crate::types::SignedToken;

use super::middleware::{
    correlation_id_middleware, metrics_middleware, record_token_issuance,
    record_token_verification,
};
use super::state::ServiceState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to issue a token.
///
/// `dealId` is accepted for callers built against the deal-only contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Record the token should be scoped to.
    #[serde(rename = "recordId", alias = "dealId", default)]
    pub record_id: Option<String>,
}

/// Successful issuance. The token is the only field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed token.
    pub token: String,
}

/// Structured error returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    pub kind: ErrorKind,
    /// Human-readable message. Never contains secret material.
    pub message: String,
}

impl ErrorBody {
    /// Create an error body.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.kind.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<IssueError> for ErrorBody {
    fn from(err: IssueError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

impl IntoResponse for ErrorBody {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(
            kind = %self.kind,
            error = %self.message,
            "Request error"
        );
        (self.status(), Json(self)).into_response()
    }
}

/// Request to verify a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTokenRequest {
    /// The token to verify.
    pub token: String,
    /// The record the token is expected to be scoped to.
    #[serde(rename = "recordId", alias = "dealId")]
    pub record_id: String,
}

/// Response from token verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    /// Whether the token is valid.
    pub valid: bool,
    /// Reason code if invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Expiry of a valid token.
    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

/// Service health response (detailed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Whether the signing secret is configured.
    pub signing_configured: bool,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `alive`.
    pub status: String,
}

/// Readiness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service can issue tokens.
    pub ready: bool,
    /// Detail when not ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Issue a token for the requested record.
async fn token_handler(
    State(state): State<Arc<ServiceState>>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ErrorBody> {
    // A secret problem outranks a bad body
    let request = match payload {
        Ok(Json(request)) => request,
        Err(_) if !state.is_ready() => TokenRequest::default(),
        Err(rejection) => {
            record_token_issuance(Err(ErrorKind::InvalidInputError));
            return Err(ErrorBody::new(
                ErrorKind::InvalidInputError,
                format!("invalid request body: {}", rejection.body_text()),
            ));
        }
    };

    match state.issuer.issue_optional(request.record_id.as_deref()) {
        Ok(issued) => {
            record_token_issuance(Ok(()));
            Ok(Json(TokenResponse {
                token: issued.token.into_string(),
            }))
        }
        Err(e) => {
            record_token_issuance(Err(e.kind()));
            Err(e.into())
        }
    }
}

/// Verify a token against the record it should be scoped to.
async fn verify_token_handler(
    State(state): State<Arc<ServiceState>>,
    payload: Result<Json<VerifyTokenRequest>, JsonRejection>,
) -> Result<Json<VerifyTokenResponse>, ErrorBody> {
    let verifier = state.verifier().ok_or_else(|| {
        ErrorBody::from(IssueError::Configuration)
    })?;

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            record_token_verification(false, Some("invalid_request"));
            return Err(ErrorBody::new(
                ErrorKind::InvalidInputError,
                format!("invalid request body: {}", rejection.body_text()),
            ));
        }
    };

    let token = SignedToken::from_string(request.token);
    let response = match verifier.verify(&token, &request.record_id) {
        Ok(result) => VerifyTokenResponse {
            valid: true,
            reason: None,
            expires_at: Some(result.claims.expires_at),
        },
        Err(e) => VerifyTokenResponse {
            valid: false,
            reason: Some(e.code().to_string()),
            expires_at: None,
        },
    };

    record_token_verification(response.valid, response.reason.as_deref());
    Ok(Json(response))
}

/// Health check endpoint (detailed).
async fn health_handler(State(state): State<Arc<ServiceState>>) -> Json<HealthResponse> {
    let configured = state.is_ready();
    Json(HealthResponse {
        status: if configured { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        signing_configured: configured,
    })
}

/// Liveness probe endpoint. Does NOT check configuration.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe endpoint.
///
/// Returns 200 if the signing secret is configured, 503 otherwise.
async fn readiness_handler(
    State(state): State<Arc<ServiceState>>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    if state.is_ready() {
        Ok(Json(ReadinessResponse {
            ready: true,
            details: None,
        }))
    } else {
        Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                details: Some("token signing is not configured".to_string()),
            }),
        ))
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the record token service.
pub fn create_router(state: ServiceState) -> Router {
    let state = Arc::new(state);

    Router::new()
        // Token operations
        .route("/api/token", post(token_handler))
        .route("/api/verify_token", post(verify_token_handler))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(correlation_id_middleware))
        .with_state(state)
}
