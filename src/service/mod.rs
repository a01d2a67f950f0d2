//! Record Token REST Service
//!
//! Exposes the token issuer over JSON for the CRM panel.
//!
//! ## Endpoints
//!
//! - `POST /api/token` - Issue a token for `{ "recordId": ... }`
//! - `POST /api/verify_token` - Verify a token for a record
//! - `GET /health` - Detailed service health check
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe (signing secret configured)

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{
    correlation_id_middleware, metrics_middleware, record_token_issuance,
    record_token_verification, REQUEST_ID_HEADER,
};
pub use routes::{create_router, ErrorBody, TokenRequest, TokenResponse};
pub use state::ServiceState;
