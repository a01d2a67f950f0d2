//! Record Token Service Binary
//!
//! Runs the token issuer as a REST API service:
//! - Structured JSON logging for Cloud Logging
//! - Request tracing with correlation IDs (see `service::middleware`)
//! - Fail-fast configuration check
//! - Graceful shutdown handling
//!
//! ## Configuration
//!
//! Environment variables:
//! - `TOKEN_SIGNING_SECRET`: HMAC secret for token signing (required; `JWT_SECRET` also accepted)
//! - `PORT`: Service port (default: 8001)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! TOKEN_SIGNING_SECRET=... cargo run --bin record_token_service --features service
//! ```

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crm_record_token::service::{create_router, ServiceState};
use crm_record_token::{IssuerConfig, LogFormat, ServiceConfig};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing(log_format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "record_token_service=info,crm_record_token=info,record_token=info,tower_http=info".into());

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE)
                )
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .flatten_event(true)
                )
                .init();
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service_config = ServiceConfig::from_env()?;
    init_tracing(service_config.log_format);

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");

    info!(
        version = version,
        build_sha = build_sha,
        "Starting Record Token Service"
    );

    // Refuse to serve without a signing secret
    let issuer_config = match IssuerConfig::require_from_env() {
        Ok(config) => {
            info!("Signing secret loaded from environment");
            config
        }
        Err(e) => {
            error!(error = %e, "Refusing to start");
            return Err(e.into());
        }
    };

    let state = ServiceState::new(issuer_config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", service_config.host, service_config.port).parse()?;
    info!(
        address = %addr,
        version = version,
        "Record Token Service listening"
    );

    let listener = TcpListener::bind(addr).await?;

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Record Token Service shutdown complete");

    Ok(())
}
