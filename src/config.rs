//! Process configuration.
//!
//! The signing secret is read once at startup into an immutable
//! [`IssuerConfig`] and handed to the issuer by value. Nothing on the request
//! path touches the environment.
//!
//! ## Environment
//!
//! - `TOKEN_SIGNING_SECRET`: HMAC key for record tokens (falls back to `JWT_SECRET`)
//! - `HOST`: bind address (default: 0.0.0.0)
//! - `PORT`: bind port (default: 8001)
//! - `LOG_FORMAT`: `json` or `pretty` (default: json)

use std::ffi::OsString;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretBox};

use crate::error::ConfigError;

/// Primary environment variable holding the signing secret.
pub const SECRET_ENV: &str = "TOKEN_SIGNING_SECRET";

/// Legacy variable name, consulted when [`SECRET_ENV`] is unset.
pub const LEGACY_SECRET_ENV: &str = "JWT_SECRET";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8001;

/// Symmetric key used to sign and verify record tokens.
///
/// Cloning shares the same allocation, which is zeroized when the last clone
/// drops. `Debug` prints no part of the key, including its length.
#[derive(Clone, Debug)]
pub struct SigningSecret(Arc<SecretBox<[u8]>>);

impl SigningSecret {
    /// Wrap raw key bytes. Returns `None` for an empty key.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Option<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            None
        } else {
            Some(Self(Arc::new(SecretBox::new(bytes.into_boxed_slice()))))
        }
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.0.expose_secret()
    }
}

/// Immutable configuration for [`crate::TokenIssuer`].
#[derive(Debug, Clone, Default)]
pub struct IssuerConfig {
    secret: Option<SigningSecret>,
}

impl IssuerConfig {
    /// Configuration with a signing secret. An empty secret counts as unset.
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: SigningSecret::new(secret),
        }
    }

    /// Configuration with no signing secret. Every issuance will fail with a
    /// configuration error.
    pub fn unconfigured() -> Self {
        Self { secret: None }
    }

    /// Read the secret from the environment, leaving it unset when absent.
    ///
    /// An empty [`SECRET_ENV`] falls through to [`LEGACY_SECRET_ENV`]. A value
    /// that is not valid UTF-8 is an error, never a silent fallthrough.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Result<Self, ConfigError> {
        for name in [SECRET_ENV, LEGACY_SECRET_ENV] {
            let Some(raw) = lookup(name) else {
                continue;
            };
            let raw = raw.into_string().map_err(|_| ConfigError::InvalidValue {
                name,
                reason: "value is not valid UTF-8".to_string(),
            })?;
            if let Some(secret) = SigningSecret::new(raw) {
                return Ok(Self {
                    secret: Some(secret),
                });
            }
        }

        Ok(Self::unconfigured())
    }

    /// Read the secret from the environment and fail fast when it is absent.
    pub fn require_from_env() -> Result<Self, ConfigError> {
        let config = Self::from_env()?;
        if config.is_configured() {
            Ok(config)
        } else {
            Err(ConfigError::MissingSecret(SECRET_ENV))
        }
    }

    /// Whether a usable secret is present.
    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub(crate) fn secret(&self) -> Option<&SigningSecret> {
        self.secret.as_ref()
    }
}

/// Log output format for the service binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Flattened JSON events (Cloud Logging compatible).
    #[default]
    Json,
    /// Human-readable output for local development.
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(ConfigError::InvalidValue {
                name: "LOG_FORMAT",
                reason: format!("expected json or pretty, got {:?}", other),
            }),
        }
    }
}

/// Listener and logging settings for the service binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_format: LogFormat::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from `HOST`, `PORT` and `LOG_FORMAT`, defaulting anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| {
                ConfigError::InvalidValue {
                    name: "PORT",
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host,
            port,
            log_format,
        })
    }
}
