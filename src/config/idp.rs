use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Remote passport identity provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdpConfig {
    /// Base address of the passport service. The scheme is optional and
    /// defaults to plain HTTP.
    pub endpoint: String,

    /// Timeout applied by the HTTP client to each call, in seconds.
    /// Unset means the client's own default (no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Marker prepended to the raw secret before encoding.
    ///
    /// This is a compatibility shim required by the passport login endpoint,
    /// not a secret: the encoding provides no confidentiality.
    #[serde(default = "default_secret_prefix")]
    pub secret_prefix: String,

    /// Marker appended to the raw secret before encoding.
    #[serde(default = "default_secret_suffix")]
    pub secret_suffix: String,
}

pub const DEFAULT_SECRET_PREFIX: &str = "Jbchen6";
pub const DEFAULT_SECRET_SUFFIX: &str = "xjdaI";

fn default_secret_prefix() -> String {
    DEFAULT_SECRET_PREFIX.to_string()
}

fn default_secret_suffix() -> String {
    DEFAULT_SECRET_SUFFIX.to_string()
}

impl IdpConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_secs: None,
            secret_prefix: default_secret_prefix(),
            secret_suffix: default_secret_suffix(),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Validation("idp.endpoint cannot be empty".into()));
        }
        if self.secret_prefix.is_empty() || self.secret_suffix.is_empty() {
            return Err(ConfigError::Validation(
                "idp.secret_prefix and idp.secret_suffix cannot be empty".into(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "idp.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Supplies the configured passport base address.
///
/// Called once per authentication attempt; the value is never cached by the
/// caller, so implementations backed by mutable settings take effect on the
/// next attempt.
pub trait EndpointSource: Send + Sync {
    fn endpoint(&self) -> Result<String, ConfigError>;
}

impl EndpointSource for IdpConfig {
    fn endpoint(&self) -> Result<String, ConfigError> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::Validation("idp.endpoint is not configured".into()));
        }
        Ok(endpoint.to_string())
    }
}
