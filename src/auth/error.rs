use crate::{config::ConfigError, services::ProvisionError};

/// Failure of an authentication attempt or of the follow-up provisioning.
///
/// Every variant is terminal for the attempt. `InvalidCredentials` is
/// deliberately uniform: it covers both "nothing usable was supplied" and
/// "the IdP rejected what was supplied" so callers cannot tell which factor
/// was wrong.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The IdP endpoint could not be resolved or is not a usable URL.
    #[error("Identity provider misconfigured: {0}")]
    Config(#[from] ConfigError),

    /// The IdP could not be reached or the connection failed mid-response.
    #[error("Identity provider unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    /// The IdP answered with a non-2xx status or a body of unexpected shape.
    #[error("Identity provider returned an invalid response: {0}")]
    Protocol(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Local user store failure while provisioning or looking up users.
    #[error("User provisioning failed: {0}")]
    Provisioning(#[from] ProvisionError),
}

impl AuthError {
    /// Stable short code for logs and exit statuses.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Config(_) => "config_error",
            AuthError::Transport(_) => "transport_error",
            AuthError::Protocol(_) => "protocol_error",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Provisioning(_) => "store_error",
        }
    }
}
