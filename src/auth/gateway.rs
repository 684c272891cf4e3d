use std::sync::Arc;

use super::{
    AuthError, CanonicalIdentity, Credential,
    normalize::{ResponseFlow, normalize},
    wire::{LOGIN_PATH, SESSION_VALIDATE_PATH, encode_secret, normalize_endpoint, resource_url},
};
use crate::config::{EndpointSource, IdpConfig};

/// Client for the remote passport identity provider.
///
/// Each [`authenticate`](Self::authenticate) call resolves the endpoint,
/// makes exactly one HTTP request and normalizes the answer. Nothing is
/// retried or cached between calls.
pub struct PassportGateway {
    endpoint_source: Arc<dyn EndpointSource>,
    secret_prefix: String,
    secret_suffix: String,
    http_client: reqwest::Client,
}

impl PassportGateway {
    /// Create a gateway from IdP configuration, applying its timeout.
    pub fn new(config: &IdpConfig) -> Result<Self, AuthError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(|e| {
            tracing::error!(error = %e, "Failed to build passport HTTP client");
            AuthError::Transport(e)
        })?;

        Ok(Self::with_client(
            Arc::new(config.clone()),
            &config.secret_prefix,
            &config.secret_suffix,
            http_client,
        ))
    }

    /// Create a gateway with a custom endpoint source and HTTP client.
    pub fn with_client(
        endpoint_source: Arc<dyn EndpointSource>,
        secret_prefix: impl Into<String>,
        secret_suffix: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            endpoint_source,
            secret_prefix: secret_prefix.into(),
            secret_suffix: secret_suffix.into(),
            http_client,
        }
    }

    /// Verify a credential against the passport IdP.
    ///
    /// A credential with an empty token, principal or secret is rejected
    /// before any request is made.
    pub async fn authenticate(&self, credential: &Credential) -> Result<CanonicalIdentity, AuthError> {
        if !credential.is_complete() {
            tracing::debug!(flow = credential.flow().as_str(), "Incomplete credential, skipping IdP call");
            return Err(AuthError::InvalidCredentials);
        }

        let base = normalize_endpoint(&self.endpoint_source.endpoint()?);

        let body = match credential {
            Credential::Session { token } => self.validate_session(&base, token).await?,
            Credential::Direct { principal, secret } => {
                self.login(&base, principal, secret).await?
            }
        };
        normalize(&body, ResponseFlow::from(credential))
    }

    async fn validate_session(&self, base: &str, token: &str) -> Result<Vec<u8>, AuthError> {
        let url = resource_url(base, SESSION_VALIDATE_PATH)?;

        tracing::debug!(url = %url, "Validating passport session token");

        let response = self
            .http_client
            .get(url)
            .query(&[("token", token), ("data", "true")])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reach passport session endpoint");
                AuthError::Transport(e)
            })?;

        read_success_body(response).await
    }

    async fn login(
        &self,
        base: &str,
        principal: &str,
        secret: &str,
    ) -> Result<Vec<u8>, AuthError> {
        let url = resource_url(base, LOGIN_PATH)?;
        let password = encode_secret(&self.secret_prefix, secret.as_bytes(), &self.secret_suffix);

        tracing::debug!(url = %url, principal = %principal, "Submitting passport login");

        let response = self
            .http_client
            .post(url)
            .form(&[("username", principal), ("password", password.as_str())])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to reach passport login endpoint");
                AuthError::Transport(e)
            })?;

        read_success_body(response).await
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<Vec<u8>, AuthError> {
    let status = response.status();
    if !status.is_success() {
        tracing::error!(status = %status, "Passport endpoint returned error");
        return Err(AuthError::Protocol(format!(
            "identity provider returned {}",
            status
        )));
    }

    let body = response.bytes().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read passport response body");
        AuthError::Transport(e)
    })?;
    Ok(body.to_vec())
}
