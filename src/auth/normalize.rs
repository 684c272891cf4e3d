//! Turns raw passport responses into a [`CanonicalIdentity`].

use serde_json::Value;

use super::{
    AuthError, CanonicalIdentity, Credential, Flow,
    wire::{SessionValidation, is_affirmative},
};

/// The flow a response body belongs to, with whatever the flow needs to
/// build an identity. Built from the [`Credential`] that was sent.
#[derive(Debug, Clone, Copy)]
pub enum ResponseFlow<'a> {
    Session,
    Direct { principal: &'a str },
}

impl ResponseFlow<'_> {
    pub fn flow(&self) -> Flow {
        match self {
            ResponseFlow::Session => Flow::Session,
            ResponseFlow::Direct { .. } => Flow::Direct,
        }
    }
}

impl<'a> From<&'a Credential> for ResponseFlow<'a> {
    fn from(credential: &'a Credential) -> Self {
        match credential {
            Credential::Session { .. } => ResponseFlow::Session,
            Credential::Direct { principal, .. } => ResponseFlow::Direct {
                principal: principal.as_str(),
            },
        }
    }
}

/// Parse a 2xx response body for the given flow.
///
/// Decode failures and unexpected shapes are `Protocol` errors; a body that
/// does not affirmatively report success is `InvalidCredentials`.
pub fn normalize(body: &[u8], flow: ResponseFlow<'_>) -> Result<CanonicalIdentity, AuthError> {
    match flow {
        ResponseFlow::Session => normalize_session(body),
        ResponseFlow::Direct { principal } => normalize_login(body, principal),
    }
}

fn normalize_session(body: &[u8]) -> Result<CanonicalIdentity, AuthError> {
    let response: SessionValidation = serde_json::from_slice(body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse passport session validation response");
        AuthError::Protocol(format!("undecodable session validation body: {}", e))
    })?;

    if !response.success {
        tracing::debug!(code = response.code, "Passport rejected session token");
        return Err(AuthError::InvalidCredentials);
    }

    let profile = response
        .data
        .and_then(|records| records.into_iter().next())
        .ok_or_else(|| {
            AuthError::Protocol("session reported valid but no profile was returned".into())
        })?;

    if profile.username.is_empty() {
        return Err(AuthError::Protocol(
            "session profile has an empty username".into(),
        ));
    }

    tracing::debug!(
        passport_id = ?profile.id,
        username = %profile.username,
        "Passport session validated"
    );

    Ok(CanonicalIdentity {
        username: profile.username,
        email: profile.email.unwrap_or_default(),
        display_name: profile.nickname.unwrap_or_default(),
        department: profile.department.filter(|d| !d.is_empty()),
    })
}

fn normalize_login(body: &[u8], principal: &str) -> Result<CanonicalIdentity, AuthError> {
    let response: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::error!(error = %e, "Failed to parse passport login response");
        AuthError::Protocol(format!("undecodable login body: {}", e))
    })?;

    let Some(fields) = response.as_object() else {
        return Err(AuthError::Protocol(
            "login response is not a JSON object".into(),
        ));
    };

    let success = fields.get("success").is_some_and(is_affirmative);
    if !success {
        tracing::debug!(principal = %principal, "Passport rejected login");
        return Err(AuthError::InvalidCredentials);
    }

    if principal.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(CanonicalIdentity::from_principal(principal))
}
