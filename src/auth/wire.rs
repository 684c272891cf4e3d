//! Passport IdP wire contract.
//!
//! - Session flow: `GET {endpoint}passport/is_valid?token=..&data=true`
//!   answers `{code, success, data: [{id, username, email, nickname, department}]}`
//! - Direct flow: `POST {endpoint}passport/login.action` with form fields
//!   `username` and `password` answers an object with a `success` key that is
//!   either `true` or `"true"`
//!
//! The direct-flow password is `base64url(prefix + secret + suffix)`. The
//! markers are fixed by the provider; the scheme is an encoding, not
//! encryption.

use base64::{Engine, engine::general_purpose::URL_SAFE};
use reqwest::Url;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::AuthError;
use crate::config::ConfigError;

pub const SESSION_VALIDATE_PATH: &str = "passport/is_valid";
pub const LOGIN_PATH: &str = "passport/login.action";

/// Normalize a configured endpoint into a base URL ending in exactly one `/`.
///
/// Endpoints without a scheme are assumed to be plain HTTP.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    let mut base = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };
    let trimmed_len = base.trim_end_matches('/').len();
    base.truncate(trimmed_len);
    base.push('/');
    base
}

/// Join a normalized base and a resource path into a request URL.
pub fn resource_url(base: &str, path: &str) -> Result<Url, AuthError> {
    let raw = format!("{}{}", base, path.trim_start_matches('/'));
    Url::parse(&raw).map_err(|e| {
        AuthError::Config(ConfigError::Validation(format!(
            "invalid identity provider URL '{}': {}",
            raw, e
        )))
    })
}

/// Encode a raw secret the way the passport login endpoint expects it.
pub fn encode_secret(prefix: &str, secret: &[u8], suffix: &str) -> String {
    let mut wrapped = Vec::with_capacity(prefix.len() + secret.len() + suffix.len());
    wrapped.extend_from_slice(prefix.as_bytes());
    wrapped.extend_from_slice(secret);
    wrapped.extend_from_slice(suffix.as_bytes());
    URL_SAFE.encode(wrapped)
}

/// Whether a `success` value reports success. Only `true` and `"true"` do.
pub fn is_affirmative(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true",
        _ => false,
    }
}

fn deserialize_affirmative<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(is_affirmative(&value))
}

/// Body of the session validation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionValidation {
    #[serde(default)]
    pub code: i64,
    #[serde(default, deserialize_with = "deserialize_affirmative")]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Vec<PassportProfile>>,
}

/// Profile record returned inline by the session validation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PassportProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
}
