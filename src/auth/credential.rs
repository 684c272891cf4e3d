use std::fmt;

use serde::Deserialize;

/// Which passport flow a credential is verified through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Browser session token issued by the passport portal.
    Session,
    /// Username and password presented directly (e.g. by a CLI client).
    Direct,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Session => "session",
            Flow::Direct => "direct",
        }
    }
}

/// A credential whose flow has already been decided by the caller.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Session { token: String },
    Direct { principal: String, secret: String },
}

impl Credential {
    pub fn session(token: impl Into<String>) -> Self {
        Credential::Session {
            token: token.into(),
        }
    }

    pub fn direct(principal: impl Into<String>, secret: impl Into<String>) -> Self {
        Credential::Direct {
            principal: principal.into(),
            secret: secret.into(),
        }
    }

    /// Whether every field the flow needs is non-empty.
    pub fn is_complete(&self) -> bool {
        match self {
            Credential::Session { token } => !token.is_empty(),
            Credential::Direct { principal, secret } => !principal.is_empty() && !secret.is_empty(),
        }
    }

    pub fn flow(&self) -> Flow {
        match self {
            Credential::Session { .. } => Flow::Session,
            Credential::Direct { .. } => Flow::Direct,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Session { .. } => f
                .debug_struct("Session")
                .field("token", &"[REDACTED]")
                .finish(),
            Credential::Direct { principal, .. } => f
                .debug_struct("Direct")
                .field("principal", principal)
                .field("secret", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Login request as handed over by the host platform.
///
/// The host fills whichever fields its login surface collected; empty
/// strings mean "not supplied".
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub token: String,
    pub principal: String,
    pub password: String,
}

impl LoginRequest {
    /// Pick the flow for this request.
    ///
    /// A session token wins over a principal/password pair. Returns `None`
    /// when neither shape is complete.
    pub fn credential(&self) -> Option<Credential> {
        if !self.token.is_empty() {
            Some(Credential::session(self.token.clone()))
        } else if !self.principal.is_empty() && !self.password.is_empty() {
            Some(Credential::direct(
                self.principal.clone(),
                self.password.clone(),
            ))
        } else {
            None
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("has_token", &!self.token.is_empty())
            .field("principal", &self.principal)
            .field("has_password", &!self.password.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn request(token: &str, principal: &str, password: &str) -> LoginRequest {
        LoginRequest {
            token: token.into(),
            principal: principal.into(),
            password: password.into(),
        }
    }

    #[rstest]
    #[case::token_only(request("tok", "", ""), Some(Flow::Session))]
    #[case::token_wins(request("tok", "alice", "pw"), Some(Flow::Session))]
    #[case::direct(request("", "alice", "pw"), Some(Flow::Direct))]
    #[case::missing_password(request("", "alice", ""), None)]
    #[case::missing_principal(request("", "", "pw"), None)]
    #[case::empty(request("", "", ""), None)]
    fn test_flow_selection(#[case] req: LoginRequest, #[case] expected: Option<Flow>) {
        assert_eq!(req.credential().map(|c| c.flow()), expected);
    }

    #[test]
    fn test_direct_credential_carries_fields() {
        let credential = request("", "alice", "pw1").credential().unwrap();
        assert_eq!(credential, Credential::direct("alice", "pw1"));
    }

    #[rstest]
    #[case::token(Credential::session("tok"), true)]
    #[case::empty_token(Credential::session(""), false)]
    #[case::direct(Credential::direct("alice", "pw"), true)]
    #[case::empty_principal(Credential::direct("", "pw"), false)]
    #[case::empty_secret(Credential::direct("alice", ""), false)]
    fn test_is_complete(#[case] credential: Credential, #[case] expected: bool) {
        assert_eq!(credential.is_complete(), expected);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let session = format!("{:?}", Credential::session("tok-123"));
        assert!(!session.contains("tok-123"));

        let direct = format!("{:?}", Credential::direct("alice", "hunter2"));
        assert!(direct.contains("alice"));
        assert!(!direct.contains("hunter2"));

        let req = format!("{:?}", request("tok-123", "alice", "hunter2"));
        assert!(!req.contains("tok-123"));
        assert!(!req.contains("hunter2"));
    }

    #[test]
    fn test_request_deserializes_partial_json() {
        let req: LoginRequest = serde_json::from_str(r#"{"principal":"bob"}"#).unwrap();
        assert_eq!(req.principal, "bob");
        assert!(req.credential().is_none());
    }
}
