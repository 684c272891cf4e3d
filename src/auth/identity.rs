use serde::{Deserialize, Serialize};

/// Identity established by the passport IdP, independent of the flow that
/// produced it.
///
/// `username` is never empty. `email` may be empty until the identity goes
/// through [`apply_profile_defaults`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalIdentity {
    pub username: String,
    pub email: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl CanonicalIdentity {
    /// Identity for a principal whose login response carried no profile.
    pub fn from_principal(principal: &str) -> Self {
        Self {
            username: principal.to_string(),
            email: String::new(),
            display_name: principal.to_string(),
            department: None,
        }
    }
}

/// Fill in the fields the local store requires but the IdP may omit.
///
/// - empty email: the username itself when it already looks like an address,
///   otherwise `username@organization_domain`
/// - empty display name: the username
pub fn apply_profile_defaults(identity: &mut CanonicalIdentity, organization_domain: &str) {
    if identity.email.is_empty() {
        identity.email = if identity.username.contains('@') {
            identity.username.clone()
        } else {
            format!("{}@{}", identity.username, organization_domain)
        };
    }
    if identity.display_name.is_empty() {
        identity.display_name = identity.username.clone();
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn identity(username: &str, email: &str, display_name: &str) -> CanonicalIdentity {
        CanonicalIdentity {
            username: username.into(),
            email: email.into(),
            display_name: display_name.into(),
            department: None,
        }
    }

    #[rstest]
    #[case::synthesized("bob", "", "bob@example.com")]
    #[case::username_is_address("bob@example.com", "", "bob@example.com")]
    #[case::kept("bob", "robert@corp.example", "robert@corp.example")]
    fn test_email_default(#[case] username: &str, #[case] email: &str, #[case] expected: &str) {
        let mut id = identity(username, email, "Bob");
        apply_profile_defaults(&mut id, "example.com");
        assert_eq!(id.email, expected);
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        let mut id = identity("carol", "carol@example.com", "");
        apply_profile_defaults(&mut id, "example.com");
        assert_eq!(id.display_name, "carol");
    }

    #[test]
    fn test_defaults_are_idempotent() {
        let mut once = identity("dave", "", "");
        apply_profile_defaults(&mut once, "example.com");
        let mut twice = once.clone();
        apply_profile_defaults(&mut twice, "other.example");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_from_principal() {
        let id = CanonicalIdentity::from_principal("alice");
        assert_eq!(id.username, "alice");
        assert_eq!(id.display_name, "alice");
        assert!(id.email.is_empty());
        assert!(id.department.is_none());
    }
}
