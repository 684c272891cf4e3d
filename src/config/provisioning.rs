use serde::{Deserialize, Deserializer, Serialize};

use super::ConfigError;

/// Default values written when a user is provisioned from the passport IdP.
///
/// Provisioned users always get [`Role::User`](crate::models::Role::User)
/// with the admin flag unset; promotion is left to the host platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvisioningConfig {
    /// Domain used to synthesize an email address for users whose
    /// username is not already an address.
    #[serde(
        default = "default_organization_domain",
        deserialize_with = "deserialize_trimmed"
    )]
    pub organization_domain: String,

    /// Value stored in the local password column. Authentication is always
    /// delegated to the IdP, so this is a fixed non-secret placeholder.
    #[serde(default = "default_placeholder_password")]
    pub placeholder_password: String,

    /// Provenance marker stored on provisioned users.
    #[serde(default = "default_comment")]
    pub comment: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            organization_domain: default_organization_domain(),
            placeholder_password: default_placeholder_password(),
            comment: default_comment(),
        }
    }
}

fn deserialize_trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}

fn default_organization_domain() -> String {
    "iflytek.com".to_string()
}

fn default_placeholder_password() -> String {
    "12345678AbC".to_string()
}

fn default_comment() -> String {
    "from passport.".to_string()
}

impl ProvisioningConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        let domain = self.organization_domain.trim();
        if domain.is_empty() {
            return Err(ConfigError::Validation(
                "provisioning.organization_domain cannot be empty".into(),
            ));
        }
        if domain.contains('@') {
            return Err(ConfigError::Validation(format!(
                "provisioning.organization_domain must be a bare domain, got '{}'",
                self.organization_domain
            )));
        }
        if self.placeholder_password.is_empty() {
            return Err(ConfigError::Validation(
                "provisioning.placeholder_password cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ProvisioningConfig::default().validate().is_ok());
    }

    #[test]
    fn test_domain_with_at_rejected() {
        let config = ProvisioningConfig {
            organization_domain: "@example.com".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bare domain"));
    }

    #[test]
    fn test_empty_placeholder_rejected() {
        let config = ProvisioningConfig {
            placeholder_password: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_role_is_not_configurable() {
        let result = toml::from_str::<ProvisioningConfig>(r#"default_role = "admin""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_domain_is_trimmed() {
        let config: ProvisioningConfig =
            toml::from_str(r#"organization_domain = "  corp.example ""#).unwrap();
        assert_eq!(config.organization_domain, "corp.example");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_domain_rejected() {
        let config: ProvisioningConfig = toml::from_str(r#"organization_domain = "   ""#).unwrap();
        assert!(config.validate().is_err());
    }
}
