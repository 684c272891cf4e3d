use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Role of a local user.
///
/// Provisioned users always start with the lowest-privilege role; promotion
/// happens through the host platform, never through the IdP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user as recorded in the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Display name
    pub realname: String,
    /// Always the provisioning placeholder, never a real credential.
    #[serde(skip_serializing)]
    pub password: String,
    /// Provenance marker
    pub comment: String,
    pub role: Role,
    /// Never sourced from the IdP.
    pub has_admin_role: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 255))]
    pub username: String,
    #[validate(length(min = 1, max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub realname: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub comment: String,
    pub role: Role,
    pub has_admin_role: bool,
}

/// Profile fields refreshed from the IdP on every successful login.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserProfile {
    #[validate(length(min = 1, max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 255))]
    pub realname: String,
}
