use std::sync::Arc;

use async_trait::async_trait;

use super::{AuthError, CanonicalIdentity, LoginRequest, PassportGateway};
use crate::{
    config::PassportConfig,
    db::UserRepo,
    models::LocalUser,
    services::UserProvisioner,
};

/// Authentication mechanism contract expected by the host platform.
///
/// The host calls `authenticate` with whatever its login surface collected,
/// then `post_authenticate` with the resulting identity to obtain the local
/// account. `on_board_user` and `search_user` back the host's own user
/// management screens.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, request: &LoginRequest) -> Result<CanonicalIdentity, AuthError>;

    async fn post_authenticate(&self, identity: &CanonicalIdentity) -> Result<LocalUser, AuthError>;

    async fn on_board_user(&self, identity: &CanonicalIdentity) -> Result<LocalUser, AuthError>;

    async fn search_user(&self, username: &str) -> Result<Option<LocalUser>, AuthError>;
}

/// Passport-backed [`Authenticator`].
pub struct PassportAuthenticator {
    gateway: PassportGateway,
    provisioner: UserProvisioner,
}

impl PassportAuthenticator {
    pub fn new(gateway: PassportGateway, provisioner: UserProvisioner) -> Self {
        Self {
            gateway,
            provisioner,
        }
    }

    /// Build the authenticator from loaded configuration and a user store.
    pub fn from_config(config: &PassportConfig, repo: Arc<dyn UserRepo>) -> Result<Self, AuthError> {
        let gateway = PassportGateway::new(&config.idp)?;
        let provisioner = UserProvisioner::new(repo, config.provisioning.clone());
        Ok(Self::new(gateway, provisioner))
    }

    /// Authenticate and reconcile in one step.
    pub async fn login(&self, request: &LoginRequest) -> Result<LocalUser, AuthError> {
        let identity = self.authenticate(request).await?;
        self.post_authenticate(&identity).await
    }
}

#[async_trait]
impl Authenticator for PassportAuthenticator {
    async fn authenticate(&self, request: &LoginRequest) -> Result<CanonicalIdentity, AuthError> {
        let Some(credential) = request.credential() else {
            tracing::debug!(
                principal = %request.principal,
                "Login request carries neither a session token nor a principal and password"
            );
            return Err(AuthError::InvalidCredentials);
        };

        let flow = credential.flow();
        match self.gateway.authenticate(&credential).await {
            Ok(identity) => {
                tracing::info!(
                    flow = flow.as_str(),
                    username = %identity.username,
                    "Passport authentication succeeded"
                );
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(flow = flow.as_str(), code = e.code(), "Passport authentication failed");
                Err(e)
            }
        }
    }

    async fn post_authenticate(&self, identity: &CanonicalIdentity) -> Result<LocalUser, AuthError> {
        Ok(self.provisioner.reconcile(identity).await?)
    }

    async fn on_board_user(&self, identity: &CanonicalIdentity) -> Result<LocalUser, AuthError> {
        Ok(self.provisioner.onboard(identity).await?)
    }

    async fn search_user(&self, username: &str) -> Result<Option<LocalUser>, AuthError> {
        Ok(self.provisioner.search(username).await?)
    }
}
