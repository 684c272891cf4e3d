use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{CanonicalIdentity, apply_profile_defaults},
    config::ProvisioningConfig,
    db::{DbError, UserRepo},
    models::{CreateUser, LocalUser, Role, UpdateUserProfile},
};

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("Invalid user record: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] DbError),
}

/// Creates local accounts for first-time passport users and keeps the
/// profile of returning users in sync with the IdP.
#[derive(Clone)]
pub struct UserProvisioner {
    repo: Arc<dyn UserRepo>,
    policy: ProvisioningConfig,
}

impl UserProvisioner {
    pub fn new(repo: Arc<dyn UserRepo>, policy: ProvisioningConfig) -> Self {
        Self { repo, policy }
    }

    /// Look up a local user by exact username.
    pub async fn search(&self, username: &str) -> Result<Option<LocalUser>, ProvisionError> {
        Ok(self.repo.get_by_username(username).await?)
    }

    /// Create a local account for an identity that has none yet.
    ///
    /// The stored password is the configured placeholder; the passport
    /// secret never reaches the local store. A concurrent onboarding of
    /// the same username surfaces as `Store(DbError::Conflict)`.
    pub async fn onboard(&self, identity: &CanonicalIdentity) -> Result<LocalUser, ProvisionError> {
        let mut identity = identity.clone();
        apply_profile_defaults(&mut identity, &self.policy.organization_domain);

        let input = CreateUser {
            username: identity.username,
            email: identity.email,
            realname: identity.display_name,
            password: self.policy.placeholder_password.clone(),
            comment: self.policy.comment.clone(),
            role: Role::User,
            has_admin_role: false,
        };
        input
            .validate()
            .map_err(|e| ProvisionError::Validation(e.to_string()))?;

        let user = self.repo.create(input).await?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            role = %user.role,
            "Onboarded passport user"
        );

        Ok(user)
    }

    /// Bring the local record for `identity` up to date, creating it on
    /// first login.
    ///
    /// Returning users keep their id, role and admin flag; only email and
    /// display name are refreshed, and a failed refresh is logged rather
    /// than failing the login.
    pub async fn reconcile(&self, identity: &CanonicalIdentity) -> Result<LocalUser, ProvisionError> {
        let mut user = match self.repo.get_by_username(&identity.username).await? {
            Some(user) => user,
            None => match self.onboard(identity).await {
                Ok(user) => return Ok(user),
                Err(ProvisionError::Store(DbError::Conflict(_))) => {
                    // Lost the race against a concurrent first login.
                    tracing::debug!(
                        username = %identity.username,
                        "User created concurrently, using existing record"
                    );
                    self.repo
                        .get_by_username(&identity.username)
                        .await?
                        .ok_or_else(|| {
                            ProvisionError::Store(DbError::Internal(format!(
                                "User {} disappeared after conflict",
                                identity.username
                            )))
                        })?
                }
                Err(e) => return Err(e),
            },
        };

        self.refresh_profile(&mut user, identity).await;
        Ok(user)
    }

    /// Best-effort copy of the IdP profile onto an existing record.
    async fn refresh_profile(&self, user: &mut LocalUser, identity: &CanonicalIdentity) {
        let mut refreshed = identity.clone();
        apply_profile_defaults(&mut refreshed, &self.policy.organization_domain);

        let update = UpdateUserProfile {
            email: refreshed.email,
            realname: refreshed.display_name,
        };

        if let Err(e) = update.validate() {
            tracing::warn!(
                error = %e,
                username = %user.username,
                "Passport profile failed validation, keeping stored profile"
            );
            return;
        }

        match self.repo.update_profile(&user.username, update.clone()).await {
            Ok(()) => {
                user.email = update.email;
                user.realname = update.realname;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    username = %user.username,
                    "Failed to refresh user profile from passport"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::db::{DbResult, MemoryUserRepo};

    fn policy() -> ProvisioningConfig {
        ProvisioningConfig {
            organization_domain: "corp.example".into(),
            placeholder_password: "placeholder-1".into(),
            comment: "from passport.".into(),
        }
    }

    fn identity(username: &str, email: &str, display_name: &str) -> CanonicalIdentity {
        CanonicalIdentity {
            username: username.into(),
            email: email.into(),
            display_name: display_name.into(),
            department: None,
        }
    }

    /// Store whose profile updates always fail.
    struct ReadOnlyProfiles(MemoryUserRepo);

    #[async_trait]
    impl UserRepo for ReadOnlyProfiles {
        async fn create(&self, input: CreateUser) -> DbResult<LocalUser> {
            self.0.create(input).await
        }

        async fn get_by_username(&self, username: &str) -> DbResult<Option<LocalUser>> {
            self.0.get_by_username(username).await
        }

        async fn update_profile(&self, _username: &str, _input: UpdateUserProfile) -> DbResult<()> {
            Err(DbError::Internal("store is read-only".into()))
        }
    }

    /// Store whose first lookup misses a record another login already created.
    struct StaleFirstLookup {
        inner: MemoryUserRepo,
        missed: AtomicBool,
    }

    #[async_trait]
    impl UserRepo for StaleFirstLookup {
        async fn create(&self, input: CreateUser) -> DbResult<LocalUser> {
            self.inner.create(input).await
        }

        async fn get_by_username(&self, username: &str) -> DbResult<Option<LocalUser>> {
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.get_by_username(username).await
        }

        async fn update_profile(&self, username: &str, input: UpdateUserProfile) -> DbResult<()> {
            self.inner.update_profile(username, input).await
        }
    }

    #[tokio::test]
    async fn test_onboard_synthesizes_email_and_uses_placeholder() {
        let repo = Arc::new(MemoryUserRepo::new());
        let provisioner = UserProvisioner::new(repo.clone(), policy());

        let user = provisioner.onboard(&identity("bob", "", "")).await.unwrap();

        assert_eq!(user.username, "bob");
        assert_eq!(user.email, "bob@corp.example");
        assert_eq!(user.realname, "bob");
        assert_eq!(user.password, "placeholder-1");
        assert_eq!(user.comment, "from passport.");
        assert_eq!(user.role, Role::User);
        assert!(!user.has_admin_role);
    }

    #[tokio::test]
    async fn test_onboard_username_already_an_address() {
        let provisioner = UserProvisioner::new(Arc::new(MemoryUserRepo::new()), policy());
        let user = provisioner
            .onboard(&identity("bob@partner.example", "", "Bob"))
            .await
            .unwrap();
        assert_eq!(user.email, "bob@partner.example");
    }

    #[tokio::test]
    async fn test_onboard_duplicate_is_conflict() {
        let provisioner = UserProvisioner::new(Arc::new(MemoryUserRepo::new()), policy());
        provisioner.onboard(&identity("bob", "", "")).await.unwrap();

        let err = provisioner.onboard(&identity("bob", "", "")).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Store(DbError::Conflict(_))), "got {err:?}");
    }

    #[tokio::test]
    async fn test_onboard_rejects_oversized_username() {
        let provisioner = UserProvisioner::new(Arc::new(MemoryUserRepo::new()), policy());
        let err = provisioner
            .onboard(&identity(&"x".repeat(300), "x@corp.example", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_reconcile_twice_creates_one_record() {
        let repo = Arc::new(MemoryUserRepo::new());
        let provisioner = UserProvisioner::new(repo.clone(), policy());

        let first = provisioner
            .reconcile(&identity("u", "e@corp.example", "n"))
            .await
            .unwrap();
        let second = provisioner
            .reconcile(&identity("u", "e@corp.example", "n"))
            .await
            .unwrap();

        assert_eq!(repo.len(), 1);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_reconcile_refreshes_profile_and_keeps_local_fields() {
        let repo = Arc::new(MemoryUserRepo::new());
        repo.create(CreateUser {
            username: "alice".into(),
            email: "old@corp.example".into(),
            realname: "Old Name".into(),
            password: "placeholder-1".into(),
            comment: "from passport.".into(),
            role: Role::Admin,
            has_admin_role: true,
        })
        .await
        .unwrap();
        let provisioner = UserProvisioner::new(repo.clone(), policy());

        let user = provisioner
            .reconcile(&identity("alice", "alice@corp.example", "Alice"))
            .await
            .unwrap();

        assert_eq!(user.email, "alice@corp.example");
        assert_eq!(user.realname, "Alice");
        assert_eq!(user.role, Role::Admin);
        assert!(user.has_admin_role);

        let stored = repo.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.email, "alice@corp.example");
        assert_eq!(stored.realname, "Alice");
        assert_eq!(stored.id, user.id);
    }

    #[tokio::test]
    async fn test_reconcile_direct_flow_identity_fills_defaults() {
        let repo = Arc::new(MemoryUserRepo::new());
        let provisioner = UserProvisioner::new(repo.clone(), policy());

        provisioner
            .reconcile(&CanonicalIdentity::from_principal("carol"))
            .await
            .unwrap();
        let user = provisioner
            .reconcile(&CanonicalIdentity::from_principal("carol"))
            .await
            .unwrap();

        assert_eq!(user.email, "carol@corp.example");
        assert_eq!(user.realname, "carol");
    }

    #[tokio::test]
    async fn test_reconcile_update_failure_is_not_fatal() {
        let inner = MemoryUserRepo::new();
        inner
            .create(CreateUser {
                username: "dave".into(),
                email: "old@corp.example".into(),
                realname: "Dave".into(),
                password: "placeholder-1".into(),
                comment: String::new(),
                role: Role::User,
                has_admin_role: false,
            })
            .await
            .unwrap();
        let provisioner = UserProvisioner::new(Arc::new(ReadOnlyProfiles(inner)), policy());

        let user = provisioner
            .reconcile(&identity("dave", "new@corp.example", "David"))
            .await
            .unwrap();

        assert_eq!(user.username, "dave");
        assert_eq!(user.email, "old@corp.example");
    }

    #[tokio::test]
    async fn test_reconcile_resolves_creation_race() {
        let inner = MemoryUserRepo::new();
        let existing = inner
            .create(CreateUser {
                username: "erin".into(),
                email: "erin@old.example".into(),
                realname: "E.".into(),
                password: "placeholder-1".into(),
                comment: String::new(),
                role: Role::User,
                has_admin_role: false,
            })
            .await
            .unwrap();
        let repo = Arc::new(StaleFirstLookup {
            inner: inner.clone(),
            missed: AtomicBool::new(false),
        });
        let provisioner = UserProvisioner::new(repo, policy());

        let user = provisioner
            .reconcile(&identity("erin", "erin@corp.example", "Erin"))
            .await
            .unwrap();

        assert_eq!(user.id, existing.id);
        assert_eq!(user.email, "erin@corp.example");
        assert_eq!(user.realname, "Erin");
        assert_eq!(inner.len(), 1);

        let stored = inner.get_by_username("erin").await.unwrap().unwrap();
        assert_eq!(stored.email, "erin@corp.example");
        assert_eq!(stored.realname, "Erin");
    }

    #[tokio::test]
    async fn test_reconcile_skips_oversized_profile() {
        let repo = Arc::new(MemoryUserRepo::new());
        let provisioner = UserProvisioner::new(repo.clone(), policy());
        provisioner
            .reconcile(&identity("gina", "gina@corp.example", "Gina"))
            .await
            .unwrap();

        let user = provisioner
            .reconcile(&identity("gina", "gina@corp.example", &"G".repeat(300)))
            .await
            .unwrap();

        assert_eq!(user.realname, "Gina");
        let stored = repo.get_by_username("gina").await.unwrap().unwrap();
        assert_eq!(stored.realname, "Gina");
    }

    #[tokio::test]
    async fn test_onboard_always_lowest_privilege() {
        let provisioner = UserProvisioner::new(Arc::new(MemoryUserRepo::new()), policy());
        let user = provisioner
            .onboard(&CanonicalIdentity::from_principal("hank"))
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);
        assert!(!user.has_admin_role);
    }

    #[tokio::test]
    async fn test_padded_domain_from_config_yields_clean_email() {
        let config = crate::config::PassportConfig::from_str(
            r#"
            [idp]
            endpoint = "passport.example.com"

            [provisioning]
            organization_domain = " corp.example "
            "#,
        )
        .unwrap();
        let provisioner =
            UserProvisioner::new(Arc::new(MemoryUserRepo::new()), config.provisioning);

        let user = provisioner
            .onboard(&CanonicalIdentity::from_principal("ivy"))
            .await
            .unwrap();
        assert_eq!(user.email, "ivy@corp.example");
    }

    #[tokio::test]
    async fn test_search_exact_match() {
        let provisioner = UserProvisioner::new(Arc::new(MemoryUserRepo::new()), policy());
        provisioner.onboard(&identity("frank", "", "")).await.unwrap();

        assert!(provisioner.search("frank").await.unwrap().is_some());
        assert!(provisioner.search("fran").await.unwrap().is_none());
        assert!(provisioner.search("Frank").await.unwrap().is_none());
    }
}
