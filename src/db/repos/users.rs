use async_trait::async_trait;

use crate::{
    db::error::DbResult,
    models::{CreateUser, LocalUser, UpdateUserProfile},
};

/// Local user store.
///
/// Implementations must reject a second `create` for an existing username
/// with [`DbError::Conflict`](crate::db::DbError::Conflict) instead of
/// writing a duplicate record; concurrent first logins rely on it.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create(&self, input: CreateUser) -> DbResult<LocalUser>;
    async fn get_by_username(&self, username: &str) -> DbResult<Option<LocalUser>>;
    /// Overwrite email and display name. Fails with `NotFound` for unknown users.
    async fn update_profile(&self, username: &str, input: UpdateUserProfile) -> DbResult<()>;
}
