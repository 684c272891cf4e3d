//! Process-local user store.
//!
//! Backed by a `DashMap` keyed by username. Insert-if-absent goes through the
//! entry API so concurrent first logins for the same username see exactly one
//! success and one `Conflict`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

use super::{
    error::{DbError, DbResult},
    repos::UserRepo,
};
use crate::models::{CreateUser, LocalUser, UpdateUserProfile};

#[derive(Clone, Default)]
pub struct MemoryUserRepo {
    users: Arc<DashMap<String, LocalUser>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, input: CreateUser) -> DbResult<LocalUser> {
        match self.users.entry(input.username.clone()) {
            Entry::Occupied(_) => Err(DbError::Conflict(format!(
                "User with username '{}' already exists",
                input.username
            ))),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = LocalUser {
                    id: Uuid::new_v4(),
                    username: input.username,
                    email: input.email,
                    realname: input.realname,
                    password: input.password,
                    comment: input.comment,
                    role: input.role,
                    has_admin_role: input.has_admin_role,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(user.clone());
                Ok(user)
            }
        }
    }

    async fn get_by_username(&self, username: &str) -> DbResult<Option<LocalUser>> {
        Ok(self.users.get(username).map(|entry| entry.value().clone()))
    }

    async fn update_profile(&self, username: &str, input: UpdateUserProfile) -> DbResult<()> {
        let mut user = self.users.get_mut(username).ok_or(DbError::NotFound)?;
        user.email = input.email;
        user.realname = input.realname;
        user.updated_at = Utc::now();
        Ok(())
    }
}
