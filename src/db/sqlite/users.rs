use async_trait::async_trait;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::UserRepo,
    },
    models::{CreateUser, LocalUser, Role, UpdateUserProfile},
};

pub struct SqliteUserRepo {
    pool: SqlitePool,
}

impl SqliteUserRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &SqliteRow) -> DbResult<LocalUser> {
        let role: String = row.get("role");
        Ok(LocalUser {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            username: row.get("username"),
            email: row.get("email"),
            realname: row.get("realname"),
            password: row.get("password"),
            comment: row.get("comment"),
            role: Role::parse(&role)
                .ok_or_else(|| DbError::Internal(format!("Invalid role in database: {}", role)))?,
            has_admin_role: row.get("has_admin_role"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl UserRepo for SqliteUserRepo {
    async fn create(&self, input: CreateUser) -> DbResult<LocalUser> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, realname, password, comment, role, has_admin_role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.realname)
        .bind(&input.password)
        .bind(&input.comment)
        .bind(input.role.as_str())
        .bind(input.has_admin_role)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DbError::Conflict(format!(
                    "User with username '{}' already exists",
                    input.username
                ))
            }
            _ => DbError::from(e),
        })?;

        Ok(LocalUser {
            id,
            username: input.username,
            email: input.email,
            realname: input.realname,
            password: input.password,
            comment: input.comment,
            role: input.role,
            has_admin_role: input.has_admin_role,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_username(&self, username: &str) -> DbResult<Option<LocalUser>> {
        let result = sqlx::query(
            r#"
            SELECT id, username, email, realname, password, comment, role, has_admin_role, created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        result.as_ref().map(Self::user_from_row).transpose()
    }

    async fn update_profile(&self, username: &str, input: UpdateUserProfile) -> DbResult<()> {
        let now = chrono::Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = ?,
                realname = ?,
                updated_at = ?
            WHERE username = ?
            "#,
        )
        .bind(&input.email)
        .bind(&input.realname)
        .bind(now)
        .bind(username)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}
