mod error;
mod memory;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;

#[cfg(test)]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use memory::MemoryUserRepo;
pub use repos::*;

use crate::config::DatabaseConfig;

/// Build the user store described by the configuration.
///
/// SQLite stores are migrated here when `run_migrations` is set.
pub async fn create_user_repo(config: &DatabaseConfig) -> DbResult<Arc<dyn UserRepo>> {
    match config {
        DatabaseConfig::Memory => {
            tracing::warn!("Using in-memory user store. Provisioned users are lost on restart.");
            Ok(Arc::new(MemoryUserRepo::new()))
        }
        #[cfg(feature = "database-sqlite")]
        DatabaseConfig::Sqlite(cfg) => {
            let pool = sqlx::sqlite::SqlitePoolOptions::new()
                .max_connections(cfg.max_connections)
                .connect_with(
                    sqlx::sqlite::SqliteConnectOptions::new()
                        .filename(&cfg.path)
                        .create_if_missing(cfg.create_if_missing)
                        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                        .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms)),
                )
                .await?;

            if cfg.run_migrations {
                run_sqlite_migrations(&pool).await?;
            }

            Ok(Arc::new(sqlite::SqliteUserRepo::new(pool)))
        }
    }
}

/// Run database migrations using sqlx's migration runner.
/// This automatically creates and manages a _sqlx_migrations table.
#[cfg(feature = "database-sqlite")]
pub async fn run_sqlite_migrations(pool: &sqlx::SqlitePool) -> DbResult<()> {
    tracing::info!("Running SQLite migrations");
    sqlx::migrate!("./migrations_sqlx/sqlite").run(pool).await?;
    tracing::info!("SQLite migrations completed successfully");
    Ok(())
}
