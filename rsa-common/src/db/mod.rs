//! SQLite access shared by RSA services
//!
//! The services only persist small key-value settings, so the schema is a
//! single `settings` table created on first connect.

pub mod settings;

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open (or create) the database and ensure the schema exists
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mode=rwc: read, write, create
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    create_settings_table(&pool).await?;

    Ok(pool)
}

/// Create the `settings` key-value table if missing
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
