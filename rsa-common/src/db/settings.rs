//! Settings table accessors
//!
//! Key-value rows in `settings`. Values are stored as text and parsed on read.

use crate::{Error, Result};
use sqlx::{Pool, Sqlite};

/// Read a setting, parsing it into `T`
///
/// **Returns:** Some(value) if the key exists, None otherwise
pub async fn get_setting<T>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match row {
        Some((value,)) => {
            let parsed = value
                .parse::<T>()
                .map_err(|e| Error::Config(format!("Parse setting {} failed: {}", key, e)))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

/// Insert or replace a setting
pub async fn set_setting<T>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()>
where
    T: std::fmt::Display,
{
    sqlx::query(
        "INSERT INTO settings (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

/// Remove a setting. Removing a missing key is not an error.
///
/// **Returns:** true if a row was deleted
pub async fn delete_setting(db: &Pool<Sqlite>, key: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM settings WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    /// Single connection so every query sees the same in-memory database
    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::create_settings_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_get_missing_setting() {
        let pool = setup_test_db().await;
        let value: Option<String> = get_setting(&pool, "nope").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_then_update_keeps_single_row() {
        let pool = setup_test_db().await;

        set_setting(&pool, "greeting", "hello").await.unwrap();
        set_setting(&pool, "greeting", "bonjour").await.unwrap();

        let value: Option<String> = get_setting(&pool, "greeting").await.unwrap();
        assert_eq!(value, Some("bonjour".to_string()));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = 'greeting'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1, "Should have exactly one entry after update");
    }

    #[tokio::test]
    async fn test_parsed_numeric_setting() {
        let pool = setup_test_db().await;
        set_setting(&pool, "port", 5780u16).await.unwrap();
        let value: Option<u16> = get_setting(&pool, "port").await.unwrap();
        assert_eq!(value, Some(5780));
    }

    #[tokio::test]
    async fn test_unparseable_setting_is_config_error() {
        let pool = setup_test_db().await;
        set_setting(&pool, "port", "not-a-number").await.unwrap();
        let result: Result<Option<u16>> = get_setting(&pool, "port").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_delete_setting() {
        let pool = setup_test_db().await;
        set_setting(&pool, "token", "abc").await.unwrap();

        assert!(delete_setting(&pool, "token").await.unwrap());
        assert!(!delete_setting(&pool, "token").await.unwrap());

        let value: Option<String> = get_setting(&pool, "token").await.unwrap();
        assert_eq!(value, None);
    }
}
