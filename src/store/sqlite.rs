use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::store::{KeyValueStore, StoreError, StoreResult};

/// SQLite-backed key-value store.
///
/// Each key holds one row; the visit log occupies a single row whose value
/// is the whole serialized blob, so writes stay atomic at the entry level.
pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(|e| StoreError::Other(e.into()))?;

        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let updated_at = chrono::Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Other(e.into()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_replaces_value() {
        let store = SqliteStore::new("sqlite::memory:", 5).await.unwrap();
        store.init().await.unwrap();

        assert!(store.get("analytics").await.unwrap().is_none());

        store.put("analytics", "{}").await.unwrap();
        store.put("analytics", r#"{"pageViews":[]}"#).await.unwrap();

        assert_eq!(
            store.get("analytics").await.unwrap().as_deref(),
            Some(r#"{"pageViews":[]}"#)
        );
    }
}
