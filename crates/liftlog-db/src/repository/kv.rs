//! # Key-Value Repository
//!
//! JSON documents stored under string keys. Every typed repository in this
//! crate is a thin layer over this one.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for raw key-value operations.
#[derive(Debug, Clone)]
pub struct KvRepository {
    pool: SqlitePool,
}

impl KvRepository {
    /// Creates a new KvRepository.
    pub fn new(pool: SqlitePool) -> Self {
        KvRepository { pool }
    }

    /// Reads the raw JSON text under `key`.
    pub async fn get_raw(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Reads and decodes the value under `key`.
    ///
    /// ## Returns
    /// * `Ok(None)` - Nothing stored
    /// * `Err(DbError::Decode)` - Stored JSON doesn't fit `T`
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        match self.get_raw(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| DbError::decode(key, e)),
            None => Ok(None),
        }
    }

    /// Encodes and upserts `value` under `key`. The write is durable once
    /// this returns.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> DbResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| DbError::encode(key, e))?;

        debug!(key = %key, bytes = raw.len(), "Writing value");

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(raw)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Merges the JSON object `patch` into the object under `key` in one
    /// statement (RFC 7396 `json_patch`). Top-level members of `patch`
    /// replace the stored ones; other members are kept. Concurrent merges
    /// of different members never overwrite each other.
    pub async fn merge_json<T: Serialize + ?Sized>(&self, key: &str, patch: &T) -> DbResult<()> {
        let raw = serde_json::to_string(patch).map_err(|e| DbError::encode(key, e))?;

        debug!(key = %key, bytes = raw.len(), "Merging value");

        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, json(?2), ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = json_patch(kv_store.value, excluded.value),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(raw)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes `key`. Returns whether anything was removed.
    pub async fn delete(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(key = %key, removed = result.rows_affected(), "Deleted value");
        Ok(result.rows_affected() > 0)
    }

    /// Returns whether `key` holds a value.
    pub async fn contains(&self, key: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// All stored keys, sorted.
    pub async fn keys(&self) -> DbResult<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(keys)
    }

    /// Wipes the whole store. Returns the number of removed keys.
    pub async fn clear_all(&self) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM kv_store").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        reps: u32,
    }

    #[tokio::test]
    async fn test_set_get_overwrite_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        assert_eq!(kv.get_json::<Doc>("doc").await.unwrap(), None);

        kv.set_json("doc", &Doc { name: "a".into(), reps: 1 }).await.unwrap();
        kv.set_json("doc", &Doc { name: "b".into(), reps: 2 }).await.unwrap();

        let doc: Option<Doc> = kv.get_json("doc").await.unwrap();
        assert_eq!(doc, Some(Doc { name: "b".into(), reps: 2 }));
        assert!(kv.contains("doc").await.unwrap());

        assert!(kv.delete("doc").await.unwrap());
        assert!(!kv.delete("doc").await.unwrap());
        assert!(!kv.contains("doc").await.unwrap());
    }

    #[tokio::test]
    async fn test_decode_error_names_key() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        kv.set_json("doc", "not a doc").await.unwrap();

        match kv.get_json::<Doc>("doc").await {
            Err(DbError::Decode { key, .. }) => assert_eq!(key, "doc"),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_merge_json_replaces_members_and_keeps_the_rest() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        kv.merge_json("doc", &serde_json::json!({ "a": [1, 2] })).await.unwrap();
        kv.merge_json("doc", &serde_json::json!({ "b": [3] })).await.unwrap();
        kv.merge_json("doc", &serde_json::json!({ "a": [9] })).await.unwrap();

        let doc: serde_json::Value = kv.get_json("doc").await.unwrap().unwrap();
        assert_eq!(doc, serde_json::json!({ "a": [9], "b": [3] }));
    }

    #[tokio::test]
    async fn test_clear_all() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let kv = db.kv();

        kv.set_json("a", &1).await.unwrap();
        kv.set_json("b", &2).await.unwrap();
        assert_eq!(kv.keys().await.unwrap(), vec!["a".to_string(), "b".to_string()]);

        assert_eq!(kv.clear_all().await.unwrap(), 2);
        assert!(kv.keys().await.unwrap().is_empty());
    }
}
