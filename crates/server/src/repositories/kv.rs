use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::time::Duration;

use enrichment::{EnrichmentError, TtlStore};

pub struct KvRepository;

impl KvRepository {
    /// Get a live value; expired rows read as absent until swept.
    pub async fn get(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM kv_entry WHERE key = $1 AND expires_at > $2")
                .bind(key)
                .bind(Utc::now())
                .fetch_optional(pool)
                .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Insert or replace an entry.
    pub async fn put(
        pool: &SqlitePool,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO kv_entry (key, value, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Atomic insert-if-no-live-entry. The primary-key conflict clause only
    /// takes over rows whose TTL has lapsed, so two concurrent callers
    /// cannot both win.
    pub async fn put_if_absent(
        pool: &SqlitePool,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO kv_entry (key, value, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            WHERE kv_entry.expires_at <= $4
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, key: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM kv_entry WHERE key = $1")
            .bind(key)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Remove expired rows; space reclamation only.
    pub async fn sweep_expired(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM kv_entry WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

/// [`TtlStore`] implementation over the SQLite kv table, shared by the
/// profile cache and the orchestration locks.
pub struct SqliteTtlStore {
    pool: SqlitePool,
}

impl SqliteTtlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn expiry(ttl: Duration) -> Result<DateTime<Utc>, EnrichmentError> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| EnrichmentError::Store(format!("ttl out of range: {}", e)))?;
    Ok(Utc::now() + ttl)
}

#[async_trait]
impl TtlStore for SqliteTtlStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EnrichmentError> {
        KvRepository::get(&self.pool, key)
            .await
            .map_err(|e| EnrichmentError::Store(e.to_string()))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), EnrichmentError> {
        KvRepository::put(&self.pool, key, value, expiry(ttl)?)
            .await
            .map_err(|e| EnrichmentError::Store(e.to_string()))
    }

    async fn put_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, EnrichmentError> {
        KvRepository::put_if_absent(&self.pool, key, value, expiry(ttl)?)
            .await
            .map_err(|e| EnrichmentError::Store(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), EnrichmentError> {
        KvRepository::delete(&self.pool, key)
            .await
            .map_err(|e| EnrichmentError::Store(e.to_string()))
    }

    async fn sweep_expired(&self) -> Result<u64, EnrichmentError> {
        KvRepository::sweep_expired(&self.pool)
            .await
            .map_err(|e| EnrichmentError::Store(e.to_string()))
    }
}
