use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Create the SQLite pool and ensure the schema exists.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    init_schema(&pool).await?;
    Ok(pool)
}

async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Characters are embedded in the anime row as a JSON array; `version`
    // backs the optimistic per-character update loop.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS anime (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            source_id TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            characters TEXT NOT NULL DEFAULT '[]',
            version INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    // TTL key/value entries for the profile cache and orchestration locks.
    // The primary-key constraint is what makes lock acquisition atomic.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_entry (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            expires_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_kv_entry_expires_at ON kv_entry(expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}
