use std::{path::Path, str::FromStr, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{
    query,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
};

use crate::domain::ClassificationResult;

pub mod ratings;

pub use ratings::{NullScoreCache, SqliteScoreCache};

/// Persistent fingerprint → result store. Implementations swallow their own
/// failures: a failed read is a miss, a failed write is lost.
#[async_trait]
pub trait ScoreCache: Send + Sync {
    async fn get(&self, fingerprint: &str) -> Option<ClassificationResult>;
    async fn put(&self, fingerprint: &str, result: &ClassificationResult);
    async fn close(&self) {}
}

pub async fn init_pool(db_path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

pub(crate) async fn create_schema(pool: &SqlitePool) -> Result<()> {
    query(
        r#"
        CREATE TABLE IF NOT EXISTS ratings (
            fingerprint TEXT PRIMARY KEY,
            score INTEGER NOT NULL,
            note TEXT NOT NULL DEFAULT '',
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
