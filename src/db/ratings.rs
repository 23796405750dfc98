use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, sqlite::SqlitePool};

use super::ScoreCache;
use crate::domain::ClassificationResult;

#[derive(Clone)]
pub struct SqliteScoreCache {
    pool: SqlitePool,
}

impl SqliteScoreCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[cfg(test)]
    pub async fn count(&self) -> anyhow::Result<i64> {
        let (count,): (i64,) = query_as(r#"SELECT COUNT(*) FROM ratings"#)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ScoreCache for SqliteScoreCache {
    async fn get(&self, fingerprint: &str) -> Option<ClassificationResult> {
        let row: Result<Option<(i64, String)>, _> =
            query_as(r#"SELECT score, note FROM ratings WHERE fingerprint = ?1"#)
                .bind(fingerprint)
                .fetch_optional(&self.pool)
                .await;
        match row {
            Ok(Some((score, note))) => {
                tracing::debug!(target: "db", fingerprint, score, "cache hit");
                Some(ClassificationResult::new(score, note))
            }
            Ok(None) => None,
            Err(err) => {
                tracing::error!(target: "db", error = %err, fingerprint, "cache read failed");
                None
            }
        }
    }

    async fn put(&self, fingerprint: &str, result: &ClassificationResult) {
        let outcome = query(
            r#"INSERT OR REPLACE INTO ratings (fingerprint, score, note, updated_at)
                VALUES (?1, ?2, ?3, ?4)"#,
        )
        .bind(fingerprint)
        .bind(result.score as i64)
        .bind(result.note.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await;
        if let Err(err) = outcome {
            tracing::error!(target: "db", error = %err, fingerprint, "cache write failed");
        }
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Stand-in used when the cache database cannot be opened. Every comment is
/// classified again each time it reappears.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScoreCache;

#[async_trait]
impl ScoreCache for NullScoreCache {
    async fn get(&self, _fingerprint: &str) -> Option<ClassificationResult> {
        None
    }

    async fn put(&self, _fingerprint: &str, _result: &ClassificationResult) {}
}
