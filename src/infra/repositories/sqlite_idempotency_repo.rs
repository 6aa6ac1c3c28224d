use crate::domain::{
    models::idempotency::{IdempotencyClaim, IdempotencyRecord},
    ports::IdempotencyRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteIdempotencyRepo {
    pool: SqlitePool,
}

impl SqliteIdempotencyRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn evaluate(record: &IdempotencyRecord, handler: &str, request_hash: &str) -> IdempotencyClaim {
    if record.handler != handler || record.request_hash != request_hash {
        return IdempotencyClaim::Conflict;
    }
    match &record.response {
        Some(response) => IdempotencyClaim::Replay(response.clone()),
        None => IdempotencyClaim::Busy,
    }
}

#[async_trait]
impl IdempotencyRepository for SqliteIdempotencyRepo {
    async fn claim(
        &self,
        key: &str,
        handler: &str,
        request_hash: &str,
    ) -> Result<IdempotencyClaim, AppError> {
        let existing = sqlx::query_as::<_, IdempotencyRecord>(
            "SELECT * FROM idempotency_keys WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        if let Some(record) = existing {
            return Ok(evaluate(&record, handler, request_hash));
        }

        let inserted = sqlx::query(
            "INSERT INTO idempotency_keys (key, handler, request_hash, response, created_at)
             VALUES (?, ?, ?, NULL, ?)",
        )
        .bind(key)
        .bind(handler)
        .bind(request_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(IdempotencyClaim::Fresh),
            // Lost the unique-key race: someone else claimed between our
            // read and write. Re-read and classify their claim.
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let record = sqlx::query_as::<_, IdempotencyRecord>(
                    "SELECT * FROM idempotency_keys WHERE key = ?",
                )
                .bind(key)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::Database)?;
                Ok(evaluate(&record, handler, request_hash))
            }
            Err(err) => Err(AppError::Database(err)),
        }
    }

    async fn store_response(&self, key: &str, response: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE idempotency_keys SET response = ? WHERE key = ?")
            .bind(response)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM idempotency_keys WHERE key = ? AND response IS NULL")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}
