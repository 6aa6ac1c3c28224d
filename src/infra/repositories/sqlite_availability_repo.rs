use crate::domain::{
    models::{audit::AuditLog, availability::AvailabilityBlock},
    ports::AvailabilityRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteAvailabilityRepo {
    pool: SqlitePool,
}

impl SqliteAvailabilityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepo {
    async fn list(&self, team_id: &str) -> Result<Vec<AvailabilityBlock>, AppError> {
        sqlx::query_as::<_, AvailabilityBlock>(
            "SELECT * FROM availability_blocks WHERE team_id = ? ORDER BY day_of_week ASC, start_time ASC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn list_active(&self, team_id: &str) -> Result<Vec<AvailabilityBlock>, AppError> {
        sqlx::query_as::<_, AvailabilityBlock>(
            "SELECT * FROM availability_blocks WHERE team_id = ? AND active = 1 ORDER BY day_of_week ASC, start_time ASC",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn list_active_for_day(&self, team_id: &str, day_of_week: i64) -> Result<Vec<AvailabilityBlock>, AppError> {
        sqlx::query_as::<_, AvailabilityBlock>(
            "SELECT * FROM availability_blocks WHERE team_id = ? AND day_of_week = ? AND active = 1 ORDER BY start_time ASC",
        )
        .bind(team_id)
        .bind(day_of_week)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn replace_all(
        &self,
        team_id: &str,
        blocks: &[AvailabilityBlock],
        audit: &AuditLog,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Reconcile by id: anything the client no longer sends is gone.
        if blocks.is_empty() {
            sqlx::query("DELETE FROM availability_blocks WHERE team_id = ?")
                .bind(team_id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
        } else {
            let placeholders = vec!["?"; blocks.len()].join(", ");
            let sql = format!(
                "DELETE FROM availability_blocks WHERE team_id = ? AND id NOT IN ({})",
                placeholders
            );
            let mut query = sqlx::query(&sql).bind(team_id);
            for block in blocks {
                query = query.bind(&block.id);
            }
            query.execute(&mut *tx).await.map_err(AppError::Database)?;
        }

        for block in blocks {
            sqlx::query(
                "INSERT INTO availability_blocks (id, team_id, day_of_week, start_time, end_time, active)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     day_of_week = excluded.day_of_week,
                     start_time = excluded.start_time,
                     end_time = excluded.end_time,
                     active = excluded.active",
            )
            .bind(&block.id)
            .bind(team_id)
            .bind(block.day_of_week)
            .bind(&block.start_time)
            .bind(&block.end_time)
            .bind(block.active)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;
        }

        sqlx::query(
            "INSERT INTO audit_logs (id, team_id, actor_user_id, booking_id, action, details, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&audit.id)
        .bind(&audit.team_id)
        .bind(&audit.actor_user_id)
        .bind(&audit.booking_id)
        .bind(&audit.action)
        .bind(&audit.details)
        .bind(audit.created_at)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)
    }
}
