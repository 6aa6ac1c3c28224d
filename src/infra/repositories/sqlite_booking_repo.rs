use crate::domain::{
    models::booking::{payment_status, status, Booking, CalendarLink, Payment, PaymentConfirmation},
    ports::BookingRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// Blocking = confirmed, or pending-payment still inside its TTL.
const BLOCKING_PREDICATE: &str =
    "(status = 'CONFIRMED' OR (status = 'PENDING_PAYMENT' AND created_at >= ?))";

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create_pending(
        &self,
        booking: &Booking,
        pending_cutoff: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        // Half-open overlap check and insert in the same transaction so two
        // concurrent requests for the same slot cannot both pass.
        let sql = format!(
            "SELECT COUNT(*) FROM bookings
             WHERE team_id = ? AND start_at < ? AND end_at > ? AND {}",
            BLOCKING_PREDICATE
        );
        let conflicts: i64 = sqlx::query_scalar(&sql)
            .bind(&booking.team_id)
            .bind(booking.end_at)
            .bind(booking.start_at)
            .bind(pending_cutoff)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        if conflicts > 0 {
            return Err(AppError::SlotTaken);
        }

        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings
                 (id, team_id, customer_name, customer_email_encrypted, email_iv,
                  customer_phone_encrypted, phone_iv, start_at, end_at, status,
                  created_at, confirmed_at, cancelled_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL)
             RETURNING *",
        )
        .bind(&booking.id)
        .bind(&booking.team_id)
        .bind(&booking.customer_name)
        .bind(&booking.customer_email_encrypted)
        .bind(&booking.email_iv)
        .bind(&booking.customer_phone_encrypted)
        .bind(&booking.phone_iv)
        .bind(booking.start_at)
        .bind(booking.end_at)
        .bind(&booking.status)
        .bind(booking.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn find_by_team(&self, team_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ? AND team_id = ?")
            .bind(id)
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_team(
        &self,
        team_id: &str,
        status: Option<&str>,
        name_query: Option<&str>,
    ) -> Result<Vec<Booking>, AppError> {
        let mut sql = String::from("SELECT * FROM bookings WHERE team_id = ?");
        if status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if name_query.is_some() {
            sql.push_str(" AND customer_name LIKE ?");
        }
        sql.push_str(" ORDER BY start_at ASC");

        let mut query = sqlx::query_as::<_, Booking>(&sql).bind(team_id);
        if let Some(status) = status {
            query = query.bind(status.to_string());
        }
        if let Some(name_query) = name_query {
            query = query.bind(format!("%{}%", name_query));
        }

        query.fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn list_blocking(
        &self,
        team_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pending_cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        let sql = format!(
            "SELECT * FROM bookings
             WHERE team_id = ? AND start_at < ? AND end_at > ? AND {}
             ORDER BY start_at ASC",
            BLOCKING_PREDICATE
        );
        sqlx::query_as::<_, Booking>(&sql)
            .bind(team_id)
            .bind(end)
            .bind(start)
            .bind(pending_cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn expire_pending(&self, team_id: &str, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE bookings SET status = 'CANCELLED', cancelled_at = ?
             WHERE team_id = ? AND status = 'PENDING_PAYMENT' AND created_at < ?",
        )
        .bind(Utc::now())
        .bind(team_id)
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn mark_confirmed(&self, id: &str) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CONFIRMED', confirmed_at = ? WHERE id = ? RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn mark_cancelled(&self, id: &str) -> Result<Booking, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CANCELLED', cancelled_at = ? WHERE id = ? RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn confirm_paid(
        &self,
        id: &str,
        pending_cutoff: DateTime<Utc>,
        audit_action: &str,
    ) -> Result<PaymentConfirmation, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(booking) = booking else {
            return Ok(PaymentConfirmation::NotFound);
        };

        if booking.status == status::CONFIRMED {
            return Ok(PaymentConfirmation::AlreadyConfirmed(booking));
        }

        // Cancelled bookings and pendings past the TTL cannot be revived by
        // a late payment signal.
        if booking.status == status::CANCELLED || booking.created_at < pending_cutoff {
            if booking.status == status::PENDING_PAYMENT {
                sqlx::query(
                    "UPDATE bookings SET status = 'CANCELLED', cancelled_at = ? WHERE id = ?",
                )
                .bind(Utc::now())
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(AppError::Database)?;
                sqlx::query("UPDATE payments SET status = ? WHERE booking_id = ?")
                    .bind(payment_status::CANCELED)
                    .bind(id)
                    .execute(&mut *tx)
                    .await
                    .map_err(AppError::Database)?;
                tx.commit().await.map_err(AppError::Database)?;
            }
            return Ok(PaymentConfirmation::Expired);
        }

        sqlx::query("UPDATE payments SET status = ? WHERE booking_id = ?")
            .bind(payment_status::SUCCEEDED)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let confirmed = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'CONFIRMED', confirmed_at = ? WHERE id = ? RETURNING *",
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        sqlx::query(
            "INSERT INTO audit_logs (id, team_id, actor_user_id, booking_id, action, details, created_at)
             VALUES (?, ?, NULL, ?, ?, NULL, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&confirmed.team_id)
        .bind(&confirmed.id)
        .bind(audit_action)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;

        tx.commit().await.map_err(AppError::Database)?;
        Ok(PaymentConfirmation::Confirmed(confirmed))
    }

    async fn upsert_payment(&self, payment: &Payment) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO payments (booking_id, amount_cents, stripe_session_id, status, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(booking_id) DO UPDATE SET
                 amount_cents = excluded.amount_cents,
                 stripe_session_id = excluded.stripe_session_id,
                 status = excluded.status",
        )
        .bind(&payment.booking_id)
        .bind(payment.amount_cents)
        .bind(&payment.stripe_session_id)
        .bind(&payment.status)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_payment(&self, booking_id: &str) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = ?")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn set_payment_status(&self, booking_id: &str, status: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE payments SET status = ? WHERE booking_id = ?")
            .bind(status)
            .bind(booking_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }

    async fn upsert_calendar_link(&self, link: &CalendarLink) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO calendar_links (booking_id, provider, external_event_id, external_html_link, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(booking_id) DO NOTHING",
        )
        .bind(&link.booking_id)
        .bind(&link.provider)
        .bind(&link.external_event_id)
        .bind(&link.external_html_link)
        .bind(link.created_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;
        Ok(())
    }

    async fn find_calendar_link(&self, booking_id: &str) -> Result<Option<CalendarLink>, AppError> {
        sqlx::query_as::<_, CalendarLink>("SELECT * FROM calendar_links WHERE booking_id = ?")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }
}
