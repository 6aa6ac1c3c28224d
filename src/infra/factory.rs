use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::{CalendarService, PaymentGateway};
use crate::infra::calendar::http_calendar_service::HttpCalendarService;
use crate::infra::calendar::stub_calendar_service::StubCalendarService;
use crate::infra::crypto::AesGcmCodec;
use crate::infra::payments::stripe_gateway::StripeGateway;
use crate::infra::payments::stub_payment_gateway::StubPaymentGateway;
use crate::infra::repositories::{
    sqlite_audit_repo::SqliteAuditRepo, sqlite_availability_repo::SqliteAvailabilityRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_idempotency_repo::SqliteIdempotencyRepo,
    sqlite_session_repo::SqliteSessionRepo, sqlite_team_repo::SqliteTeamRepo,
    sqlite_user_repo::SqliteUserRepo,
};
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite");

    run_sqlite_migrations(&pool).await;

    build_state(config, pool)
}

pub fn build_state(config: &Config, pool: SqlitePool) -> AppState {
    let pii_codec = Arc::new(
        AesGcmCodec::new(&config.encryption_key).expect("Invalid ENCRYPTION_KEY"),
    );

    let calendar_service: Arc<dyn CalendarService> = match (
        config.calendar_service_url.clone(),
        config.calendar_service_token.clone(),
    ) {
        (Some(url), Some(token)) => Arc::new(HttpCalendarService::new(url, token)),
        _ => {
            info!("No calendar bridge configured, using stub calendar service");
            Arc::new(StubCalendarService)
        }
    };

    let payment_gateway: Arc<dyn PaymentGateway> = match config.stripe_secret_key.clone() {
        Some(secret_key) => Arc::new(StripeGateway::new(
            secret_key,
            config.stripe_webhook_secret.clone(),
        )),
        None => {
            info!("No Stripe key configured, using stub payment gateway");
            Arc::new(StubPaymentGateway)
        }
    };

    AppState {
        config: config.clone(),
        team_repo: Arc::new(SqliteTeamRepo::new(pool.clone())),
        user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
        session_repo: Arc::new(SqliteSessionRepo::new(pool.clone())),
        availability_repo: Arc::new(SqliteAvailabilityRepo::new(pool.clone())),
        booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
        idempotency_repo: Arc::new(SqliteIdempotencyRepo::new(pool.clone())),
        audit_repo: Arc::new(SqliteAuditRepo::new(pool)),
        pii_codec,
        calendar_service,
        payment_gateway,
    }
}

pub async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
