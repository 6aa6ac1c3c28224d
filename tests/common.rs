use slotbook_backend::{
    api::router::create_router,
    config::Config,
    domain::models::{team::Team, user::User},
    domain::ports::{
        CheckoutSession, CheckoutSessionDetails, CheckoutSessionRequest, PaymentGateway,
        WebhookEvent,
    },
    error::AppError,
    infra::calendar::stub_calendar_service::StubCalendarService,
    infra::crypto::AesGcmCodec,
    infra::repositories::{
        sqlite_audit_repo::SqliteAuditRepo, sqlite_availability_repo::SqliteAvailabilityRepo,
        sqlite_booking_repo::SqliteBookingRepo, sqlite_idempotency_repo::SqliteIdempotencyRepo,
        sqlite_session_repo::SqliteSessionRepo, sqlite_team_repo::SqliteTeamRepo,
        sqlite_user_repo::SqliteUserRepo,
    },
    state::AppState,
};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

// 32 zero bytes, base64.
const TEST_ENCRYPTION_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=";

pub const TEST_WEBHOOK_SIGNATURE: &str = "test-signature";

/// In-memory gateway standing in for Stripe. Sessions can be flipped to
/// paid so the confirmation bridge is testable end to end.
pub struct MockPaymentGateway {
    sessions: Mutex<HashMap<String, String>>,
    paid: Mutex<HashSet<String>>,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            paid: Mutex::new(HashSet::new()),
        }
    }

    pub fn mark_paid(&self, session_id: &str) {
        self.paid.lock().unwrap().insert(session_id.to_string());
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, AppError> {
        let id = format!("cs_test_{}", request.booking_id);
        self.sessions
            .lock()
            .unwrap()
            .insert(id.clone(), request.booking_id.clone());
        Ok(CheckoutSession {
            id,
            url: request.success_url.clone(),
        })
    }

    fn verify_webhook(&self, raw_body: &[u8], signature: Option<&str>) -> Option<WebhookEvent> {
        if signature != Some(TEST_WEBHOOK_SIGNATURE) {
            return None;
        }
        let event: serde_json::Value = serde_json::from_slice(raw_body).ok()?;
        Some(WebhookEvent {
            event_type: event["type"].as_str()?.to_string(),
            client_reference_id: event["data"]["object"]["client_reference_id"]
                .as_str()
                .map(|s| s.to_string()),
        })
    }

    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionDetails>, AppError> {
        let sessions = self.sessions.lock().unwrap();
        let Some(booking_id) = sessions.get(session_id) else {
            return Ok(None);
        };
        let payment_status = if self.paid.lock().unwrap().contains(session_id) {
            "paid"
        } else {
            "unpaid"
        };
        Ok(Some(CheckoutSessionDetails {
            id: session_id.to_string(),
            payment_status: Some(payment_status.to_string()),
            client_reference_id: Some(booking_id.clone()),
        }))
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub payment_gateway: Arc<MockPaymentGateway>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            app_base_url: "http://localhost:3000".to_string(),
            encryption_key: TEST_ENCRYPTION_KEY.to_string(),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
            calendar_service_url: None,
            calendar_service_token: None,
            deposit_amount_cents: 5000,
            pending_payment_ttl_minutes: 15,
        };

        let payment_gateway = Arc::new(MockPaymentGateway::new());

        let state = Arc::new(AppState {
            config: config.clone(),
            team_repo: Arc::new(SqliteTeamRepo::new(pool.clone())),
            user_repo: Arc::new(SqliteUserRepo::new(pool.clone())),
            session_repo: Arc::new(SqliteSessionRepo::new(pool.clone())),
            availability_repo: Arc::new(SqliteAvailabilityRepo::new(pool.clone())),
            booking_repo: Arc::new(SqliteBookingRepo::new(pool.clone())),
            idempotency_repo: Arc::new(SqliteIdempotencyRepo::new(pool.clone())),
            audit_repo: Arc::new(SqliteAuditRepo::new(pool.clone())),
            pii_codec: Arc::new(AesGcmCodec::new(TEST_ENCRYPTION_KEY).unwrap()),
            calendar_service: Arc::new(StubCalendarService),
            payment_gateway: payment_gateway.clone(),
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            payment_gateway,
        }
    }

    pub async fn seed_team(&self, name: &str, slug: &str) -> Team {
        self.state
            .team_repo
            .create(&Team::new(name.to_string(), slug.to_string()))
            .await
            .expect("Failed to seed team")
    }

    pub async fn seed_user(&self, team_id: &str, email: &str, password: &str, role: &str) -> User {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string();

        self.state
            .user_repo
            .create(&User::new(
                team_id.to_string(),
                email.to_string(),
                password_hash,
                role.to_string(),
            ))
            .await
            .expect("Failed to seed user")
    }

    /// Logs in and returns the session cookie value.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let payload = serde_json::json!({ "email": email, "password": password });

        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        if !response.status().is_success() {
            panic!("Login failed in test helper: status {}", response.status());
        }

        let cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|h| h.to_str().unwrap().to_string())
            .find(|c| c.contains("session_token="))
            .expect("No session_token cookie returned");

        let start = cookie.find("session_token=").unwrap() + 14;
        let end = cookie[start..].find(';').unwrap_or(cookie.len() - start);
        cookie[start..start + end].to_string()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}
