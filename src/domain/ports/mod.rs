use crate::domain::models::{
    team::Team, user::User, session::SessionRecord, availability::AvailabilityBlock,
    booking::{Booking, CalendarLink, Payment, PaymentConfirmation},
    audit::AuditLog, idempotency::IdempotencyClaim,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn create(&self, team: &Team) -> Result<Team, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Team>, AppError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Team>, AppError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &SessionRecord) -> Result<(), AppError>;
    async fn find_valid(&self, token_hash: &str) -> Result<Option<SessionRecord>, AppError>;
    async fn delete(&self, token_hash: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn list(&self, team_id: &str) -> Result<Vec<AvailabilityBlock>, AppError>;
    async fn list_active(&self, team_id: &str) -> Result<Vec<AvailabilityBlock>, AppError>;
    async fn list_active_for_day(&self, team_id: &str, day_of_week: i64) -> Result<Vec<AvailabilityBlock>, AppError>;
    /// Set reconciliation in one transaction: team blocks absent from the
    /// incoming id set are deleted, the rest upserted, and the audit row
    /// written before commit. No partial apply.
    async fn replace_all(&self, team_id: &str, blocks: &[AvailabilityBlock], audit: &AuditLog) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Atomic check-and-insert: fails with `SlotTaken` when a blocking
    /// booking (confirmed, or pending and created after `pending_cutoff`)
    /// overlaps the new booking's range.
    async fn create_pending(&self, booking: &Booking, pending_cutoff: DateTime<Utc>) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn find_by_team(&self, team_id: &str, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_by_team(&self, team_id: &str, status: Option<&str>, name_query: Option<&str>) -> Result<Vec<Booking>, AppError>;
    async fn list_blocking(&self, team_id: &str, start: DateTime<Utc>, end: DateTime<Utc>, pending_cutoff: DateTime<Utc>) -> Result<Vec<Booking>, AppError>;
    async fn expire_pending(&self, team_id: &str, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
    async fn mark_confirmed(&self, id: &str) -> Result<Booking, AppError>;
    async fn mark_cancelled(&self, id: &str) -> Result<Booking, AppError>;
    /// The shared paid-confirmation step: payment row, booking transition
    /// and audit row all inside one transaction. Calendar-link creation is
    /// the caller's post-commit concern.
    async fn confirm_paid(&self, id: &str, pending_cutoff: DateTime<Utc>, audit_action: &str) -> Result<PaymentConfirmation, AppError>;
    async fn upsert_payment(&self, payment: &Payment) -> Result<(), AppError>;
    async fn find_payment(&self, booking_id: &str) -> Result<Option<Payment>, AppError>;
    async fn set_payment_status(&self, booking_id: &str, status: &str) -> Result<(), AppError>;
    async fn upsert_calendar_link(&self, link: &CalendarLink) -> Result<(), AppError>;
    async fn find_calendar_link(&self, booking_id: &str) -> Result<Option<CalendarLink>, AppError>;
}

#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Claims `key` for execution. A concurrent duplicate loses the
    /// unique-key race and observes `Busy`.
    async fn claim(&self, key: &str, handler: &str, request_hash: &str) -> Result<IdempotencyClaim, AppError>;
    async fn store_response(&self, key: &str, response: &str) -> Result<(), AppError>;
    /// Releases an unfinished claim so a later retry may execute.
    async fn release(&self, key: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn record(&self, log: &AuditLog) -> Result<(), AppError>;
    async fn list_by_team(&self, team_id: &str, limit: i64) -> Result<Vec<AuditLog>, AppError>;
    async fn list_by_booking(&self, booking_id: &str, limit: i64) -> Result<Vec<AuditLog>, AppError>;
}

pub struct EncryptedValue {
    pub value: String,
    pub iv: String,
}

/// Field-level encryption for customer PII.
pub trait PiiCodec: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<EncryptedValue, AppError>;
    fn decrypt(&self, value: &str, iv: &str) -> Result<String, AppError>;
}

pub struct CalendarEventRequest {
    pub booking_id: String,
    pub customer_name: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

pub struct CalendarEventResult {
    pub event_id: String,
    pub html_link: Option<String>,
}

/// Calendar integration. Implementations degrade to a stub result rather
/// than failing; a calendar outage must never roll back a confirmation.
#[async_trait]
pub trait CalendarService: Send + Sync {
    fn provider_name(&self) -> &'static str;
    async fn create_event(&self, request: &CalendarEventRequest) -> CalendarEventResult;
}

pub struct CheckoutSessionRequest {
    pub booking_id: String,
    pub amount_cents: i64,
    pub customer_email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CheckoutSession {
    #[serde(rename = "sessionId")]
    pub id: String,
    pub url: String,
}

/// The fields of a retrieved checkout session the confirmation poll cares
/// about.
#[derive(Debug, Deserialize, Clone)]
pub struct CheckoutSessionDetails {
    pub id: String,
    pub payment_status: Option<String>,
    pub client_reference_id: Option<String>,
}

/// A verified webhook event, reduced to what the bridge needs.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub event_type: String,
    pub client_reference_id: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> Result<CheckoutSession, AppError>;
    /// Returns `None` when the gateway is unconfigured, the signature is
    /// missing, or verification fails; callers treat `None` as a no-op.
    fn verify_webhook(&self, raw_body: &[u8], signature: Option<&str>) -> Option<WebhookEvent>;
    /// `Ok(None)` signals an unconfigured gateway.
    async fn retrieve_session(&self, session_id: &str) -> Result<Option<CheckoutSessionDetails>, AppError>;
}
