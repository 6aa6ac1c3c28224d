use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

pub const SLOT_DURATION_MINUTES: i64 = 60;

pub mod status {
    pub const PENDING_PAYMENT: &str = "PENDING_PAYMENT";
    pub const CONFIRMED: &str = "CONFIRMED";
    pub const CANCELLED: &str = "CANCELLED";
}

pub mod payment_status {
    pub const PENDING: &str = "PENDING";
    pub const SUCCEEDED: &str = "SUCCEEDED";
    pub const CANCELED: &str = "CANCELED";
}

/// Customer contact details are stored encrypted; handlers decrypt them
/// through the PII codec before returning a `BookingView`.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub team_id: String,
    pub customer_name: String,
    pub customer_email_encrypted: String,
    pub email_iv: String,
    pub customer_phone_encrypted: String,
    pub phone_iv: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

pub struct NewBookingParams {
    pub team_id: String,
    pub customer_name: String,
    pub customer_email_encrypted: String,
    pub email_iv: String,
    pub customer_phone_encrypted: String,
    pub phone_iv: String,
    pub start_at: DateTime<Utc>,
}

impl Booking {
    pub fn new_pending(params: NewBookingParams) -> Self {
        let end_at = params.start_at + Duration::minutes(SLOT_DURATION_MINUTES);
        Self {
            id: Uuid::new_v4().to_string(),
            team_id: params.team_id,
            customer_name: params.customer_name,
            customer_email_encrypted: params.customer_email_encrypted,
            email_iv: params.email_iv,
            customer_phone_encrypted: params.customer_phone_encrypted,
            phone_iv: params.phone_iv,
            start_at: params.start_at,
            end_at,
            status: status::PENDING_PAYMENT.to_string(),
            created_at: Utc::now(),
            confirmed_at: None,
            cancelled_at: None,
        }
    }

    pub fn pending_expires_at(&self, ttl_minutes: i64) -> DateTime<Utc> {
        self.created_at + Duration::minutes(ttl_minutes)
    }

    pub fn is_pending_expired(&self, ttl_minutes: i64) -> bool {
        self.status == status::PENDING_PAYMENT && Utc::now() > self.pending_expires_at(ttl_minutes)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Payment {
    pub booking_id: String,
    pub amount_cents: i64,
    pub stripe_session_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(booking_id: String, amount_cents: i64, stripe_session_id: String) -> Self {
        Self {
            booking_id,
            amount_cents,
            stripe_session_id,
            status: payment_status::PENDING.to_string(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct CalendarLink {
    pub booking_id: String,
    pub provider: String,
    pub external_event_id: String,
    pub external_html_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of the shared paid-confirmation routine. Both the webhook and
/// the checkout poll funnel into this; only `Confirmed` performed writes.
#[derive(Debug, Clone)]
pub enum PaymentConfirmation {
    NotFound,
    AlreadyConfirmed(Booking),
    Expired,
    Confirmed(Booking),
}
