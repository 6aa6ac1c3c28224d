use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::services::availability::AvailabilityInput;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePublicBookingRequest {
    pub team_slug: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub start_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct ReplaceAvailabilityRequest {
    pub blocks: Vec<AvailabilityInput>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmCheckoutRequest {
    pub session_id: String,
}

#[derive(Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}
