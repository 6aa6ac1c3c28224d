use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AuditLog {
    pub id: String,
    pub team_id: String,
    pub actor_user_id: Option<String>,
    pub booking_id: Option<String>,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fire-and-forget audit event. `details` is serialized to JSON by the
/// repository.
pub struct AuditEntry {
    pub team_id: String,
    pub actor_user_id: Option<String>,
    pub booking_id: Option<String>,
    pub action: String,
    pub details: Option<serde_json::Value>,
}

impl AuditEntry {
    pub fn new(team_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            actor_user_id: None,
            booking_id: None,
            action: action.into(),
            details: None,
        }
    }

    pub fn actor(mut self, user_id: impl Into<String>) -> Self {
        self.actor_user_id = Some(user_id.into());
        self
    }

    pub fn booking(mut self, booking_id: impl Into<String>) -> Self {
        self.booking_id = Some(booking_id.into());
        self
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn into_log(self) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4().to_string(),
            team_id: self.team_id,
            actor_user_id: self.actor_user_id,
            booking_id: self.booking_id,
            action: self.action,
            details: self.details.map(|d| d.to_string()),
            created_at: Utc::now(),
        }
    }
}
