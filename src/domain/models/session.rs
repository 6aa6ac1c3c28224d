use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

/// Server-side record backing an opaque session cookie. Only the SHA-256
/// hash of the token is stored.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: String,
    pub team_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(token_hash: String, user_id: String, team_id: String, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            token_hash,
            user_id,
            team_id,
            expires_at: now + Duration::hours(ttl_hours),
            created_at: now,
        }
    }
}
