use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct IdempotencyRecord {
    pub key: String,
    pub handler: String,
    pub request_hash: String,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of attempting to claim an idempotency key.
#[derive(Debug)]
pub enum IdempotencyClaim {
    /// Key was unused; the claim row is in place and the caller owns the
    /// execution.
    Fresh,
    /// Same key and payload, finished earlier: replay this response.
    Replay(String),
    /// Same key and payload but no stored response yet; another execution
    /// is in flight.
    Busy,
    /// Same key, different payload.
    Conflict,
}
