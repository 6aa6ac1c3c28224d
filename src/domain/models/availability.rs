use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::FromRow;

/// One weekly recurring availability window. `day_of_week` is 0-6 with
/// Sunday as 0; times are team-local wall clock "HH:mm" strings. Blocks
/// within a team are allowed to overlap.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AvailabilityBlock {
    pub id: String,
    pub team_id: String,
    pub day_of_week: i64,
    pub start_time: String,
    pub end_time: String,
    pub active: bool,
}

impl AvailabilityBlock {
    pub fn new(team_id: String, day_of_week: i64, start_time: String, end_time: String, active: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            team_id,
            day_of_week,
            start_time,
            end_time,
            active,
        }
    }
}
