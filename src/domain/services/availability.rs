use serde::Deserialize;
use serde_json::json;

use crate::domain::models::availability::AvailabilityBlock;
use crate::domain::models::audit::AuditEntry;
use crate::domain::models::user::User;
use crate::domain::services::rbac::can_edit_availability;
use crate::domain::services::slots::is_valid_time;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityInput {
    pub id: Option<String>,
    #[serde(rename = "dayOfWeek")]
    pub day_of_week: i64,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    pub active: bool,
}

pub async fn list_availability(state: &AppState, team_id: &str) -> Result<Vec<AvailabilityBlock>, AppError> {
    state.availability_repo.list(team_id).await
}

/// Replaces a team's whole weekly schedule with the submitted set. Every
/// block is validated up front; a single invalid block fails the whole
/// operation with no partial apply.
pub async fn replace_availability(
    state: &AppState,
    user: &User,
    inputs: Vec<AvailabilityInput>,
) -> Result<Vec<AvailabilityBlock>, AppError> {
    if !can_edit_availability(&user.role) {
        return Err(AppError::Forbidden("Insufficient role to edit availability".into()));
    }

    let mut blocks = Vec::with_capacity(inputs.len());
    for input in inputs {
        validate_block(&input)?;
        let block = match input.id {
            Some(id) => AvailabilityBlock {
                id,
                team_id: user.team_id.clone(),
                day_of_week: input.day_of_week,
                start_time: input.start_time,
                end_time: input.end_time,
                active: input.active,
            },
            None => AvailabilityBlock::new(
                user.team_id.clone(),
                input.day_of_week,
                input.start_time,
                input.end_time,
                input.active,
            ),
        };
        blocks.push(block);
    }

    let audit = AuditEntry::new(user.team_id.clone(), "availability.updated")
        .actor(user.id.clone())
        .details(json!({ "count": blocks.len() }))
        .into_log();

    state.availability_repo.replace_all(&user.team_id, &blocks, &audit).await?;

    state.availability_repo.list(&user.team_id).await
}

fn validate_block(block: &AvailabilityInput) -> Result<(), AppError> {
    if !(0..=6).contains(&block.day_of_week) {
        return Err(AppError::InvalidDay);
    }
    if !is_valid_time(&block.start_time) || !is_valid_time(&block.end_time) {
        return Err(AppError::InvalidTime);
    }
    if block.start_time >= block.end_time {
        return Err(AppError::InvalidRange);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(day: i64, start: &str, end: &str) -> AvailabilityInput {
        AvailabilityInput {
            id: None,
            day_of_week: day,
            start_time: start.into(),
            end_time: end.into(),
            active: true,
        }
    }

    #[test]
    fn rejects_out_of_range_day() {
        assert!(matches!(validate_block(&input(7, "09:00", "10:00")), Err(AppError::InvalidDay)));
        assert!(matches!(validate_block(&input(-1, "09:00", "10:00")), Err(AppError::InvalidDay)));
    }

    #[test]
    fn rejects_malformed_times() {
        assert!(matches!(validate_block(&input(1, "9:00", "10:00")), Err(AppError::InvalidTime)));
        assert!(matches!(validate_block(&input(1, "09:00", "25:00")), Err(AppError::InvalidTime)));
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(matches!(validate_block(&input(1, "10:00", "09:00")), Err(AppError::InvalidRange)));
        assert!(matches!(validate_block(&input(1, "10:00", "10:00")), Err(AppError::InvalidRange)));
    }

    #[test]
    fn accepts_valid_block() {
        assert!(validate_block(&input(0, "08:30", "17:00")).is_ok());
    }
}
