use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc, Datelike};
use serde::Serialize;

use crate::domain::models::availability::AvailabilityBlock;
use crate::domain::models::booking::{Booking, SLOT_DURATION_MINUTES};
use crate::error::AppError;
use crate::state::AppState;

pub const PROJECTION_WINDOW_DAYS: i64 = 14;

/// Parses an "HH:mm" wall-clock string into minutes since midnight.
/// Rejects anything that is not a zero-padded, real time of day.
pub fn parse_time_to_minutes(value: &str) -> Option<u32> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    let hours: u32 = value[0..2].parse().ok()?;
    let minutes: u32 = value[3..5].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

pub fn minutes_to_time(value: u32) -> String {
    format!("{:02}:{:02}", value / 60, value % 60)
}

pub fn is_valid_time(value: &str) -> bool {
    parse_time_to_minutes(value).is_some()
}

/// Expands one availability block on a concrete date into slot start
/// instants. Slots step by the fixed duration from the block start; a
/// slot that would overrun the block end is dropped, not truncated.
pub fn build_slots_for_block(date: NaiveDate, block: &AvailabilityBlock) -> Vec<DateTime<Utc>> {
    let (Some(start_min), Some(end_min)) = (
        parse_time_to_minutes(&block.start_time),
        parse_time_to_minutes(&block.end_time),
    ) else {
        return Vec::new();
    };

    let mut slots = Vec::new();
    let mut cursor = start_min;
    while cursor + SLOT_DURATION_MINUTES as u32 <= end_min {
        if let Some(time) = NaiveTime::from_hms_opt(cursor / 60, cursor % 60, 0) {
            slots.push(date.and_time(time).and_utc());
        }
        cursor += SLOT_DURATION_MINUTES as u32;
    }
    slots
}

/// Half-open interval intersection against blocking bookings.
pub fn has_overlap(slot_start: DateTime<Utc>, slot_end: DateTime<Utc>, bookings: &[Booking]) -> bool {
    bookings.iter().any(|b| b.start_at < slot_end && b.end_at > slot_start)
}

#[derive(Debug, Serialize)]
pub struct DayAvailability {
    pub date: String,
    pub slots: Vec<String>,
}

/// Projects the team's active weekly blocks over a rolling forward window
/// into bookable slot instants, dropping past slots and anything held by
/// a blocking booking.
pub async fn get_public_availability(state: &AppState, team_id: &str) -> Result<Vec<DayAvailability>, AppError> {
    let now = Utc::now();
    let window_start = now.date_naive();
    let window_end_instant = window_start
        .checked_add_days(chrono::Days::new(PROJECTION_WINDOW_DAYS as u64))
        .unwrap_or(window_start)
        .and_time(NaiveTime::MIN)
        .and_utc();

    let blocks = state.availability_repo.list_active(team_id).await?;
    let blocking = super::bookings::get_blocking_bookings(
        state,
        team_id,
        window_start.and_time(NaiveTime::MIN).and_utc(),
        window_end_instant,
    )
    .await?;

    let mut days = Vec::with_capacity(PROJECTION_WINDOW_DAYS as usize);
    for offset in 0..PROJECTION_WINDOW_DAYS {
        let date = window_start + Duration::days(offset);
        let day_of_week = date.weekday().num_days_from_sunday() as i64;

        let mut slots = Vec::new();
        for block in blocks.iter().filter(|b| b.day_of_week == day_of_week) {
            for slot_start in build_slots_for_block(date, block) {
                if slot_start <= now {
                    continue;
                }
                let slot_end = slot_start + Duration::minutes(SLOT_DURATION_MINUTES);
                if has_overlap(slot_start, slot_end, &blocking) {
                    continue;
                }
                slots.push(slot_start.to_rfc3339());
            }
        }
        slots.sort();
        slots.dedup();

        days.push(DayAvailability {
            date: date.and_time(NaiveTime::MIN).and_utc().to_rfc3339(),
            slots,
        });
    }

    Ok(days)
}
