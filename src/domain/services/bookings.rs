use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::models::audit::AuditEntry;
use crate::domain::models::booking::{
    status, Booking, CalendarLink, NewBookingParams, SLOT_DURATION_MINUTES,
};
use crate::domain::ports::CalendarEventRequest;
use crate::domain::services::rbac::can_manage_bookings;
use crate::domain::services::slots::parse_time_to_minutes;
use crate::error::AppError;
use crate::state::AppState;

/// Bookings whose pending hold started before this instant no longer
/// block a slot and are eligible for lazy cancellation.
pub fn pending_cutoff(state: &AppState) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(state.config.pending_payment_ttl_minutes)
}

/// A booking as the staff app sees it: PII decrypted.
#[derive(Debug, Serialize)]
pub struct BookingView {
    pub id: String,
    pub team_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

fn to_view(state: &AppState, booking: Booking) -> Result<BookingView, AppError> {
    let customer_email = state
        .pii_codec
        .decrypt(&booking.customer_email_encrypted, &booking.email_iv)?;
    let customer_phone = state
        .pii_codec
        .decrypt(&booking.customer_phone_encrypted, &booking.phone_iv)?;
    Ok(BookingView {
        id: booking.id,
        team_id: booking.team_id,
        customer_name: booking.customer_name,
        customer_email,
        customer_phone,
        start_at: booking.start_at,
        end_at: booking.end_at,
        status: booking.status,
        created_at: booking.created_at,
        confirmed_at: booking.confirmed_at,
        cancelled_at: booking.cancelled_at,
    })
}

/// Lazy expiry: stale pending holds are cancelled in bulk. Runs before
/// every team-scoped read so no caller ever observes an expired hold as
/// blocking.
pub async fn expire_pending_payments(state: &AppState, team_id: &str) -> Result<(), AppError> {
    let expired = state
        .booking_repo
        .expire_pending(team_id, pending_cutoff(state))
        .await?;
    if expired > 0 {
        info!("Expired {} stale pending bookings for team {}", expired, team_id);
    }
    Ok(())
}

pub async fn list_team_bookings(
    state: &AppState,
    team_id: &str,
    status_filter: Option<&str>,
    name_query: Option<&str>,
) -> Result<Vec<BookingView>, AppError> {
    expire_pending_payments(state, team_id).await?;
    let bookings = state
        .booking_repo
        .list_by_team(team_id, status_filter, name_query)
        .await?;
    bookings.into_iter().map(|b| to_view(state, b)).collect()
}

pub async fn get_team_booking(state: &AppState, team_id: &str, id: &str) -> Result<BookingView, AppError> {
    expire_pending_payments(state, team_id).await?;
    let booking = state
        .booking_repo
        .find_by_team(team_id, id)
        .await?
        .ok_or(AppError::BookingNotFound)?;
    to_view(state, booking)
}

/// Range query feeding the slot projector: confirmed bookings plus
/// pending holds that are still inside their deposit window.
pub async fn get_blocking_bookings(
    state: &AppState,
    team_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Booking>, AppError> {
    expire_pending_payments(state, team_id).await?;
    state
        .booking_repo
        .list_blocking(team_id, start, end, pending_cutoff(state))
        .await
}

pub struct PublicBookingInput {
    pub team_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub start_at: DateTime<Utc>,
}

pub async fn create_public_booking(state: &AppState, input: PublicBookingInput) -> Result<BookingView, AppError> {
    if input.start_at <= Utc::now() {
        return Err(AppError::PastSlot);
    }

    ensure_slot_matches_availability(state, &input.team_id, input.start_at).await?;

    let email = state.pii_codec.encrypt(&input.customer_email.to_lowercase())?;
    let phone = state.pii_codec.encrypt(&input.customer_phone)?;

    let booking = Booking::new_pending(NewBookingParams {
        team_id: input.team_id.clone(),
        customer_name: input.customer_name,
        customer_email_encrypted: email.value,
        email_iv: email.iv,
        customer_phone_encrypted: phone.value,
        phone_iv: phone.iv,
        start_at: input.start_at,
    });

    // Overlap check and insert happen inside one transaction so two
    // concurrent creators cannot both take the slot.
    let created = state
        .booking_repo
        .create_pending(&booking, pending_cutoff(state))
        .await?;

    state
        .audit_repo
        .record(
            &AuditEntry::new(created.team_id.clone(), "booking.created_public")
                .booking(created.id.clone())
                .into_log(),
        )
        .await?;

    info!("Public booking created: {} for team {}", created.id, created.team_id);
    to_view(state, created)
}

/// The requested hour-long slot must sit entirely inside a single active
/// availability block for that weekday. Checked in minute arithmetic; a
/// slot crossing midnight can never validate.
async fn ensure_slot_matches_availability(
    state: &AppState,
    team_id: &str,
    start_at: DateTime<Utc>,
) -> Result<(), AppError> {
    let day_of_week = start_at.weekday().num_days_from_sunday() as i64;
    let start_minutes = start_at.hour() * 60 + start_at.minute();
    let end_minutes = start_minutes + SLOT_DURATION_MINUTES as u32;

    let blocks = state
        .availability_repo
        .list_active_for_day(team_id, day_of_week)
        .await?;

    let covered = blocks.iter().any(|block| {
        match (
            parse_time_to_minutes(&block.start_time),
            parse_time_to_minutes(&block.end_time),
        ) {
            (Some(block_start), Some(block_end)) => {
                block_start <= start_minutes && block_end >= end_minutes
            }
            _ => false,
        }
    });

    if !covered {
        return Err(AppError::UnavailableSlot);
    }
    Ok(())
}

/// Staff confirmation. Terminal states stay terminal: cancelled bookings
/// conflict, confirmed bookings are returned unchanged, and an expired
/// pending hold is cancelled in place.
pub async fn confirm_booking(state: &AppState, team_id: &str, booking_id: &str, actor_user_id: &str, role: &str) -> Result<BookingView, AppError> {
    if !can_manage_bookings(role) {
        return Err(AppError::Forbidden("Insufficient role".into()));
    }

    let booking = state
        .booking_repo
        .find_by_team(team_id, booking_id)
        .await?
        .ok_or(AppError::BookingNotFound)?;

    match booking.status.as_str() {
        status::CANCELLED => return Err(AppError::BookingCancelled),
        status::CONFIRMED => return to_view(state, booking),
        _ => {}
    }

    if booking.is_pending_expired(state.config.pending_payment_ttl_minutes) {
        state.booking_repo.mark_cancelled(&booking.id).await?;
        return Err(AppError::BookingExpired);
    }

    let updated = state.booking_repo.mark_confirmed(&booking.id).await?;

    attach_calendar_link(state, &updated).await?;

    state
        .audit_repo
        .record(
            &AuditEntry::new(updated.team_id.clone(), "booking.confirmed")
                .actor(actor_user_id)
                .booking(updated.id.clone())
                .into_log(),
        )
        .await?;

    info!("Booking confirmed by staff: {}", updated.id);
    to_view(state, updated)
}

pub async fn cancel_booking(state: &AppState, team_id: &str, booking_id: &str, actor_user_id: &str, role: &str) -> Result<BookingView, AppError> {
    if !can_manage_bookings(role) {
        return Err(AppError::Forbidden("Insufficient role".into()));
    }

    let booking = state
        .booking_repo
        .find_by_team(team_id, booking_id)
        .await?
        .ok_or(AppError::BookingNotFound)?;

    if booking.status == status::CANCELLED {
        return to_view(state, booking);
    }

    let updated = state.booking_repo.mark_cancelled(&booking.id).await?;

    state
        .audit_repo
        .record(
            &AuditEntry::new(updated.team_id.clone(), "booking.cancelled")
                .actor(actor_user_id)
                .booking(updated.id.clone())
                .into_log(),
        )
        .await?;

    info!("Booking cancelled by staff: {}", updated.id);
    to_view(state, updated)
}

/// Calendar-event creation never fails the caller: the service degrades
/// to a stub result and we persist whatever it returns.
pub async fn attach_calendar_link(state: &AppState, booking: &Booking) -> Result<(), AppError> {
    let event = state
        .calendar_service
        .create_event(&CalendarEventRequest {
            booking_id: booking.id.clone(),
            customer_name: booking.customer_name.clone(),
            start_at: booking.start_at,
            end_at: booking.end_at,
        })
        .await;

    state
        .booking_repo
        .upsert_calendar_link(&CalendarLink {
            booking_id: booking.id.clone(),
            provider: state.calendar_service.provider_name().to_string(),
            external_event_id: event.event_id,
            external_html_link: event.html_link,
            created_at: Utc::now(),
        })
        .await
}
