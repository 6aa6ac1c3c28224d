use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::dtos::requests::{BookingListQuery, CreatePublicBookingRequest};
use crate::api::extractors::auth::AuthUser;
use crate::domain::services::bookings::{self, PublicBookingInput};
use crate::domain::services::slots;
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_public_availability(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let team = state
        .team_repo
        .find_by_slug(&slug)
        .await?
        .ok_or(AppError::TeamNotFound)?;

    let days = slots::get_public_availability(&state, &team.id).await?;
    Ok(Json(json!({
        "team": { "id": team.id, "name": team.name, "slug": team.slug },
        "days": days,
    })))
}

pub async fn create_public_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePublicBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::Validation("customerName is required".into()));
    }
    if !payload.customer_email.contains('@') {
        return Err(AppError::Validation("customerEmail must be an email address".into()));
    }
    if payload.customer_phone.trim().is_empty() {
        return Err(AppError::Validation("customerPhone is required".into()));
    }

    let team = state
        .team_repo
        .find_by_slug(&payload.team_slug)
        .await?
        .ok_or(AppError::TeamNotFound)?;

    let booking = bookings::create_public_booking(
        &state,
        PublicBookingInput {
            team_id: team.id,
            customer_name: payload.customer_name.trim().to_string(),
            customer_email: payload.customer_email,
            customer_phone: payload.customer_phone,
            start_at: payload.start_at,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<BookingListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = bookings::list_team_bookings(
        &state,
        &user.team_id,
        query.status.as_deref(),
        query.q.as_deref(),
    )
    .await?;
    Ok(Json(json!({ "bookings": bookings })))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking = bookings::get_team_booking(&state, &user.team_id, &booking_id).await?;
    Ok(Json(booking))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking =
        bookings::confirm_booking(&state, &user.team_id, &booking_id, &user.id, &user.role).await?;
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let booking =
        bookings::cancel_booking(&state, &user.team_id, &booking_id, &user.id, &user.role).await?;
    Ok(Json(booking))
}
