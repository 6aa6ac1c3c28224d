use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::api::dtos::requests::ConfirmCheckoutRequest;
use crate::api::dtos::responses::ConfirmCheckoutResponse;
use crate::domain::models::booking::PaymentConfirmation;
use crate::domain::services::payments;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_checkout_session(
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or(AppError::MissingIdempotencyKey)?;

    let session =
        payments::create_deposit_checkout_session(&state, &booking_id, idempotency_key).await?;
    Ok(Json(session))
}

pub async fn confirm_checkout_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmCheckoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = payments::confirm_from_checkout_session(&state, &payload.session_id).await?;

    let response = match result {
        PaymentConfirmation::Confirmed(booking) => ConfirmCheckoutResponse {
            state: "confirmed",
            booking_id: Some(booking.id),
        },
        PaymentConfirmation::AlreadyConfirmed(booking) => ConfirmCheckoutResponse {
            state: "already_confirmed",
            booking_id: Some(booking.id),
        },
        PaymentConfirmation::Expired => return Err(AppError::BookingExpired),
        PaymentConfirmation::NotFound => return Err(AppError::BookingNotFound),
    };

    Ok(Json(response))
}

/// Stripe webhook receiver. The raw body is required for signature
/// verification, so no JSON extractor here.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok());

    payments::handle_stripe_webhook(&state, &body, signature).await?;

    Ok(Json(json!({ "received": true })))
}
