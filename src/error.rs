use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Caller-visible failure taxonomy. Every variant carries a stable code
/// that API clients can branch on; messages are for humans.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Team not found")]
    TeamNotFound,
    #[error("Booking not found")]
    BookingNotFound,
    #[error("Cannot book a past slot")]
    PastSlot,
    #[error("Requested slot is not within availability")]
    UnavailableSlot,
    #[error("Slot already booked")]
    SlotTaken,
    #[error("Booking is cancelled")]
    BookingCancelled,
    #[error("Deposit window expired")]
    BookingExpired,
    #[error("Booking is not awaiting payment")]
    BookingNotPending,
    #[error("dayOfWeek must be between 0-6")]
    InvalidDay,
    #[error("Times must be HH:mm")]
    InvalidTime,
    #[error("startTime must be before endTime")]
    InvalidRange,
    #[error("Payload mismatch for idempotency key")]
    IdempotencyConflict,
    #[error("Request for this key is still being processed")]
    IdempotencyBusy,
    #[error("Idempotency-Key header is required")]
    MissingIdempotencyKey,
    #[error("Stripe is not configured")]
    StripeDisabled,
    #[error("Stripe has not marked this session as paid")]
    CheckoutNotPaid,
    #[error("Checkout session is missing a booking reference")]
    CheckoutMissingBooking,
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "INTERNAL_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::TeamNotFound => "TEAM_NOT_FOUND",
            AppError::BookingNotFound => "BOOKING_NOT_FOUND",
            AppError::PastSlot => "PAST_SLOT",
            AppError::UnavailableSlot => "UNAVAILABLE_SLOT",
            AppError::SlotTaken => "SLOT_TAKEN",
            AppError::BookingCancelled => "BOOKING_CANCELLED",
            AppError::BookingExpired => "BOOKING_EXPIRED",
            AppError::BookingNotPending => "BOOKING_NOT_PENDING",
            AppError::InvalidDay => "INVALID_DAY",
            AppError::InvalidTime => "INVALID_TIME",
            AppError::InvalidRange => "INVALID_RANGE",
            AppError::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            AppError::IdempotencyBusy => "IDEMPOTENCY_BUSY",
            AppError::MissingIdempotencyKey => "MISSING_IDEMPOTENCY_KEY",
            AppError::StripeDisabled => "STRIPE_DISABLED",
            AppError::CheckoutNotPaid => "CHECKOUT_NOT_PAID",
            AppError::CheckoutMissingBooking => "CHECKOUT_MISSING_BOOKING",
            AppError::Validation(_) => "VALIDATION",
            AppError::Internal | AppError::InternalWithMsg(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal | AppError::InternalWithMsg(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::TeamNotFound | AppError::BookingNotFound => StatusCode::NOT_FOUND,
            AppError::SlotTaken
            | AppError::BookingCancelled
            | AppError::BookingExpired
            | AppError::BookingNotPending
            | AppError::IdempotencyConflict
            | AppError::IdempotencyBusy
            | AppError::CheckoutNotPaid => StatusCode::CONFLICT,
            AppError::PastSlot
            | AppError::UnavailableSlot
            | AppError::InvalidDay
            | AppError::InvalidTime
            | AppError::InvalidRange
            | AppError::MissingIdempotencyKey
            | AppError::StripeDisabled
            | AppError::CheckoutMissingBooking
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                "Something went wrong".to_string()
            }
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                "Something went wrong".to_string()
            }
            AppError::Internal => "Something went wrong".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}
