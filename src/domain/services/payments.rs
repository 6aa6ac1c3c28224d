use serde_json::json;
use tracing::{debug, info};

use crate::domain::models::audit::AuditEntry;
use crate::domain::models::booking::{payment_status, status, Payment, PaymentConfirmation};
use crate::domain::ports::{CheckoutSession, CheckoutSessionRequest};
use crate::domain::services::bookings::{attach_calendar_link, pending_cutoff};
use crate::domain::services::idempotency::run_with_idempotency;
use crate::error::AppError;
use crate::state::AppState;

pub const CHECKOUT_HANDLER: &str = "CreateDepositCheckout";
pub const WEBHOOK_CONFIRM_ACTION: &str = "booking.confirmed_via_webhook";
pub const POLL_CONFIRM_ACTION: &str = "booking.confirmed_via_checkout_poll";

/// Creates (or replays) the deposit checkout session for a pending
/// booking. Deduped through the idempotency guard so a double-submitted
/// key produces exactly one provider session.
pub async fn create_deposit_checkout_session(
    state: &AppState,
    booking_id: &str,
    idempotency_key: &str,
) -> Result<CheckoutSession, AppError> {
    let payload = json!({ "bookingId": booking_id });

    run_with_idempotency(
        state.idempotency_repo.as_ref(),
        idempotency_key,
        CHECKOUT_HANDLER,
        &payload,
        || async {
            let booking = state
                .booking_repo
                .find_by_id(booking_id)
                .await?
                .ok_or(AppError::BookingNotFound)?;

            if booking.status != status::PENDING_PAYMENT {
                return Err(AppError::BookingNotPending);
            }

            if booking.is_pending_expired(state.config.pending_payment_ttl_minutes) {
                state.booking_repo.mark_cancelled(&booking.id).await?;
                state
                    .booking_repo
                    .set_payment_status(&booking.id, payment_status::CANCELED)
                    .await?;
                return Err(AppError::BookingExpired);
            }

            let team = state
                .team_repo
                .find_by_id(&booking.team_id)
                .await?
                .ok_or(AppError::Internal)?;

            let success_url = format!(
                "{}/book/{}?status=success&session_id={{CHECKOUT_SESSION_ID}}",
                state.config.app_base_url, team.slug
            );
            let cancel_url = format!("{}/book/{}?status=cancelled", state.config.app_base_url, team.slug);

            let customer_email = state
                .pii_codec
                .decrypt(&booking.customer_email_encrypted, &booking.email_iv)?;

            let session = state
                .payment_gateway
                .create_checkout_session(&CheckoutSessionRequest {
                    booking_id: booking.id.clone(),
                    amount_cents: state.config.deposit_amount_cents,
                    customer_email: Some(customer_email),
                    success_url,
                    cancel_url,
                })
                .await?;

            state
                .booking_repo
                .upsert_payment(&Payment::new(
                    booking.id.clone(),
                    state.config.deposit_amount_cents,
                    session.id.clone(),
                ))
                .await?;

            state
                .audit_repo
                .record(
                    &AuditEntry::new(booking.team_id.clone(), "payment.checkout_session_created")
                        .booking(booking.id.clone())
                        .into_log(),
                )
                .await?;

            info!("Checkout session {} created for booking {}", session.id, booking.id);
            Ok(session)
        },
    )
    .await
}

/// The single shared confirmation routine both payment triggers funnel
/// into. The transactional part lives in the repository; the calendar
/// link is attached only after that commits, and only on the branch that
/// actually mutated.
pub async fn confirm_paid_booking(
    state: &AppState,
    booking_id: &str,
    audit_action: &str,
) -> Result<PaymentConfirmation, AppError> {
    let result = state
        .booking_repo
        .confirm_paid(booking_id, pending_cutoff(state), audit_action)
        .await?;

    if let PaymentConfirmation::Confirmed(booking) = &result {
        attach_calendar_link(state, booking).await?;
        info!("Booking {} confirmed ({})", booking.id, audit_action);
    }

    Ok(result)
}

/// Webhook entry point. Unverifiable payloads and unrecognized event
/// types are swallowed; the provider retries on its own schedule and an
/// unrelated event must never fail the endpoint.
pub async fn handle_stripe_webhook(
    state: &AppState,
    raw_body: &[u8],
    signature: Option<&str>,
) -> Result<(), AppError> {
    let Some(event) = state.payment_gateway.verify_webhook(raw_body, signature) else {
        return Ok(());
    };

    match event.event_type.as_str() {
        "checkout.session.completed" => {
            let Some(booking_id) = event.client_reference_id else {
                debug!("checkout.session.completed without client_reference_id, ignoring");
                return Ok(());
            };
            confirm_paid_booking(state, &booking_id, WEBHOOK_CONFIRM_ACTION).await?;
        }
        other => {
            debug!("Ignoring Stripe event type: {}", other);
        }
    }

    Ok(())
}

/// Client-initiated confirmation after the checkout redirect: look the
/// session up at the provider and confirm the referenced booking.
pub async fn confirm_from_checkout_session(
    state: &AppState,
    session_id: &str,
) -> Result<PaymentConfirmation, AppError> {
    let session = state
        .payment_gateway
        .retrieve_session(session_id)
        .await?
        .ok_or(AppError::StripeDisabled)?;

    if session.payment_status.as_deref() != Some("paid") {
        return Err(AppError::CheckoutNotPaid);
    }

    let booking_id = session
        .client_reference_id
        .ok_or(AppError::CheckoutMissingBooking)?;

    confirm_paid_booking(state, &booking_id, POLL_CONFIRM_ACTION).await
}
