use crate::domain::ports::{
    CheckoutSession, CheckoutSessionDetails, CheckoutSessionRequest, PaymentGateway, WebhookEvent,
};
use crate::error::AppError;
use async_trait::async_trait;

/// In place when no Stripe key is configured. Sessions are fabricated so
/// the booking flow can be exercised end to end without a provider;
/// webhook and poll confirmation stay inert.
pub struct StubPaymentGateway;

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, AppError> {
        Ok(CheckoutSession {
            id: format!("stub_{}", request.booking_id),
            url: request.success_url.clone(),
        })
    }

    fn verify_webhook(&self, _raw_body: &[u8], _signature: Option<&str>) -> Option<WebhookEvent> {
        None
    }

    async fn retrieve_session(
        &self,
        _session_id: &str,
    ) -> Result<Option<CheckoutSessionDetails>, AppError> {
        Ok(None)
    }
}
