use crate::domain::ports::{
    CheckoutSession, CheckoutSessionDetails, CheckoutSessionRequest, PaymentGateway, WebhookEvent,
};
use crate::error::AppError;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{error, warn};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

pub struct StripeGateway {
    client: Client,
    secret_key: String,
    webhook_secret: Option<String>,
}

impl StripeGateway {
    pub fn new(secret_key: String, webhook_secret: Option<String>) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            webhook_secret,
        }
    }
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
    payment_status: Option<String>,
    client_reference_id: Option<String>,
}

#[derive(Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Deserialize)]
struct StripeEventData {
    object: StripeEventObject,
}

#[derive(Deserialize)]
struct StripeEventObject {
    client_reference_id: Option<String>,
}

/// Parses a `Stripe-Signature` header into its timestamp and v1 signature.
fn parse_signature_header(header: &str) -> Option<(&str, &str)> {
    let mut timestamp = None;
    let mut v1 = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => v1 = Some(value),
            _ => {}
        }
    }
    Some((timestamp?, v1?))
}

fn verify_signature(secret: &str, timestamp: &str, raw_body: &[u8], expected_hex: &str) -> bool {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(raw_body);

    let Ok(expected) = hex::decode(expected_hex) else {
        return false;
    };
    mac.verify_slice(&expected).is_ok()
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, AppError> {
        let amount = request.amount_cents.to_string();
        let mut form: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("client_reference_id", &request.booking_id),
            ("success_url", &request.success_url),
            ("cancel_url", &request.cancel_url),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", "usd"),
            ("line_items[0][price_data][unit_amount]", &amount),
            ("line_items[0][price_data][product_data][name]", "Booking deposit"),
            ("metadata[bookingId]", &request.booking_id),
        ];
        if let Some(email) = &request.customer_email {
            form.push(("customer_email", email));
        }

        let res = self
            .client
            .post(format!("{}/checkout/sessions", STRIPE_API_BASE))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!("Stripe connection error: {}", e);
                AppError::InternalWithMsg("Payment provider unreachable".into())
            })?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            error!("Stripe checkout session creation failed. Status: {}, Body: {}", status, body);
            return Err(AppError::InternalWithMsg("Payment provider rejected the request".into()));
        }

        let session: SessionResponse = res.json().await.map_err(|e| {
            error!("Stripe returned an unreadable session: {}", e);
            AppError::InternalWithMsg("Payment provider response was malformed".into())
        })?;

        let url = session
            .url
            .ok_or_else(|| AppError::InternalWithMsg("Checkout session has no URL".into()))?;

        Ok(CheckoutSession { id: session.id, url })
    }

    fn verify_webhook(&self, raw_body: &[u8], signature: Option<&str>) -> Option<WebhookEvent> {
        let secret = self.webhook_secret.as_deref()?;
        let header = signature?;
        let (timestamp, v1) = parse_signature_header(header)?;

        if !verify_signature(secret, timestamp, raw_body, v1) {
            warn!("Stripe webhook signature verification failed");
            return None;
        }

        let event: StripeEvent = match serde_json::from_slice(raw_body) {
            Ok(event) => event,
            Err(e) => {
                warn!("Stripe webhook body is not a valid event: {}", e);
                return None;
            }
        };

        Some(WebhookEvent {
            event_type: event.event_type,
            client_reference_id: event.data.object.client_reference_id,
        })
    }

    async fn retrieve_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionDetails>, AppError> {
        let res = self
            .client
            .get(format!("{}/checkout/sessions/{}", STRIPE_API_BASE, session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| {
                error!("Stripe connection error: {}", e);
                AppError::InternalWithMsg("Payment provider unreachable".into())
            })?;

        if !res.status().is_success() {
            let status = res.status();
            error!("Stripe session retrieval failed. Status: {}", status);
            return Err(AppError::InternalWithMsg("Payment provider rejected the request".into()));
        }

        let session: SessionResponse = res.json().await.map_err(|e| {
            error!("Stripe returned an unreadable session: {}", e);
            AppError::InternalWithMsg("Payment provider response was malformed".into())
        })?;

        Ok(Some(CheckoutSessionDetails {
            id: session.id,
            payment_status: session.payment_status,
            client_reference_id: session.client_reference_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signature_header() {
        let (t, v1) = parse_signature_header("t=1700000000,v1=abc123,v0=ignored").unwrap();
        assert_eq!(t, "1700000000");
        assert_eq!(v1, "abc123");
    }

    #[test]
    fn rejects_header_without_v1() {
        assert!(parse_signature_header("t=1700000000").is_none());
    }

    #[test]
    fn accepts_matching_signature() {
        let secret = "whsec_test";
        let body = br#"{"type":"checkout.session.completed"}"#;
        let timestamp = "1700000000";

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        let signed = hex::encode(mac.finalize().into_bytes());

        assert!(verify_signature(secret, timestamp, body, &signed));
        assert!(!verify_signature(secret, timestamp, body, "deadbeef"));
        assert!(!verify_signature(secret, "1700000001", body, &signed));
    }
}
