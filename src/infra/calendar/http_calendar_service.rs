use crate::domain::ports::{CalendarEventRequest, CalendarEventResult, CalendarService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::stub_calendar_service::stub_result;

/// Pushes confirmed bookings to an external calendar bridge. Failures are
/// logged and replaced with a stub result; a calendar outage must never
/// surface to the booking flow.
pub struct HttpCalendarService {
    client: Client,
    api_url: String,
    api_token: String,
}

impl HttpCalendarService {
    pub fn new(api_url: String, api_token: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_token,
        }
    }
}

#[derive(Serialize)]
struct EventPayload {
    booking_id: String,
    summary: String,
    start_at: String,
    end_at: String,
}

#[derive(Deserialize)]
struct EventResponse {
    event_id: String,
    html_link: Option<String>,
}

#[async_trait]
impl CalendarService for HttpCalendarService {
    fn provider_name(&self) -> &'static str {
        "google"
    }

    async fn create_event(&self, request: &CalendarEventRequest) -> CalendarEventResult {
        let payload = EventPayload {
            booking_id: request.booking_id.clone(),
            summary: format!("Appointment: {}", request.customer_name),
            start_at: request.start_at.to_rfc3339(),
            end_at: request.end_at.to_rfc3339(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .json(&payload)
            .send()
            .await;

        let response = match response {
            Ok(res) if res.status().is_success() => res,
            Ok(res) => {
                error!("Calendar service failed. Status: {}", res.status());
                return stub_result(&request.booking_id);
            }
            Err(e) => {
                error!("Calendar service connection error: {}", e);
                return stub_result(&request.booking_id);
            }
        };

        match response.json::<EventResponse>().await {
            Ok(event) => CalendarEventResult {
                event_id: event.event_id,
                html_link: event.html_link,
            },
            Err(e) => {
                error!("Calendar service returned an unreadable body: {}", e);
                stub_result(&request.booking_id)
            }
        }
    }
}
