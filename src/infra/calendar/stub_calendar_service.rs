use crate::domain::ports::{CalendarEventRequest, CalendarEventResult, CalendarService};
use async_trait::async_trait;

/// Used when no calendar bridge is configured. Event ids are derived from
/// the booking id so the link rows stay stable across retries.
pub struct StubCalendarService;

pub fn stub_result(booking_id: &str) -> CalendarEventResult {
    CalendarEventResult {
        event_id: format!("stub-{}", booking_id),
        html_link: None,
    }
}

#[async_trait]
impl CalendarService for StubCalendarService {
    fn provider_name(&self) -> &'static str {
        "stub"
    }

    async fn create_event(&self, request: &CalendarEventRequest) -> CalendarEventResult {
        stub_result(&request.booking_id)
    }
}
