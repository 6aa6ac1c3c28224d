pub mod http_calendar_service;
pub mod stub_calendar_service;
