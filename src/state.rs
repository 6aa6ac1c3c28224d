use std::sync::Arc;
use crate::domain::ports::{
    AuditLogRepository, AvailabilityRepository, BookingRepository, CalendarService,
    IdempotencyRepository, PaymentGateway, PiiCodec, SessionRepository, TeamRepository,
    UserRepository,
};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub team_repo: Arc<dyn TeamRepository>,
    pub user_repo: Arc<dyn UserRepository>,
    pub session_repo: Arc<dyn SessionRepository>,
    pub availability_repo: Arc<dyn AvailabilityRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub idempotency_repo: Arc<dyn IdempotencyRepository>,
    pub audit_repo: Arc<dyn AuditLogRepository>,
    pub pii_codec: Arc<dyn PiiCodec>,
    pub calendar_service: Arc<dyn CalendarService>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
}
