pub mod sqlite_audit_repo;
pub mod sqlite_availability_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_idempotency_repo;
pub mod sqlite_session_repo;
pub mod sqlite_team_repo;
pub mod sqlite_user_repo;
