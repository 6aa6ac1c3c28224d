pub mod team;
pub mod user;
pub mod session;
pub mod availability;
pub mod booking;
pub mod audit;
pub mod idempotency;
