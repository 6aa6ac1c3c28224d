pub mod auth;
pub mod availability;
pub mod bookings;
pub mod idempotency;
pub mod payments;
pub mod rbac;
pub mod slots;
