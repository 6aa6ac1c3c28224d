pub mod calendar;
pub mod crypto;
pub mod factory;
pub mod payments;
pub mod repositories;
