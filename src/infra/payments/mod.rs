pub mod stripe_gateway;
pub mod stub_payment_gateway;
