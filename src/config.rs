use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub app_base_url: String,
    pub encryption_key: String, // base64 encoded 32 byte key
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub calendar_service_url: Option<String>,
    pub calendar_service_token: Option<String>,
    pub deposit_amount_cents: i64,
    pub pending_payment_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            app_base_url: env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            encryption_key: env::var("ENCRYPTION_KEY").expect("ENCRYPTION_KEY must be set (base64, 32 bytes)"),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").ok(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").ok(),
            calendar_service_url: env::var("CALENDAR_SERVICE_URL").ok(),
            calendar_service_token: env::var("CALENDAR_SERVICE_TOKEN").ok(),
            deposit_amount_cents: env::var("DEPOSIT_AMOUNT_CENTS")
                .ok()
                .map(|v| v.parse().expect("DEPOSIT_AMOUNT_CENTS must be a number"))
                .unwrap_or(5000),
            pending_payment_ttl_minutes: env::var("PENDING_PAYMENT_TTL_MINUTES")
                .ok()
                .map(|v| v.parse().expect("PENDING_PAYMENT_TTL_MINUTES must be a number"))
                .unwrap_or(15),
        }
    }
}
