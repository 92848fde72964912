use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    /// Minimum lead time, in minutes before slot start, for a
    /// customer-initiated cancellation. Admin cancellations bypass it.
    pub cancellation_cutoff_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "turfbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            razorpay_key_id: env::var("RAZORPAY_KEY_ID").unwrap_or_default(),
            razorpay_key_secret: env::var("RAZORPAY_KEY_SECRET").unwrap_or_default(),
            cancellation_cutoff_minutes: env::var("CANCELLATION_CUTOFF_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(240),
        }
    }
}
