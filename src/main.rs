use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use turfbook::config::AppConfig;
use turfbook::db;
use turfbook::services::payments::razorpay::RazorpayProvider;
use turfbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.razorpay_key_id.is_empty() {
        tracing::warn!("RAZORPAY_KEY_ID not set, payment endpoints will fail");
    }
    let payments = RazorpayProvider::new(
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        payments: Box::new(payments),
    });

    let app = turfbook::app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
