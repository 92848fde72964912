pub mod razorpay;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A gateway-side payment order created for one booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    /// Amount in the smallest currency unit (paise for INR).
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a gateway order for the booking's snapshotted price.
    async fn create_order(
        &self,
        booking_id: &str,
        amount: i64,
        currency: &str,
    ) -> anyhow::Result<PaymentOrder>;

    /// Check the gateway's signature over an (order, payment) pair.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}
