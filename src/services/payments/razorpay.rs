use anyhow::Context;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use super::{PaymentOrder, PaymentProvider};

pub struct RazorpayProvider {
    key_id: String,
    key_secret: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
}

impl RazorpayProvider {
    pub fn new(key_id: String, key_secret: String) -> Self {
        Self {
            key_id,
            key_secret,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PaymentProvider for RazorpayProvider {
    async fn create_order(
        &self,
        booking_id: &str,
        amount: i64,
        currency: &str,
    ) -> anyhow::Result<PaymentOrder> {
        let body = serde_json::json!({
            "amount": amount,
            "currency": currency,
            "receipt": booking_id,
        });

        let response: OrderResponse = self
            .client
            .post("https://api.razorpay.com/v1/orders")
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .context("failed to reach payment gateway")?
            .error_for_status()
            .context("payment gateway rejected order creation")?
            .json()
            .await
            .context("failed to parse payment gateway response")?;

        Ok(PaymentOrder {
            order_id: response.id,
            amount: response.amount,
            currency: response.currency,
        })
    }

    // Hex-encoded HMAC-SHA256 over "order_id|payment_id", keyed by the
    // API secret.
    fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(self.key_secret.as_bytes()) else {
            return false;
        };
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());
        expected == signature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> RazorpayProvider {
        RazorpayProvider::new("rzp_test_key".to_string(), "secret".to_string())
    }

    fn sign(secret: &str, order_id: &str, payment_id: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{order_id}|{payment_id}").as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_verify_accepts_valid_signature() {
        let p = provider();
        let sig = sign("secret", "order_1", "pay_1");
        assert!(p.verify_signature("order_1", "pay_1", &sig));
    }

    #[test]
    fn test_verify_rejects_tampered_signature() {
        let p = provider();
        let sig = sign("secret", "order_1", "pay_1");
        assert!(!p.verify_signature("order_1", "pay_2", &sig));
        assert!(!p.verify_signature("order_1", "pay_1", "deadbeef"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let p = provider();
        let sig = sign("other-secret", "order_1", "pay_1");
        assert!(!p.verify_signature("order_1", "pay_1", &sig));
    }
}
