use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use palmera_core::payment::{PaymentGateway, PaymentIntent, PaymentIntentStatus};
use sha2::Sha256;
use std::time::Duration;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

const STRIPE_API_URL: &str = "https://api.stripe.com/v1";

/// Reject webhook signatures whose timestamp is older than this.
pub const SIGNATURE_TOLERANCE: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("payment provider returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Talks to the Stripe payment-intent API over its form-encoded surface.
pub struct StripeGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("palmera-pipeline/0.1")
            .build()?;
        Ok(Self {
            client,
            base_url: STRIPE_API_URL.to_string(),
            secret_key: secret_key.into(),
        })
    }

    /// Points the client at a different API root, for tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn parse_intent(&self, response: reqwest::Response) -> Result<PaymentIntent, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        description: Option<&str>,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        let amount = amount.to_string();
        let mut form: Vec<(&str, &str)> = vec![
            ("amount", amount.as_str()),
            ("currency", currency),
            ("automatic_payment_methods[enabled]", "true"),
        ];
        if let Some(description) = description {
            form.push(("description", description));
        }

        let response = self
            .client
            .post(format!("{}/payment_intents", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&form)
            .send()
            .await
            .map_err(GatewayError::Http)?;
        Ok(self.parse_intent(response).await?)
    }

    async fn get_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        let response = self
            .client
            .get(format!("{}/payment_intents/{}", self.base_url, intent_id))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await
            .map_err(GatewayError::Http)?;
        Ok(self.parse_intent(response).await?)
    }
}

/// Stand-in gateway for environments without Stripe credentials.
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        _description: Option<&str>,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        let id = format!("pi_mock_{}", Uuid::new_v4().simple());
        Ok(PaymentIntent {
            client_secret: Some(format!("{id}_secret_mock")),
            id,
            amount,
            currency: currency.to_string(),
            status: PaymentIntentStatus::RequiresPaymentMethod,
        })
    }

    async fn get_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PaymentIntent {
            id: intent_id.to_string(),
            amount: 0,
            currency: "usd".to_string(),
            status: PaymentIntentStatus::Succeeded,
            client_secret: None,
        })
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("signature header is malformed")]
    Malformed,
    #[error("signature timestamp is outside the accepted window")]
    Stale,
    #[error("signature does not match the payload")]
    Mismatch,
}

/// Verifies a `Stripe-Signature` header (`t=...,v1=...`) against the raw
/// request body. The comparison runs through the MAC itself, so it is
/// constant-time with respect to the signature bytes.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let mut timestamp: Option<i64> = None;
    let mut candidates: Vec<&str> = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(SignatureError::Malformed);
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => candidates.push(value),
            // Older scheme versions are ignored.
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if candidates.is_empty() {
        return Err(SignatureError::Malformed);
    }

    let age = now.timestamp().saturating_sub(timestamp).unsigned_abs();
    if age > tolerance.as_secs() {
        return Err(SignatureError::Stale);
    }

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Malformed)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    for candidate in candidates {
        let Ok(bytes) = hex::decode(candidate) else {
            continue;
        };
        if mac.clone().verify_slice(&bytes).is_ok() {
            return Ok(());
        }
    }
    Err(SignatureError::Mismatch)
}
