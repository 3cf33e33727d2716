/// Payment processor (Stripe PaymentIntents)
///
/// Form-encoded requests with bearer auth. Intent creation carries an
/// idempotency key so client retries never create a second intent.

use super::config::VendorConfig;
use super::error::{check_status, VendorError, VendorResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const VENDOR: &str = "stripe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub status: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntent {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
        idempotency_key: &str,
    ) -> VendorResult<PaymentIntent>;

    async fn retrieve_intent(&self, id: &str) -> VendorResult<PaymentIntent>;
}

pub struct StripeClient {
    http: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
}

impl StripeClient {
    pub fn new(config: &VendorConfig) -> Self {
        StripeClient {
            http: super::http_client(config.timeout),
            base_url: config.stripe_base_url.trim_end_matches('/').to_string(),
            secret_key: config.stripe_secret_key.clone(),
        }
    }

    fn secret_key(&self) -> VendorResult<&str> {
        self.secret_key.as_deref().ok_or(VendorError::NotConfigured(VENDOR))
    }

    async fn parse(response: reqwest::Response) -> VendorResult<PaymentIntent> {
        check_status(VENDOR, response)
            .await?
            .json::<PaymentIntent>()
            .await
            .map_err(|e| VendorError::decode(VENDOR, e.to_string()))
    }
}

/// Form fields for a new intent
fn intent_form(amount_cents: i64, currency: &str, metadata: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), amount_cents.to_string()),
        ("currency".to_string(), currency.to_lowercase()),
        ("automatic_payment_methods[enabled]".to_string(), "true".to_string()),
    ];

    let mut keys: Vec<&String> = metadata.keys().collect();
    keys.sort();
    for key in keys {
        form.push((format!("metadata[{}]", key), metadata[key].clone()));
    }
    form
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
        idempotency_key: &str,
    ) -> VendorResult<PaymentIntent> {
        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.base_url))
            .bearer_auth(self.secret_key()?)
            .header("Idempotency-Key", idempotency_key)
            .form(&intent_form(amount_cents, currency, metadata))
            .send()
            .await
            .map_err(|e| VendorError::from_reqwest(VENDOR, e))?;

        Self::parse(response).await
    }

    async fn retrieve_intent(&self, id: &str) -> VendorResult<PaymentIntent> {
        let response = self
            .http
            .get(format!("{}/v1/payment_intents/{}", self.base_url, id))
            .bearer_auth(self.secret_key()?)
            .send()
            .await
            .map_err(|e| VendorError::from_reqwest(VENDOR, e))?;

        Self::parse(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::ServerGuard) -> StripeClient {
        StripeClient::new(&VendorConfig {
            stripe_secret_key: Some("sk_test_123".to_string()),
            stripe_base_url: server.url(),
            ..Default::default()
        })
    }

    #[test]
    fn test_intent_form() {
        let metadata = HashMap::from([("expensa_id".to_string(), "42".to_string())]);
        let form = intent_form(25050, "USD", &metadata);

        assert!(form.contains(&("amount".to_string(), "25050".to_string())));
        assert!(form.contains(&("currency".to_string(), "usd".to_string())));
        assert!(form.contains(&("metadata[expensa_id]".to_string(), "42".to_string())));
    }

    #[tokio::test]
    async fn test_create_intent_sends_idempotency_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/payment_intents")
            .match_header("authorization", "Bearer sk_test_123")
            .match_header("idempotency-key", "pi-expensa-42")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("amount".into(), "25050".into()),
                Matcher::UrlEncoded("metadata[expensa_id]".into(), "42".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"id":"pi_1","client_secret":"pi_1_secret","status":"requires_payment_method","amount":25050,"currency":"usd","metadata":{"expensa_id":"42"}}"#,
            )
            .create_async()
            .await;

        let metadata = HashMap::from([("expensa_id".to_string(), "42".to_string())]);
        let intent = client(&server)
            .create_intent(25050, "usd", &metadata, "pi-expensa-42")
            .await
            .unwrap();

        assert_eq!(intent.client_secret.as_deref(), Some("pi_1_secret"));
        assert!(!intent.succeeded());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retrieve_intent() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/payment_intents/pi_1")
            .with_status(200)
            .with_body(r#"{"id":"pi_1","status":"succeeded","metadata":{"expensa_id":"42"}}"#)
            .create_async()
            .await;

        let intent = client(&server).retrieve_intent("pi_1").await.unwrap();
        assert!(intent.succeeded());
        assert_eq!(intent.metadata.get("expensa_id").map(String::as_str), Some("42"));
    }
}
