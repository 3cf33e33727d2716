/// Push notifications (Firebase Cloud Messaging, HTTP API)

use super::config::VendorConfig;
use super::error::{check_status, VendorError, VendorResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

const VENDOR: &str = "fcm";

/// Notification payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    /// String key/values delivered to the app
    pub data: HashMap<String, String>,
}

/// Delivery counts reported by the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PushReport {
    #[serde(default)]
    pub success: u32,
    #[serde(default)]
    pub failure: u32,
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    /// Sends one message to every token; no tokens is a no-op
    async fn send(&self, tokens: &[String], message: &PushMessage) -> VendorResult<PushReport>;
}

pub struct FcmClient {
    http: reqwest::Client,
    base_url: String,
    server_key: Option<String>,
}

impl FcmClient {
    pub fn new(config: &VendorConfig) -> Self {
        FcmClient {
            http: super::http_client(config.timeout),
            base_url: config.fcm_base_url.trim_end_matches('/').to_string(),
            server_key: config.fcm_server_key.clone(),
        }
    }
}

#[async_trait]
impl PushNotifier for FcmClient {
    async fn send(&self, tokens: &[String], message: &PushMessage) -> VendorResult<PushReport> {
        if tokens.is_empty() {
            return Ok(PushReport::default());
        }

        let server_key = self.server_key.as_deref().ok_or(VendorError::NotConfigured(VENDOR))?;

        let payload = json!({
            "registration_ids": tokens,
            "notification": {
                "title": message.title,
                "body": message.body,
            },
            "data": message.data,
        });

        let response = self
            .http
            .post(format!("{}/fcm/send", self.base_url))
            .header("Authorization", format!("key={}", server_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| VendorError::from_reqwest(VENDOR, e))?;

        check_status(VENDOR, response)
            .await?
            .json::<PushReport>()
            .await
            .map_err(|e| VendorError::decode(VENDOR, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn message() -> PushMessage {
        PushMessage {
            title: "🔍 Objeto Encontrado".to_string(),
            body: "Se encontró 'Llaves' en Lobby. ¿Es tuyo?".to_string(),
            data: HashMap::from([("tipo".to_string(), "objeto_perdido".to_string())]),
        }
    }

    #[tokio::test]
    async fn test_empty_tokens_is_noop() {
        let client = FcmClient::new(&VendorConfig::default());
        let report = client.send(&[], &message()).await.unwrap();
        assert_eq!(report, PushReport::default());
    }

    #[tokio::test]
    async fn test_send_reports_counts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/fcm/send")
            .match_header("authorization", "key=server-key")
            .match_body(Matcher::PartialJson(json!({
                "registration_ids": ["t1", "t2"],
                "data": { "tipo": "objeto_perdido" }
            })))
            .with_status(200)
            .with_body(r#"{"multicast_id":1,"success":1,"failure":1}"#)
            .create_async()
            .await;

        let client = FcmClient::new(&VendorConfig {
            fcm_server_key: Some("server-key".to_string()),
            fcm_base_url: server.url(),
            ..Default::default()
        });

        let tokens = vec!["t1".to_string(), "t2".to_string()];
        let report = client.send(&tokens, &message()).await.unwrap();

        assert_eq!(report, PushReport { success: 1, failure: 1 });
        mock.assert_async().await;
    }
}
