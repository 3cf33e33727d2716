/// Image hosting (ImgBB)
///
/// Uploaded photos are hosted here first so every other vendor and the
/// database only ever see a durable URL.

use super::config::VendorConfig;
use super::error::{check_status, VendorError, VendorResult};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value as JsonValue;

const VENDOR: &str = "imgbb";

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads an image and returns its public URL
    async fn upload(&self, data: Bytes, filename: &str) -> VendorResult<String>;
}

pub struct ImgBbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ImgBbClient {
    pub fn new(config: &VendorConfig) -> Self {
        ImgBbClient {
            http: super::http_client(config.timeout),
            base_url: config.imgbb_base_url.trim_end_matches('/').to_string(),
            api_key: config.imgbb_api_key.clone(),
        }
    }
}

#[async_trait]
impl ImageHost for ImgBbClient {
    async fn upload(&self, data: Bytes, filename: &str) -> VendorResult<String> {
        let api_key = self.api_key.as_deref().ok_or(VendorError::NotConfigured(VENDOR))?;

        let form = Form::new()
            .text("key", api_key.to_string())
            .part("image", Part::bytes(data.to_vec()).file_name(filename.to_string()));

        let response = self
            .http
            .post(format!("{}/1/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| VendorError::from_reqwest(VENDOR, e))?;

        let body: JsonValue = check_status(VENDOR, response)
            .await?
            .json()
            .await
            .map_err(|e| VendorError::decode(VENDOR, e.to_string()))?;

        body.pointer("/data/url")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| VendorError::decode(VENDOR, "response has no data.url"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_returns_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/1/upload")
            .with_status(200)
            .with_body(r#"{"data":{"url":"https://i.ibb.co/abc/foto.jpg"},"success":true}"#)
            .create_async()
            .await;

        let config = VendorConfig {
            imgbb_api_key: Some("key".to_string()),
            imgbb_base_url: server.url(),
            ..Default::default()
        };

        let url = ImgBbClient::new(&config)
            .upload(Bytes::from_static(b"jpeg"), "foto.jpg")
            .await
            .unwrap();
        assert_eq!(url, "https://i.ibb.co/abc/foto.jpg");
    }

    #[tokio::test]
    async fn test_upload_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/1/upload")
            .with_status(400)
            .with_body(r#"{"error":{"message":"Invalid API v1 key."}}"#)
            .create_async()
            .await;

        let config = VendorConfig {
            imgbb_api_key: Some("bad".to_string()),
            imgbb_base_url: server.url(),
            ..Default::default()
        };

        let err = ImgBbClient::new(&config)
            .upload(Bytes::from_static(b"jpeg"), "foto.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, VendorError::Permanent { status: 400, .. }));
    }
}
