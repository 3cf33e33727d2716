/// Face recognition vendor (Luxand)
///
/// # Endpoints
///
/// | Operation   | Request |
/// |-------------|---------|
/// | enroll      | `POST /v2/person` (`photos`, `name`, `store=1`, `collections`) |
/// | add photo   | `POST /v2/person/{uuid}` (`photo`, `store=1`) |
/// | search      | `POST /photo/search/v2` (`photo`, `gallery`) |
/// | check       | `GET /v2/person` |
///
/// Photos are sent either as a URL in a text field or as an uploaded file.
/// All requests carry the `token` header.

use super::config::VendorConfig;
use super::error::{check_status, VendorError, VendorResult};
use super::retry::RetryPolicy;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde_json::Value as JsonValue;

const VENDOR: &str = "luxand";

/// Message Luxand uses when an enrollment photo has no face
const NO_FACE_MESSAGE: &str = "Can't find faces";

/// Characters of the vendor body kept in a connectivity report
const CHECK_BODY_LIMIT: usize = 200;

/// Outcome of a connectivity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    /// HTTP status the vendor answered with
    pub status_code: u16,
    /// Start of the response body
    pub body: String,
}

impl ProviderStatus {
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}

/// Image sent to the vendor
#[derive(Debug, Clone)]
pub enum Photo {
    /// Publicly reachable image URL
    Url(String),
    /// Uploaded image
    File {
        data: Bytes,
        filename: String,
        content_type: String,
    },
}

impl Photo {
    fn into_part(self, form: Form, field: &'static str) -> VendorResult<Form> {
        match self {
            Photo::Url(url) => Ok(form.text(field, url)),
            Photo::File {
                data,
                filename,
                content_type,
            } => {
                let part = Part::bytes(data.to_vec())
                    .file_name(filename)
                    .mime_str(&content_type)
                    .map_err(|e| VendorError::decode(VENDOR, e.to_string()))?;
                Ok(form.part(field, part))
            }
        }
    }
}

#[async_trait]
pub trait FaceRecognition: Send + Sync {
    /// Enrolls a person and returns the vendor UUID
    async fn enroll(&self, name: &str, photo: Photo, collection: &str) -> VendorResult<String>;

    /// Adds another photo to an enrolled person
    async fn add_photo(&self, uuid: &str, photo: Photo) -> VendorResult<JsonValue>;

    /// Searches a gallery; the raw response is returned for reconciliation
    async fn search(&self, photo: Photo, gallery: &str) -> VendorResult<JsonValue>;

    /// Lists persons once to confirm the token and network path work
    async fn check(&self) -> VendorResult<ProviderStatus>;
}

pub struct LuxandClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    policy: RetryPolicy,
}

impl LuxandClient {
    pub fn new(config: &VendorConfig) -> Self {
        LuxandClient {
            http: super::http_client(config.timeout),
            base_url: config.luxand_base_url.trim_end_matches('/').to_string(),
            token: config.luxand_token.clone(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn token(&self) -> VendorResult<&str> {
        self.token.as_deref().ok_or(VendorError::NotConfigured(VENDOR))
    }

    async fn post_form(&self, path: &str, form: Form) -> VendorResult<JsonValue> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("token", self.token()?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VendorError::from_reqwest(VENDOR, e))?;

        check_status(VENDOR, response)
            .await?
            .json::<JsonValue>()
            .await
            .map_err(|e| VendorError::decode(VENDOR, e.to_string()))
    }

    async fn enroll_once(&self, name: &str, photo: Photo, collection: &str) -> VendorResult<JsonValue> {
        let mut form = photo
            .into_part(Form::new(), "photos")?
            .text("name", name.to_string())
            .text("store", "1");
        if !collection.is_empty() {
            form = form.text("collections", collection.to_string());
        }
        self.post_form("/v2/person", form).await
    }

    async fn add_photo_once(&self, uuid: &str, photo: Photo) -> VendorResult<JsonValue> {
        let form = photo.into_part(Form::new(), "photo")?.text("store", "1");
        self.post_form(&format!("/v2/person/{}", uuid), form).await
    }

    async fn search_once(&self, photo: Photo, gallery: &str) -> VendorResult<JsonValue> {
        let mut form = photo.into_part(Form::new(), "photo")?;
        if !gallery.is_empty() {
            form = form.text("gallery", gallery.to_string());
        }
        self.post_form("/photo/search/v2", form).await
    }
}

/// Extracts the UUID from an enrollment response
fn parse_enrollment(body: &JsonValue) -> VendorResult<String> {
    if body.get("status").and_then(JsonValue::as_str) == Some("failure") {
        let message = body
            .get("message")
            .and_then(JsonValue::as_str)
            .unwrap_or("Unknown error")
            .to_string();

        if message.contains(NO_FACE_MESSAGE) {
            return Err(VendorError::NoFaceDetected);
        }
        return Err(VendorError::Rejected {
            vendor: VENDOR,
            message,
        });
    }

    body.get("uuid")
        .and_then(JsonValue::as_str)
        .filter(|uuid| !uuid.is_empty())
        .map(str::to_string)
        .ok_or_else(|| VendorError::decode(VENDOR, "enrollment response has no uuid"))
}

#[async_trait]
impl FaceRecognition for LuxandClient {
    // Enrollment and photo uploads create vendor state, so they are never resent.
    async fn enroll(&self, name: &str, photo: Photo, collection: &str) -> VendorResult<String> {
        let body = self.enroll_once(name, photo, collection).await?;
        parse_enrollment(&body)
    }

    async fn add_photo(&self, uuid: &str, photo: Photo) -> VendorResult<JsonValue> {
        self.add_photo_once(uuid, photo).await
    }

    async fn search(&self, photo: Photo, gallery: &str) -> VendorResult<JsonValue> {
        self.token()?;
        self.policy
            .execute("luxand search", || self.search_once(photo.clone(), gallery))
            .await
    }

    async fn check(&self) -> VendorResult<ProviderStatus> {
        let response = self
            .http
            .get(format!("{}/v2/person", self.base_url))
            .header("token", self.token()?)
            .send()
            .await
            .map_err(|e| VendorError::from_reqwest(VENDOR, e))?;

        let status_code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| VendorError::from_reqwest(VENDOR, e))?;

        Ok(ProviderStatus {
            status_code,
            body: body.chars().take(CHECK_BODY_LIMIT).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use std::time::Duration;

    fn client(server: &mockito::ServerGuard) -> LuxandClient {
        let config = VendorConfig {
            luxand_token: Some("test-token".to_string()),
            luxand_base_url: server.url(),
            ..Default::default()
        };
        LuxandClient::new(&config).with_retry_policy(RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn test_enroll_returns_uuid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/person")
            .match_header("token", "test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"success","uuid":"abc-123"}"#)
            .expect(1)
            .create_async()
            .await;

        let uuid = client(&server)
            .enroll("Ana Rojas", Photo::Url("https://i.ibb.co/x.jpg".into()), "condominio")
            .await
            .unwrap();

        assert_eq!(uuid, "abc-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_enroll_without_face() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/person")
            .with_status(200)
            .with_body(r#"{"status":"failure","message":"Can't find faces on the image"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .enroll("Ana Rojas", Photo::Url("https://i.ibb.co/x.jpg".into()), "")
            .await
            .unwrap_err();

        assert!(matches!(err, VendorError::NoFaceDetected));
    }

    #[tokio::test]
    async fn test_enroll_not_resent_on_service_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let unavailable = server
            .mock("POST", "/v2/person")
            .with_status(503)
            .with_body("busy")
            .expect(1)
            .create_async()
            .await;

        let err = client(&server)
            .enroll("Ana Rojas", Photo::Url("https://i.ibb.co/x.jpg".into()), "condominio")
            .await
            .unwrap_err();

        assert!(matches!(err, VendorError::Transient { .. }));
        unavailable.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_photo_not_resent_on_service_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let unavailable = server
            .mock("POST", "/v2/person/abc-123")
            .with_status(502)
            .expect(1)
            .create_async()
            .await;

        let err = client(&server)
            .add_photo("abc-123", Photo::Url("https://i.ibb.co/x.jpg".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, VendorError::Transient { .. }));
        unavailable.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_retries_service_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let unavailable = server
            .mock("POST", "/photo/search/v2")
            .with_status(503)
            .with_body("busy")
            .expect(2)
            .create_async()
            .await;

        let err = client(&server)
            .with_retry_policy(RetryPolicy {
                max_attempts: 2,
                initial_backoff: Duration::from_millis(1),
            })
            .search(Photo::Url("https://i.ibb.co/x.jpg".into()), "condominio")
            .await
            .unwrap_err();

        assert!(matches!(err, VendorError::Transient { .. }));
        unavailable.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_returns_raw_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/photo/search/v2")
            .match_body(Matcher::Regex("condominio".to_string()))
            .with_status(200)
            .with_body(r#"[{"uuid":"abc-123","probability":0.97}]"#)
            .create_async()
            .await;

        let body = client(&server)
            .search(Photo::Url("https://i.ibb.co/x.jpg".into()), "condominio")
            .await
            .unwrap();

        assert_eq!(body, json!([{ "uuid": "abc-123", "probability": 0.97 }]));
    }

    #[tokio::test]
    async fn test_check_reports_status_and_truncated_body() {
        let mut server = mockito::Server::new_async().await;
        let persons = server
            .mock("GET", "/v2/person")
            .match_header("token", "test-token")
            .with_status(200)
            .with_body("x".repeat(500))
            .expect(1)
            .create_async()
            .await;

        let status = client(&server).check().await.unwrap();

        assert!(status.is_ok());
        assert_eq!(status.body.len(), 200);
        persons.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_keeps_vendor_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v2/person")
            .with_status(401)
            .with_body(r#"{"status":"failure","message":"invalid token"}"#)
            .expect(1)
            .create_async()
            .await;

        let status = client(&server).check().await.unwrap();

        assert!(!status.is_ok());
        assert_eq!(status.status_code, 401);
        assert!(status.body.contains("invalid token"));
    }

    #[tokio::test]
    async fn test_missing_token() {
        let client = LuxandClient::new(&VendorConfig::default());
        let err = client
            .search(Photo::Url("https://i.ibb.co/x.jpg".into()), "")
            .await
            .unwrap_err();
        assert!(matches!(err, VendorError::NotConfigured("luxand")));

        let err = client.check().await.unwrap_err();
        assert!(matches!(err, VendorError::NotConfigured("luxand")));
    }
}
