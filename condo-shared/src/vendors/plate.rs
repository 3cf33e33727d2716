/// License-plate recognition vendor (Plate Recognizer)
///
/// A single multipart `POST` with the frame in `upload`. Rate limiting (429)
/// is retried once after a short pause; both 200 and 201 count as success.

use super::config::VendorConfig;
use super::error::{VendorError, VendorResult};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const VENDOR: &str = "plate_recognizer";

/// A plate read from the frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateCandidate {
    #[serde(default)]
    pub plate: String,
    #[serde(default)]
    pub score: f64,
}

/// Frame submitted for recognition
#[derive(Debug, Clone)]
pub struct PlateScan {
    pub image: Bytes,
    pub filename: String,
    pub content_type: String,
    pub regions: String,
    pub camera_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScanResponse {
    #[serde(default)]
    results: Vec<PlateCandidate>,
}

#[async_trait]
pub trait PlateReader: Send + Sync {
    /// Returns every plate read from the frame, in vendor order
    async fn scan(&self, scan: PlateScan) -> VendorResult<Vec<PlateCandidate>>;
}

pub struct PlateRecognizerClient {
    http: reqwest::Client,
    url: String,
    token: Option<String>,
    rate_limit_pause: Duration,
}

impl PlateRecognizerClient {
    pub fn new(config: &VendorConfig) -> Self {
        PlateRecognizerClient {
            http: super::http_client(config.plate_timeout),
            url: config.plate_base_url.clone(),
            token: config.plate_token.clone(),
            rate_limit_pause: Duration::from_secs(1),
        }
    }

    pub fn with_rate_limit_pause(mut self, pause: Duration) -> Self {
        self.rate_limit_pause = pause;
        self
    }

    async fn send(&self, token: &str, scan: &PlateScan) -> VendorResult<reqwest::Response> {
        let part = Part::bytes(scan.image.to_vec())
            .file_name(scan.filename.clone())
            .mime_str(&scan.content_type)
            .map_err(|e| VendorError::decode(VENDOR, e.to_string()))?;

        let mut form = Form::new().part("upload", part).text("regions", scan.regions.clone());
        if let Some(camera_id) = scan.camera_id.as_ref().filter(|c| !c.is_empty()) {
            form = form.text("camera_id", camera_id.clone());
        }

        self.http
            .post(&self.url)
            .header("Authorization", format!("Token {}", token))
            .multipart(form)
            .send()
            .await
            .map_err(|e| VendorError::from_reqwest(VENDOR, e))
    }
}

#[async_trait]
impl PlateReader for PlateRecognizerClient {
    async fn scan(&self, scan: PlateScan) -> VendorResult<Vec<PlateCandidate>> {
        let token = self.token.as_deref().ok_or(VendorError::NotConfigured(VENDOR))?;

        let mut response = self.send(token, &scan).await?;
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(pause = ?self.rate_limit_pause, "Plate reader rate limited, retrying once");
            tokio::time::sleep(self.rate_limit_pause).await;
            response = self.send(token, &scan).await?;
        }

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(VendorError::from_status(VENDOR, status, body));
        }

        let body: ScanResponse = response
            .json()
            .await
            .map_err(|e| VendorError::decode(VENDOR, e.to_string()))?;

        Ok(body.results)
    }
}

/// Highest-scoring candidate; ties keep the earliest read
pub fn best_candidate(candidates: &[PlateCandidate]) -> Option<&PlateCandidate> {
    // max_by returns the last maximum, so walk the list backwards
    candidates
        .iter()
        .rev()
        .max_by(|a, b| a.score.total_cmp(&b.score))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan() -> PlateScan {
        PlateScan {
            image: Bytes::from_static(b"\xff\xd8\xff\xe0fake-jpeg"),
            filename: "frame.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            regions: "bo".to_string(),
            camera_id: Some("porton-1".to_string()),
        }
    }

    fn client(server: &mockito::ServerGuard) -> PlateRecognizerClient {
        let config = VendorConfig {
            plate_token: Some("plate-token".to_string()),
            plate_base_url: format!("{}/v1/plate-reader/", server.url()),
            ..Default::default()
        };
        PlateRecognizerClient::new(&config).with_rate_limit_pause(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_scan_accepts_created() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/plate-reader/")
            .match_header("authorization", "Token plate-token")
            .with_status(201)
            .with_body(r#"{"results":[{"plate":"abc123","score":0.91},{"plate":"abc128","score":0.42}]}"#)
            .create_async()
            .await;

        let results = client(&server).scan(scan()).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(best_candidate(&results).unwrap().plate, "abc123");
    }

    #[test]
    fn test_best_candidate_tie_keeps_first() {
        let candidates = vec![
            PlateCandidate { plate: "abc123".to_string(), score: 0.42 },
            PlateCandidate { plate: "2345abc".to_string(), score: 0.88 },
            PlateCandidate { plate: "2345abd".to_string(), score: 0.88 },
        ];
        assert_eq!(best_candidate(&candidates).unwrap().plate, "2345abc");
    }

    #[tokio::test]
    async fn test_rate_limit_retried_once() {
        let mut server = mockito::Server::new_async().await;
        let limited = server
            .mock("POST", "/v1/plate-reader/")
            .with_status(429)
            .expect(2)
            .create_async()
            .await;

        let err = client(&server).scan(scan()).await.unwrap_err();
        assert!(matches!(err, VendorError::Transient { .. }));
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_results() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/plate-reader/")
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let results = client(&server).scan(scan()).await.unwrap();
        assert!(results.is_empty());
        assert!(best_candidate(&results).is_none());
    }
}
