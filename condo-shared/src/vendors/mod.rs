/// External service contracts and their HTTP clients
///
/// Each external collaborator is reached through a trait so handlers and
/// jobs can be driven by scripted mocks in tests:
///
/// | Trait               | HTTP client             | Service |
/// |---------------------|-------------------------|---------|
/// | `FaceRecognition`   | `LuxandClient`          | biometric enrollment and search |
/// | `PlateReader`       | `PlateRecognizerClient` | license-plate recognition |
/// | `ImageHost`         | `ImgBbClient`           | durable image URLs |
/// | `PaymentProcessor`  | `StripeClient`          | payment intents |
/// | `PushNotifier`      | `FcmClient`             | device push notifications |
/// | `DocumentRenderer`  | `HttpPdfRenderer`       | HTML template to PDF |
/// | `DocumentStore`     | `CloudinaryStore`       | document storage |
///
/// All clients are built from an injected [`VendorConfig`]. A client whose
/// credentials are missing still constructs; its calls fail with
/// [`VendorError::NotConfigured`].

pub mod config;
pub mod documents;
pub mod error;
pub mod face;
pub mod image_host;
pub mod mock;
pub mod payments;
pub mod plate;
pub mod push;
pub mod retry;

pub use config::VendorConfig;
pub use documents::{CloudinaryStore, DocumentRenderer, DocumentStore, HttpPdfRenderer, StoredDocument};
pub use error::{ErrorRetryStrategy, VendorError, VendorResult};
pub use face::{FaceRecognition, LuxandClient, Photo, ProviderStatus};
pub use image_host::{ImageHost, ImgBbClient};
pub use payments::{PaymentIntent, PaymentProcessor, StripeClient};
pub use plate::{PlateCandidate, PlateReader, PlateRecognizerClient, PlateScan};
pub use push::{FcmClient, PushMessage, PushNotifier, PushReport};
pub use retry::RetryPolicy;

use std::sync::Arc;
use std::time::Duration;

/// Builds a reqwest client with a request timeout
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Handles to every external service
#[derive(Clone)]
pub struct Vendors {
    pub face: Arc<dyn FaceRecognition>,
    pub plates: Arc<dyn PlateReader>,
    pub images: Arc<dyn ImageHost>,
    pub payments: Arc<dyn PaymentProcessor>,
    pub push: Arc<dyn PushNotifier>,
    pub renderer: Arc<dyn DocumentRenderer>,
    pub documents: Arc<dyn DocumentStore>,
}

impl Vendors {
    /// HTTP clients for every service
    pub fn from_config(config: &VendorConfig) -> Self {
        Vendors {
            face: Arc::new(LuxandClient::new(config)),
            plates: Arc::new(PlateRecognizerClient::new(config)),
            images: Arc::new(ImgBbClient::new(config)),
            payments: Arc::new(StripeClient::new(config)),
            push: Arc::new(FcmClient::new(config)),
            renderer: Arc::new(HttpPdfRenderer::new(config)),
            documents: Arc::new(CloudinaryStore::new(config)),
        }
    }
}
