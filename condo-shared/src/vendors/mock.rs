/// Scripted vendor implementations for tests and local runs
///
/// Each mock returns a canned response and records what it was asked to do,
/// so callers can assert on the outgoing side effects without a network.
///
/// # Example
///
/// ```
/// use condo_shared::vendors::mock::MockFaceRecognition;
/// use serde_json::json;
///
/// let face = MockFaceRecognition::new()
///     .with_search_response(json!([{ "uuid": "abc", "probability": 0.97 }]));
/// assert_eq!(face.search_count(), 0);
/// ```

use super::documents::{DocumentRenderer, DocumentStore, StoredDocument};
use super::error::{VendorError, VendorResult};
use super::face::{FaceRecognition, Photo, ProviderStatus};
use super::image_host::ImageHost;
use super::payments::{PaymentIntent, PaymentProcessor};
use super::plate::{PlateCandidate, PlateReader, PlateScan};
use super::push::{PushMessage, PushNotifier, PushReport};
use super::Vendors;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

fn unavailable(vendor: &'static str) -> VendorError {
    VendorError::Transient {
        vendor,
        message: "scripted outage".to_string(),
    }
}

fn push_call<T>(calls: &Mutex<Vec<T>>, call: T) {
    if let Ok(mut calls) = calls.lock() {
        calls.push(call);
    }
}

fn snapshot<T: Clone>(calls: &Mutex<Vec<T>>) -> Vec<T> {
    calls.lock().map(|c| c.clone()).unwrap_or_default()
}

/// Face recognition returning a fixed UUID and search body
pub struct MockFaceRecognition {
    /// `None` makes enrollment fail with no face detected
    enroll_uuid: Option<String>,
    search_response: JsonValue,
    fail_search: bool,
    fail_check: bool,
    /// (name, collection)
    enrollments: Mutex<Vec<(String, String)>>,
    /// (uuid)
    added_photos: Mutex<Vec<String>>,
    /// (gallery)
    searches: Mutex<Vec<String>>,
}

impl Default for MockFaceRecognition {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFaceRecognition {
    pub fn new() -> Self {
        MockFaceRecognition {
            enroll_uuid: Some("mock-uuid".to_string()),
            search_response: json!([]),
            fail_search: false,
            fail_check: false,
            enrollments: Mutex::new(Vec::new()),
            added_photos: Mutex::new(Vec::new()),
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn with_enroll_uuid(mut self, uuid: Option<&str>) -> Self {
        self.enroll_uuid = uuid.map(str::to_string);
        self
    }

    pub fn with_search_response(mut self, body: JsonValue) -> Self {
        self.search_response = body;
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Connectivity checks fail as if the vendor were unreachable
    pub fn failing_check(mut self) -> Self {
        self.fail_check = true;
        self
    }

    pub fn enrollments(&self) -> Vec<(String, String)> {
        snapshot(&self.enrollments)
    }

    pub fn added_photos(&self) -> Vec<String> {
        snapshot(&self.added_photos)
    }

    pub fn search_count(&self) -> usize {
        snapshot(&self.searches).len()
    }

    pub fn galleries(&self) -> Vec<String> {
        snapshot(&self.searches)
    }
}

#[async_trait]
impl FaceRecognition for MockFaceRecognition {
    async fn enroll(&self, name: &str, _photo: Photo, collection: &str) -> VendorResult<String> {
        push_call(&self.enrollments, (name.to_string(), collection.to_string()));
        self.enroll_uuid.clone().ok_or(VendorError::NoFaceDetected)
    }

    async fn add_photo(&self, uuid: &str, _photo: Photo) -> VendorResult<JsonValue> {
        push_call(&self.added_photos, uuid.to_string());
        Ok(json!({ "status": "success" }))
    }

    async fn search(&self, _photo: Photo, gallery: &str) -> VendorResult<JsonValue> {
        push_call(&self.searches, gallery.to_string());
        if self.fail_search {
            return Err(unavailable("luxand"));
        }
        Ok(self.search_response.clone())
    }

    async fn check(&self) -> VendorResult<ProviderStatus> {
        if self.fail_check {
            return Err(unavailable("luxand"));
        }
        Ok(ProviderStatus {
            status_code: 200,
            body: "[]".to_string(),
        })
    }
}

/// Plate reader returning fixed candidates
#[derive(Default)]
pub struct MockPlateReader {
    candidates: Vec<PlateCandidate>,
    fail: bool,
    /// (camera_id)
    scans: Mutex<Vec<Option<String>>>,
}

impl MockPlateReader {
    pub fn new(candidates: Vec<PlateCandidate>) -> Self {
        MockPlateReader {
            candidates,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        MockPlateReader {
            fail: true,
            ..Default::default()
        }
    }

    pub fn scan_count(&self) -> usize {
        snapshot(&self.scans).len()
    }
}

#[async_trait]
impl PlateReader for MockPlateReader {
    async fn scan(&self, scan: PlateScan) -> VendorResult<Vec<PlateCandidate>> {
        push_call(&self.scans, scan.camera_id);
        if self.fail {
            return Err(unavailable("plate_recognizer"));
        }
        Ok(self.candidates.clone())
    }
}

/// Image host that "uploads" to `https://img.test/<filename>`
#[derive(Default)]
pub struct MockImageHost {
    fail: bool,
    uploads: Mutex<Vec<String>>,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        MockImageHost {
            fail: true,
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<String> {
        snapshot(&self.uploads)
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    async fn upload(&self, _data: Bytes, filename: &str) -> VendorResult<String> {
        push_call(&self.uploads, filename.to_string());
        if self.fail {
            return Err(unavailable("imgbb"));
        }
        Ok(format!("https://img.test/{}", filename))
    }
}

/// Payment processor keeping intents in memory
#[derive(Default)]
pub struct MockPaymentProcessor {
    /// Status reported by `retrieve_intent`
    retrieve_status: Option<String>,
    intents: Mutex<Vec<(String, PaymentIntent)>>,
}

impl MockPaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every retrieved intent reports `status`
    pub fn with_retrieve_status(mut self, status: &str) -> Self {
        self.retrieve_status = Some(status.to_string());
        self
    }

    /// Seeds an intent as if it had been created earlier
    pub fn with_intent(self, intent: PaymentIntent) -> Self {
        push_call(&self.intents, (format!("seed-{}", intent.id), intent));
        self
    }

    /// Idempotency keys seen so far, in order
    pub fn idempotency_keys(&self) -> Vec<String> {
        snapshot(&self.intents).into_iter().map(|(key, _)| key).collect()
    }
}

#[async_trait]
impl PaymentProcessor for MockPaymentProcessor {
    async fn create_intent(
        &self,
        amount_cents: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
        idempotency_key: &str,
    ) -> VendorResult<PaymentIntent> {
        if let Some((_, existing)) = snapshot(&self.intents)
            .into_iter()
            .find(|(key, _)| key == idempotency_key)
        {
            return Ok(existing);
        }

        let id = format!("pi_mock_{}", snapshot(&self.intents).len() + 1);
        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret", id)),
            id,
            status: "requires_payment_method".to_string(),
            amount: amount_cents,
            currency: currency.to_lowercase(),
            metadata: metadata.clone(),
        };
        push_call(&self.intents, (idempotency_key.to_string(), intent.clone()));
        Ok(intent)
    }

    async fn retrieve_intent(&self, id: &str) -> VendorResult<PaymentIntent> {
        let mut intent = snapshot(&self.intents)
            .into_iter()
            .map(|(_, intent)| intent)
            .find(|intent| intent.id == id)
            .ok_or_else(|| VendorError::Permanent {
                vendor: "stripe",
                status: 404,
                body: format!("No such payment_intent: '{}'", id),
            })?;

        if let Some(status) = &self.retrieve_status {
            intent.status = status.clone();
        }
        Ok(intent)
    }
}

/// Push notifier recording every message
#[derive(Default)]
pub struct MockPushNotifier {
    fail: bool,
    sent: Mutex<Vec<(Vec<String>, PushMessage)>>,
}

impl MockPushNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        MockPushNotifier {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(Vec<String>, PushMessage)> {
        snapshot(&self.sent)
    }
}

#[async_trait]
impl PushNotifier for MockPushNotifier {
    async fn send(&self, tokens: &[String], message: &PushMessage) -> VendorResult<PushReport> {
        if tokens.is_empty() {
            return Ok(PushReport::default());
        }
        push_call(&self.sent, (tokens.to_vec(), message.clone()));
        if self.fail {
            return Err(unavailable("fcm"));
        }
        Ok(PushReport {
            success: tokens.len() as u32,
            failure: 0,
        })
    }
}

/// Renderer returning a minimal PDF stub
#[derive(Default)]
pub struct MockDocumentRenderer {
    rendered: Mutex<Vec<(String, JsonValue)>>,
}

impl MockDocumentRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered(&self) -> Vec<(String, JsonValue)> {
        snapshot(&self.rendered)
    }
}

#[async_trait]
impl DocumentRenderer for MockDocumentRenderer {
    async fn render(&self, template: &str, context: &JsonValue) -> VendorResult<Bytes> {
        push_call(&self.rendered, (template.to_string(), context.clone()));
        Ok(Bytes::from_static(b"%PDF-1.4\n%mock\n"))
    }
}

/// Store that keeps uploads under `https://docs.test/`
#[derive(Default)]
pub struct MockDocumentStore {
    stored: Mutex<Vec<String>>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Vec<String> {
        snapshot(&self.stored)
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn store(&self, _data: Bytes, public_id: &str) -> VendorResult<StoredDocument> {
        push_call(&self.stored, public_id.to_string());
        Ok(StoredDocument {
            url: format!("https://docs.test/{}.pdf", public_id),
            public_id: public_id.to_string(),
        })
    }
}

/// Concrete handles to a full set of mocks
///
/// Keeps typed `Arc`s so tests can inspect recorded calls after handing
/// [`MockVendors::vendors`] to the code under test.
#[derive(Clone)]
pub struct MockVendors {
    pub face: Arc<MockFaceRecognition>,
    pub plates: Arc<MockPlateReader>,
    pub images: Arc<MockImageHost>,
    pub payments: Arc<MockPaymentProcessor>,
    pub push: Arc<MockPushNotifier>,
    pub renderer: Arc<MockDocumentRenderer>,
    pub documents: Arc<MockDocumentStore>,
}

impl Default for MockVendors {
    fn default() -> Self {
        MockVendors {
            face: Arc::new(MockFaceRecognition::new()),
            plates: Arc::new(MockPlateReader::default()),
            images: Arc::new(MockImageHost::new()),
            payments: Arc::new(MockPaymentProcessor::new()),
            push: Arc::new(MockPushNotifier::new()),
            renderer: Arc::new(MockDocumentRenderer::new()),
            documents: Arc::new(MockDocumentStore::new()),
        }
    }
}

impl MockVendors {
    pub fn vendors(&self) -> Vendors {
        Vendors {
            face: self.face.clone(),
            plates: self.plates.clone(),
            images: self.images.clone(),
            payments: self.payments.clone(),
            push: self.push.clone(),
            renderer: self.renderer.clone(),
            documents: self.documents.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_payment_intent_is_idempotent() {
        let payments = MockPaymentProcessor::new();
        let metadata = HashMap::from([("expensa_id".to_string(), "7".to_string())]);

        let first = payments.create_intent(1000, "USD", &metadata, "pi-expensa-7").await.unwrap();
        let second = payments.create_intent(1000, "USD", &metadata, "pi-expensa-7").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.currency, "usd");
        assert_eq!(payments.idempotency_keys(), vec!["pi-expensa-7".to_string()]);
    }

    #[tokio::test]
    async fn test_retrieve_status_override() {
        let payments = MockPaymentProcessor::new().with_retrieve_status("succeeded");
        let intent = payments
            .create_intent(500, "usd", &HashMap::new(), "k")
            .await
            .unwrap();

        let retrieved = payments.retrieve_intent(&intent.id).await.unwrap();
        assert!(retrieved.succeeded());
        assert!(payments.retrieve_intent("pi_missing").await.is_err());
    }

    #[tokio::test]
    async fn test_push_skips_empty_token_list() {
        let push = MockPushNotifier::new();
        let message = PushMessage {
            title: "t".into(),
            body: "b".into(),
            data: HashMap::new(),
        };

        push.send(&[], &message).await.unwrap();
        assert!(push.sent().is_empty());

        let report = push.send(&["a".to_string()], &message).await.unwrap();
        assert_eq!(report.success, 1);
        assert_eq!(push.sent().len(), 1);
    }
}
