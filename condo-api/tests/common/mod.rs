/// Common test utilities for integration tests

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use condo_api::{app::build_router, app::AppState, config::Config};
use condo_shared::db::pool::create_lazy_pool;
use condo_shared::recognition::{Identity, InMemoryDirectory};
use condo_shared::vendors::mock::{MockFaceRecognition, MockVendors};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Vendor UUID of the seeded resident
pub const RESIDENTE_UUID: &str = "lx-residente";

/// Vendor UUID of the seeded guard
pub const GUARDIA_UUID: &str = "lx-guardia";

/// Test context with an app wired to scripted vendors
///
/// The pool connects lazily, so tests that never reach the database run
/// without one.
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
    pub mocks: MockVendors,
    pub residente: Identity,
    pub guardia: Identity,
}

impl TestContext {
    /// Creates a context with default mocks
    pub fn new() -> anyhow::Result<Self> {
        Self::with_mocks(MockVendors::default())
    }

    /// Creates a context whose face vendor answers searches with `body`
    pub fn with_search_response(body: JsonValue) -> anyhow::Result<Self> {
        Self::with_mocks(MockVendors {
            face: Arc::new(MockFaceRecognition::new().with_search_response(body)),
            ..MockVendors::default()
        })
    }

    pub fn with_mocks(mocks: MockVendors) -> anyhow::Result<Self> {
        let config = Config::for_tests();
        let db = create_lazy_pool(&config.database)?;

        let residente = Identity {
            tipo: "propietario".to_string(),
            id: Uuid::new_v4(),
            nombre: "Ana Rojas".to_string(),
        };
        let guardia = Identity {
            tipo: "empleado".to_string(),
            id: Uuid::new_v4(),
            nombre: "Luis Mamani".to_string(),
        };
        let directory = InMemoryDirectory::default()
            .with(RESIDENTE_UUID, residente.clone())
            .with(GUARDIA_UUID, guardia.clone());

        let state = AppState::new(db.clone(), config.clone(), mocks.vendors())
            .with_identities(Arc::new(directory));
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            mocks,
            residente,
            guardia,
        })
    }

    /// Sends a request and returns the status with the parsed JSON body
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, JsonValue) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(JsonValue::Null);
        (status, json)
    }

    pub async fn post_json(&self, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, JsonValue) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }
}

/// A part of a multipart body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

const BOUNDARY: &str = "condo-test-boundary";

/// Builds a `multipart/form-data` request
pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
