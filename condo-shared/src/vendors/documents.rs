/// Document rendering and storage
///
/// Contract PDFs are produced in two steps: a named HTML template is filled
/// from a JSON context and converted to PDF by an HTTP renderer, then the
/// bytes are uploaded to Cloudinary as a raw asset.

use super::config::VendorConfig;
use super::error::{check_status, VendorError, VendorResult};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

const RENDERER: &str = "pdf_renderer";
const STORE: &str = "cloudinary";

/// Template for purchase/lease contracts
pub const TEMPLATE_CONTRATO: &str = "contrato";

#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Renders a named template to PDF bytes
    async fn render(&self, template: &str, context: &JsonValue) -> VendorResult<Bytes>;
}

/// Where a stored document lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub url: String,
    pub public_id: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn store(&self, data: Bytes, public_id: &str) -> VendorResult<StoredDocument>;
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn field(context: &JsonValue, key: &str) -> String {
    match context.get(key) {
        Some(JsonValue::String(s)) => escape(s),
        Some(JsonValue::Null) | None => "-".to_string(),
        Some(other) => escape(&other.to_string()),
    }
}

/// Fills a named HTML template from `context`
pub fn render_html(template: &str, context: &JsonValue) -> VendorResult<String> {
    match template {
        TEMPLATE_CONTRATO => Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Contrato {id}</title></head>
<body>
<h1>Contrato de Unidad</h1>
<p>Fecha del contrato: {fecha}</p>
<p>Propietario: {propietario} (CI {ci})</p>
<p>Unidad: {unidad} - N.º {numero}, {bloque}</p>
<p>Cuota mensual: {cuota}</p>
<p>Costo de compra: {costo}</p>
<p>Estado: {estado}</p>
</body>
</html>
"#,
            id = field(context, "id"),
            fecha = field(context, "fecha_contrato"),
            propietario = field(context, "propietario_nombre"),
            ci = field(context, "propietario_ci"),
            unidad = field(context, "unidad_codigo"),
            numero = field(context, "unidad_numero"),
            bloque = field(context, "bloque_nombre"),
            cuota = field(context, "cuota_mensual"),
            costo = field(context, "costo_compra"),
            estado = field(context, "estado"),
        )),
        other => Err(VendorError::Rejected {
            vendor: RENDERER,
            message: format!("unknown template '{}'", other),
        }),
    }
}

/// Posts rendered HTML to a conversion service and returns the PDF
pub struct HttpPdfRenderer {
    http: reqwest::Client,
    url: Option<String>,
}

impl HttpPdfRenderer {
    pub fn new(config: &VendorConfig) -> Self {
        HttpPdfRenderer {
            http: super::http_client(config.timeout),
            url: config.pdf_renderer_url.clone(),
        }
    }
}

#[async_trait]
impl DocumentRenderer for HttpPdfRenderer {
    async fn render(&self, template: &str, context: &JsonValue) -> VendorResult<Bytes> {
        let url = self.url.as_deref().ok_or(VendorError::NotConfigured(RENDERER))?;
        let html = render_html(template, context)?;

        let response = self
            .http
            .post(url)
            .header("content-type", "text/html; charset=utf-8")
            .body(html)
            .send()
            .await
            .map_err(|e| VendorError::from_reqwest(RENDERER, e))?;

        let pdf = check_status(RENDERER, response)
            .await?
            .bytes()
            .await
            .map_err(|e| VendorError::from_reqwest(RENDERER, e))?;

        if pdf.is_empty() {
            return Err(VendorError::decode(RENDERER, "empty document"));
        }
        Ok(pdf)
    }
}

pub struct CloudinaryStore {
    http: reqwest::Client,
    base_url: String,
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
}

/// Signs upload parameters (sorted `k=v` joined by `&`, secret appended)
pub fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryStore {
    pub fn new(config: &VendorConfig) -> Self {
        CloudinaryStore {
            http: super::http_client(config.timeout),
            base_url: config.cloudinary_base_url.trim_end_matches('/').to_string(),
            cloud_name: config.cloudinary_cloud_name.clone(),
            api_key: config.cloudinary_api_key.clone(),
            api_secret: config.cloudinary_api_secret.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[async_trait]
impl DocumentStore for CloudinaryStore {
    async fn store(&self, data: Bytes, public_id: &str) -> VendorResult<StoredDocument> {
        let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            self.cloud_name.as_deref(),
            self.api_key.as_deref(),
            self.api_secret.as_deref(),
        ) else {
            return Err(VendorError::NotConfigured(STORE));
        };

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(&[("public_id", public_id), ("timestamp", &timestamp)], api_secret);

        let file = Part::bytes(data.to_vec())
            .file_name(format!("{}.pdf", public_id))
            .mime_str("application/pdf")
            .map_err(|e| VendorError::decode(STORE, e.to_string()))?;

        let form = Form::new()
            .part("file", file)
            .text("public_id", public_id.to_string())
            .text("timestamp", timestamp)
            .text("api_key", api_key.to_string())
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .http
            .post(format!("{}/v1_1/{}/raw/upload", self.base_url, cloud_name))
            .multipart(form)
            .send()
            .await
            .map_err(|e| VendorError::from_reqwest(STORE, e))?;

        let body: UploadResponse = check_status(STORE, response)
            .await?
            .json()
            .await
            .map_err(|e| VendorError::decode(STORE, e.to_string()))?;

        Ok(StoredDocument {
            url: body.secure_url,
            public_id: body.public_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_signature_is_order_independent() {
        let a = sign(&[("timestamp", "1700000000"), ("public_id", "contratos/1")], "secret");
        let b = sign(&[("public_id", "contratos/1"), ("timestamp", "1700000000")], "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        let mut hasher = Sha256::new();
        hasher.update(b"public_id=contratos/1&timestamp=1700000000secret");
        assert_eq!(a, hex::encode(hasher.finalize()));
    }

    #[test]
    fn test_render_contrato_escapes_values() {
        let html = render_html(
            TEMPLATE_CONTRATO,
            &json!({
                "propietario_nombre": "Ana <b>Rojas</b>",
                "cuota_mensual": "350.00",
                "costo_compra": null
            }),
        )
        .unwrap();

        assert!(html.contains("Ana &lt;b&gt;Rojas&lt;/b&gt;"));
        assert!(html.contains("Cuota mensual: 350.00"));
        assert!(html.contains("Costo de compra: -"));
    }

    #[test]
    fn test_unknown_template() {
        let err = render_html("recibo", &json!({})).unwrap_err();
        assert!(matches!(err, VendorError::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_renderer_returns_pdf_bytes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/render")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body("%PDF-1.4 fake")
            .create_async()
            .await;

        let renderer = HttpPdfRenderer::new(&VendorConfig {
            pdf_renderer_url: Some(format!("{}/render", server.url())),
            ..Default::default()
        });

        let pdf = renderer.render(TEMPLATE_CONTRATO, &json!({})).await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_store_uploads_raw_asset() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1_1/condominio/raw/upload")
            .with_status(200)
            .with_body(r#"{"secure_url":"https://res.cloudinary.com/condominio/raw/upload/contratos/1.pdf","public_id":"contratos/1"}"#)
            .create_async()
            .await;

        let store = CloudinaryStore::new(&VendorConfig {
            cloudinary_cloud_name: Some("condominio".to_string()),
            cloudinary_api_key: Some("key".to_string()),
            cloudinary_api_secret: Some("secret".to_string()),
            cloudinary_base_url: server.url(),
            ..Default::default()
        });

        let stored = store
            .store(Bytes::from_static(b"%PDF-1.4"), "contratos/1")
            .await
            .unwrap();
        assert_eq!(stored.public_id, "contratos/1");
        assert!(stored.url.ends_with("contratos/1.pdf"));
    }
}
