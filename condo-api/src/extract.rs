/// Request extractor for endpoints that take an image
///
/// Recognition, enrollment and ALPR endpoints accept either a JSON body
/// (`{"image_url": "...", "umbral": 0.8}`) or a `multipart/form-data` upload.
/// [`ImageForm`] reads both shapes into text fields plus uploaded files keyed
/// by field name.

use crate::error::{ApiError, ApiResult};
use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use bytes::Bytes;
use condo_shared::vendors::Photo;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Largest accepted image
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Smallest image accepted for enrollment
pub const MIN_ENROLL_BYTES: usize = 1024;

/// A file part of a multipart request
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub data: Bytes,
    pub filename: String,
    pub content_type: String,
}

impl UploadedFile {
    /// Checks the content type is `image/*` and the size is within bounds
    pub fn validate_image(&self, field: &str, min_bytes: usize) -> ApiResult<()> {
        if !self.content_type.starts_with("image/") {
            return Err(ApiError::field(field, "El archivo debe ser una imagen."));
        }
        if self.data.len() > MAX_IMAGE_BYTES {
            return Err(ApiError::field(
                field,
                "La imagen es demasiado grande. Máximo 10MB.",
            ));
        }
        if self.data.len() < min_bytes {
            return Err(ApiError::field(
                field,
                "La imagen es demasiado pequeña. Mínimo 1KB.",
            ));
        }
        Ok(())
    }

    pub fn into_photo(self) -> Photo {
        Photo::File {
            data: self.data,
            filename: self.filename,
            content_type: self.content_type,
        }
    }
}

/// Text fields and files of a JSON or multipart request
#[derive(Debug, Default)]
pub struct ImageForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl ImageForm {
    /// Non-blank text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Removes the first file present under any of `names`
    pub fn take_file(&mut self, names: &[&str]) -> Option<UploadedFile> {
        names.iter().find_map(|name| self.files.remove(*name))
    }

    /// Optional `f64` field; malformed values are a validation error
    pub fn number(&self, name: &str) -> ApiResult<Option<f64>> {
        self.text(name)
            .map(|raw| {
                raw.parse::<f64>()
                    .map_err(|_| ApiError::field(name.to_string(), "Debe ser un número."))
            })
            .transpose()
    }

    /// Optional UUID field; malformed values are a validation error
    pub fn uuid(&self, name: &str) -> ApiResult<Option<uuid::Uuid>> {
        self.text(name)
            .map(|raw| {
                raw.parse::<uuid::Uuid>()
                    .map_err(|_| ApiError::field(name.to_string(), "Identificador inválido."))
            })
            .transpose()
    }

    fn from_json(value: JsonValue) -> ApiResult<Self> {
        let JsonValue::Object(map) = value else {
            return Err(ApiError::BadRequest("Se esperaba un objeto JSON".to_string()));
        };

        let fields = map
            .into_iter()
            .filter_map(|(key, value)| match value {
                JsonValue::String(s) => Some((key, s)),
                JsonValue::Number(n) => Some((key, n.to_string())),
                JsonValue::Bool(b) => Some((key, b.to_string())),
                _ => None,
            })
            .collect();

        Ok(ImageForm {
            fields,
            files: HashMap::new(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_file(mut self, name: &str, file: UploadedFile) -> Self {
        self.files.insert(name.to_string(), file);
        self
    }
}

#[async_trait]
impl<S> FromRequest<S> for ImageForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));

        if !is_multipart {
            let Json(value) = Json::<JsonValue>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            return ImageForm::from_json(value);
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let mut form = ImageForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    form.files.insert(
                        name,
                        UploadedFile {
                            data,
                            filename,
                            content_type,
                        },
                    );
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }
}
