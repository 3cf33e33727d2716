/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; domain, database and vendor
/// errors convert into it with `?`.
///
/// # Example
///
/// ```
/// use condo_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler() -> ApiResult<Json<Value>> {
///     let found = false;
///     if !found {
///         return Err(ApiError::NotFound("Unidad no encontrada".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use condo_shared::error::{constraint_message, DomainError};
use condo_shared::recognition::enrollment::NO_FACE_HINT;
use condo_shared::recognition::{EnrollmentError, RecognitionError};
use condo_shared::reservations::ReservationError;
use condo_shared::vendors::VendorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Request refused with a specific error code (400)
    Rejected {
        code: &'static str,
        message: String,
    },

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate CI or overlapping reservation
    Conflict(String),

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),

    /// Bad gateway (502) - a vendor refused or garbled the call
    BadGateway(String),

    /// Service unavailable (503)
    ServiceUnavailable(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    /// Single-field validation error
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Rejected { code, message } => write!(f, "Rejected ({}): {}", code, message),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::BadGateway(msg) => write!(f, "Bad gateway: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Rejected { code, message } => (StatusCode::BAD_REQUEST, code, message, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::BadGateway(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, "bad_gateway", msg, None)
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let friendly = db_err.constraint().and_then(constraint_message);

                if db_err.is_unique_violation() {
                    let message = friendly
                        .map(str::to_string)
                        .unwrap_or_else(|| "El registro ya existe".to_string());
                    return ApiError::Conflict(message);
                }

                if db_err.is_check_violation() {
                    let message = friendly
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Valor inválido: {}", db_err.constraint().unwrap_or("check")));
                    return ApiError::field("non_field_errors", message);
                }

                if db_err.is_foreign_key_violation() {
                    return ApiError::BadRequest(
                        "El registro referenciado no existe o sigue en uso".to_string(),
                    );
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { field, message } => ApiError::field(field, message),
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::NotFound(what) => ApiError::NotFound(format!("{} no encontrado", what)),
            DomainError::Database(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Valor inválido ({})", e.code));
                    ValidationErrorDetail::new(field.to_string(), message)
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<VendorError> for ApiError {
    fn from(err: VendorError) -> Self {
        match err {
            VendorError::Transient { .. } | VendorError::NotConfigured(_) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            VendorError::Permanent { .. } | VendorError::Decode { .. } => {
                ApiError::BadGateway(err.to_string())
            }
            VendorError::NoFaceDetected => ApiError::BadRequest(NO_FACE_HINT.to_string()),
            VendorError::Rejected { message, .. } => ApiError::BadRequest(message),
        }
    }
}

impl From<ReservationError> for ApiError {
    fn from(err: ReservationError) -> Self {
        match err {
            ReservationError::PastDate
            | ReservationError::InvalidDuration
            | ReservationError::AreaUnavailable { .. }
            | ReservationError::OutsideOperatingHours { .. }
            | ReservationError::PersonaNotAllowed => ApiError::field(err.field(), err.to_string()),
            ReservationError::Conflict { .. } | ReservationError::InvalidTransition { .. } => {
                ApiError::Conflict(err.to_string())
            }
            ReservationError::AreaNotFound | ReservationError::ReservaNotFound => {
                ApiError::NotFound(err.to_string())
            }
            ReservationError::Database(e) => e.into(),
        }
    }
}

impl From<EnrollmentError> for ApiError {
    fn from(err: EnrollmentError) -> Self {
        match err {
            EnrollmentError::NotFound(_) => ApiError::NotFound(err.to_string()),
            EnrollmentError::AlreadyEnrolled(_) | EnrollmentError::NoFace => {
                ApiError::BadRequest(err.to_string())
            }
            EnrollmentError::Vendor(e) => e.into(),
            EnrollmentError::Database(e) => e.into(),
        }
    }
}

impl From<RecognitionError> for ApiError {
    fn from(err: RecognitionError) -> Self {
        match err {
            RecognitionError::Vendor(message) => ApiError::Rejected {
                code: "error_luxand",
                message,
            },
            RecognitionError::Database(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Persona no encontrada".to_string());
        assert_eq!(err.to_string(), "Not found: Persona no encontrada");
    }

    #[test]
    fn test_validation_error() {
        let errors = vec![
            ValidationErrorDetail::new("ci", "La cédula es obligatoria"),
            ValidationErrorDetail::new("fecha_nacimiento", "no puede ser futura"),
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_vendor_status_mapping() {
        let status = |err: VendorError| ApiError::from(err).into_response().status();

        assert_eq!(
            status(VendorError::Transient {
                vendor: "luxand",
                message: "busy".into()
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status(VendorError::NotConfigured("stripe")), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status(VendorError::Permanent {
                vendor: "stripe",
                status: 402,
                body: "card_declined".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status(VendorError::NoFaceDetected), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_reservation_mapping() {
        let status = |err: ReservationError| ApiError::from(err).into_response().status();

        assert_eq!(status(ReservationError::PastDate), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status(ReservationError::Conflict { reserva_id: Uuid::nil() }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(ReservationError::InvalidTransition {
                from: "CANCELADA",
                to: "CONFIRMADA"
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(status(ReservationError::AreaNotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_domain_mapping() {
        match ApiError::from(DomainError::validation("fecha_fin", "antes del inicio")) {
            ApiError::ValidationError(details) => {
                assert_eq!(details[0].field, "fecha_fin");
                assert_eq!(details[0].message, "antes del inicio");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            ApiError::from(DomainError::Conflict("Esta cédula ya está registrada.".into())),
            ApiError::Conflict(_)
        ));
    }

    #[test]
    fn test_recognition_vendor_error_code() {
        let err = ApiError::from(RecognitionError::Vendor("Invalid token".into()));
        assert!(matches!(err, ApiError::Rejected { code: "error_luxand", .. }));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "El nombre es obligatorio"))]
        nombre: String,
    }

    #[test]
    fn test_validator_errors_keep_messages() {
        let sample = Sample { nombre: String::new() };
        let err = ApiError::from(sample.validate().unwrap_err());

        match err {
            ApiError::ValidationError(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "nombre");
                assert_eq!(details[0].message, "El nombre es obligatorio");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
