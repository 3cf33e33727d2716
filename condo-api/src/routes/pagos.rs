/// Online payment of expensas
///
/// The client confirms the payment with the processor's SDK using the
/// returned `client_secret`, then asks the API to verify the intent.
///
/// # Endpoints
///
/// - `POST /api/pagos/intents` - Create a payment intent for an expensa
/// - `GET  /api/pagos/verificar?payment_intent_id=pi_...` - Check and settle

use super::not_found;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use condo_shared::models::expensa::Expensa;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub expensa_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CreateIntentResponse {
    pub client_secret: String,
}

/// Amount in minor units, truncated
pub fn amount_cents(monto: Decimal) -> Option<i64> {
    (monto * Decimal::ONE_HUNDRED).trunc().to_i64()
}

/// Retries reuse the intent through a per-expensa idempotency key
pub fn idempotency_key(expensa_id: Uuid) -> String {
    format!("pi-expensa-{}", expensa_id)
}

/// Create payment intent
///
/// # Endpoint
///
/// ```text
/// POST /api/pagos/intents
///
/// { "expensa_id": "..." }
/// ```
///
/// # Response
///
/// ```json
/// { "client_secret": "pi_123_secret_456" }
/// ```
pub async fn create_intent(
    State(state): State<AppState>,
    Json(req): Json<CreateIntentRequest>,
) -> ApiResult<(StatusCode, Json<CreateIntentResponse>)> {
    let expensa = Expensa::find_by_id(&state.db, req.expensa_id)
        .await?
        .ok_or_else(|| not_found("Expensa"))?;

    if expensa.pagada {
        return Err(ApiError::BadRequest("La expensa ya está pagada.".to_string()));
    }

    let cents = amount_cents(expensa.monto)
        .filter(|cents| *cents > 0)
        .ok_or_else(|| ApiError::field("monto", "El monto debe ser mayor a cero."))?;

    let metadata = HashMap::from([("expensa_id".to_string(), expensa.id.to_string())]);

    let intent = state
        .vendors
        .payments
        .create_intent(cents, &expensa.currency, &metadata, &idempotency_key(expensa.id))
        .await?;

    Expensa::set_payment_intent(&state.db, expensa.id, &intent.id).await?;

    tracing::info!(expensa_id = %expensa.id, intent_id = %intent.id, amount = cents, "Payment intent created");

    let client_secret = intent
        .client_secret
        .ok_or_else(|| ApiError::BadGateway("Payment intent has no client secret".to_string()))?;

    Ok((StatusCode::CREATED, Json(CreateIntentResponse { client_secret })))
}

#[derive(Debug, Deserialize)]
pub struct VerificarQuery {
    pub payment_intent_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VerificarResponse {
    pub status: String,
    pub expensa_id: Option<String>,
    pub pagada: bool,
}

/// Verify payment intent
///
/// Marks the expensa named in the intent's metadata as paid once the intent
/// has `succeeded`.
pub async fn verificar_pago(
    State(state): State<AppState>,
    Query(query): Query<VerificarQuery>,
) -> ApiResult<Json<VerificarResponse>> {
    let intent_id = query
        .payment_intent_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::field("payment_intent_id", "payment_intent_id requerido"))?;

    let intent = state.vendors.payments.retrieve_intent(intent_id).await?;
    let expensa_id = intent.metadata.get("expensa_id").cloned();

    let mut pagada = false;
    if intent.succeeded() {
        if let Some(id) = expensa_id.as_deref().and_then(|id| id.parse::<Uuid>().ok()) {
            pagada = Expensa::mark_paid(&state.db, id).await?.is_some();
            tracing::info!(expensa_id = %id, intent_id, "Expensa paid");
        }
    }

    Ok(Json(VerificarResponse {
        status: intent.status,
        expensa_id,
        pagada,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_cents_truncates() {
        assert_eq!(amount_cents(Decimal::new(35050, 2)), Some(35050));
        assert_eq!(amount_cents(Decimal::new(10999, 3)), Some(1099));
        assert_eq!(amount_cents(Decimal::ZERO), Some(0));
    }

    #[test]
    fn test_idempotency_key() {
        let id = Uuid::nil();
        assert_eq!(
            idempotency_key(id),
            "pi-expensa-00000000-0000-0000-0000-000000000000"
        );
    }
}
