/// Contract endpoints
///
/// # Endpoints
///
/// - `GET|POST /api/contratos` (filters: `estado`, `unidad`, `propietario`)
/// - `GET|PUT|DELETE /api/contratos/:id`
/// - `POST /api/contratos/:id/pdf` - Render and store the contract document
///
/// Every write keeps the unit's occupancy in step with its active contracts.

use super::not_found;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use condo_shared::db::listing::ListParams;
use condo_shared::models::contrato::{Contrato, ContratoFilter, CreateContrato, UpdateContrato};
use condo_shared::vendors::documents::TEMPLATE_CONTRATO;
use serde::Serialize;
use uuid::Uuid;

pub async fn list_contratos(
    State(state): State<AppState>,
    Query(filter): Query<ContratoFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Contrato>>> {
    Ok(Json(Contrato::list(&state.db, &filter, &params).await?))
}

/// Create contract
///
/// # Errors
///
/// - 422 if the persona is not a propietario or an amount is negative
pub async fn create_contrato(
    State(state): State<AppState>,
    Json(req): Json<CreateContrato>,
) -> ApiResult<(StatusCode, Json<Contrato>)> {
    let contrato = Contrato::create(&state.db, req).await?;
    tracing::info!(
        contrato_id = %contrato.id,
        unidad_id = %contrato.unidad_id,
        "Contrato created"
    );
    Ok((StatusCode::CREATED, Json(contrato)))
}

pub async fn get_contrato(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Contrato>> {
    let contrato = Contrato::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Contrato"))?;
    Ok(Json(contrato))
}

pub async fn update_contrato(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateContrato>,
) -> ApiResult<Json<Contrato>> {
    Ok(Json(Contrato::update(&state.db, id, req).await?))
}

pub async fn delete_contrato(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Contrato::delete(&state.db, id).await? {
        return Err(not_found("Contrato"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Stored contract document
#[derive(Debug, Serialize)]
pub struct ContratoPdfResponse {
    pub id: Uuid,
    pub pdf_url: String,
    pub public_id: String,
}

/// Generate the contract PDF
///
/// # Endpoint
///
/// ```text
/// POST /api/contratos/:id/pdf
/// ```
///
/// # Errors
///
/// - 404 if the contract does not exist
/// - 500 if rendering fails
/// - 502 if the document store refuses the upload
pub async fn generate_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ContratoPdfResponse>> {
    let documento = Contrato::find_documento(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Contrato"))?;

    let context = serde_json::to_value(&documento)
        .map_err(|e| ApiError::InternalError(format!("Contract context: {}", e)))?;

    let pdf = state
        .vendors
        .renderer
        .render(TEMPLATE_CONTRATO, &context)
        .await
        .map_err(|e| ApiError::InternalError(format!("PDF rendering failed: {}", e)))?;

    let stored = state
        .vendors
        .documents
        .store(pdf, &format!("contratos/{}", id))
        .await
        .map_err(|e| ApiError::BadGateway(format!("No se pudo almacenar el PDF: {}", e)))?;

    Contrato::set_pdf(&state.db, id, &stored.url)
        .await?
        .ok_or_else(|| not_found("Contrato"))?;

    tracing::info!(contrato_id = %id, url = %stored.url, "Contrato PDF stored");

    Ok(Json(ContratoPdfResponse {
        id,
        pdf_url: stored.url,
        public_id: stored.public_id,
    }))
}
