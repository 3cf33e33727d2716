/// Expensa and multa endpoints
///
/// # Endpoints
///
/// - `GET|POST /api/expensas` (filters: `unidad`, `bloque`, `pagada`,
///   `desde`, `hasta`), `GET|PUT|DELETE /api/expensas/:id`
/// - `GET|POST /api/multas` (filters: `expensa`, `tipo`),
///   `GET|PUT|DELETE /api/multas/:id`
///
/// Expensas are returned with derived fields: `dias_restantes`, `vencida`,
/// `unidad_detalle` and `destinatario`.

use super::not_found;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use condo_shared::db::listing::ListParams;
use condo_shared::models::expensa::{
    CreateExpensa, CreateMulta, Expensa, ExpensaDetalle, ExpensaFilter, Multa, MultaFilter, UpdateExpensa,
    UpdateMulta,
};
use condo_shared::notifications::notify_expensa;
use uuid::Uuid;

pub async fn list_expensas(
    State(state): State<AppState>,
    Query(filter): Query<ExpensaFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<ExpensaDetalle>>> {
    let today = Utc::now().date_naive();
    Ok(Json(Expensa::list(&state.db, &filter, &params, today).await?))
}

/// Issue an expensa
///
/// # Endpoint
///
/// ```text
/// POST /api/expensas
///
/// { "unidad_id": "...", "monto": "350.00", "fecha_emision": "2025-03-01" }
/// ```
///
/// `fecha_vencimiento` defaults to 30 days after emission. The unit's
/// propietario is notified on their registered devices.
pub async fn create_expensa(
    State(state): State<AppState>,
    Json(req): Json<CreateExpensa>,
) -> ApiResult<(StatusCode, Json<ExpensaDetalle>)> {
    let expensa = Expensa::create(&state.db, req).await?;
    tracing::info!(expensa_id = %expensa.id, unidad_id = %expensa.unidad_id, "Expensa created");

    notify_expensa(&state.db, state.vendors.push.as_ref(), &expensa).await;

    let detalle = Expensa::find_detalle(&state.db, expensa.id, Utc::now().date_naive())
        .await?
        .ok_or_else(|| not_found("Expensa"))?;

    Ok((StatusCode::CREATED, Json(detalle)))
}

pub async fn get_expensa(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ExpensaDetalle>> {
    let detalle = Expensa::find_detalle(&state.db, id, Utc::now().date_naive())
        .await?
        .ok_or_else(|| not_found("Expensa"))?;
    Ok(Json(detalle))
}

pub async fn update_expensa(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateExpensa>,
) -> ApiResult<Json<ExpensaDetalle>> {
    let expensa = Expensa::update(&state.db, id, req).await?;

    let detalle = Expensa::find_detalle(&state.db, expensa.id, Utc::now().date_naive())
        .await?
        .ok_or_else(|| not_found("Expensa"))?;
    Ok(Json(detalle))
}

pub async fn delete_expensa(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Expensa::delete(&state.db, id).await? {
        return Err(not_found("Expensa"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_multas(
    State(state): State<AppState>,
    Query(filter): Query<MultaFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Multa>>> {
    Ok(Json(Multa::list(&state.db, &filter, &params).await?))
}

pub async fn create_multa(
    State(state): State<AppState>,
    Json(req): Json<CreateMulta>,
) -> ApiResult<(StatusCode, Json<Multa>)> {
    let multa = Multa::create(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(multa)))
}

pub async fn get_multa(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Multa>> {
    let multa = Multa::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Multa"))?;
    Ok(Json(multa))
}

pub async fn update_multa(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMulta>,
) -> ApiResult<Json<Multa>> {
    Ok(Json(Multa::update(&state.db, id, req).await?))
}

pub async fn delete_multa(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Multa::delete(&state.db, id).await? {
        return Err(not_found("Multa"));
    }
    Ok(StatusCode::NO_CONTENT)
}
