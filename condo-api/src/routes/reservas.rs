/// Common area and reservation endpoints
///
/// # Endpoints
///
/// - `GET|POST /api/areas` (filter: `estado`), `GET|PUT|DELETE /api/areas/:id`
/// - `GET|POST /api/reservas` (filters: `area`, `persona`, `estado`,
///   `fecha_desde`, `fecha_hasta`), `GET|PUT|DELETE /api/reservas/:id`
/// - `POST /api/reservas/:id/estado` - Move along the state machine
///
/// Creating or rescheduling a reservation runs the conflict checker inside a
/// transaction holding the area row lock. A refused slot answers 422 (date,
/// duration, area state, operating hours, persona type) or 409 (overlap).

use super::not_found;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use condo_shared::db::listing::ListParams;
use condo_shared::models::area_comun::{
    AreaComun, AreaComunFilter, CreateAreaComun, CreateReserva, EstadoReserva, Reserva, ReservaFilter,
    UpdateAreaComun, UpdateReserva,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub async fn list_areas(
    State(state): State<AppState>,
    Query(filter): Query<AreaComunFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<AreaComun>>> {
    Ok(Json(AreaComun::list(&state.db, &filter, &params).await?))
}

pub async fn create_area(
    State(state): State<AppState>,
    Json(req): Json<CreateAreaComun>,
) -> ApiResult<(StatusCode, Json<AreaComun>)> {
    req.validate()?;
    let area = AreaComun::create(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(area)))
}

pub async fn get_area(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<AreaComun>> {
    let area = AreaComun::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Área común"))?;
    Ok(Json(area))
}

pub async fn update_area(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAreaComun>,
) -> ApiResult<Json<AreaComun>> {
    req.validate()?;
    let area = AreaComun::update(&state.db, id, req)
        .await?
        .ok_or_else(|| not_found("Área común"))?;
    Ok(Json(area))
}

pub async fn delete_area(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !AreaComun::delete(&state.db, id).await? {
        return Err(not_found("Área común"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_reservas(
    State(state): State<AppState>,
    Query(filter): Query<ReservaFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Reserva>>> {
    Ok(Json(Reserva::list(&state.db, &filter, &params).await?))
}

/// Book a common area
///
/// # Endpoint
///
/// ```text
/// POST /api/reservas
///
/// {
///   "area_comun_id": "...",
///   "persona_id": "...",
///   "fecha_reserva": "2025-06-14",
///   "hora_inicio": "22:00:00",
///   "hora_fin": "02:00:00"
/// }
/// ```
///
/// An end time earlier than the start time ends on the following day.
pub async fn create_reserva(
    State(state): State<AppState>,
    Json(req): Json<CreateReserva>,
) -> ApiResult<(StatusCode, Json<Reserva>)> {
    let reserva = Reserva::create(&state.db, req).await?;
    tracing::info!(
        reserva_id = %reserva.id,
        area_id = %reserva.area_comun_id,
        fecha = %reserva.fecha_reserva,
        "Reserva created"
    );
    Ok((StatusCode::CREATED, Json(reserva)))
}

pub async fn get_reserva(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Reserva>> {
    let reserva = Reserva::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Reserva"))?;
    Ok(Json(reserva))
}

/// Reschedule; the new slot is admitted as if it were a new booking,
/// ignoring the reservation itself
pub async fn update_reserva(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReserva>,
) -> ApiResult<Json<Reserva>> {
    Ok(Json(Reserva::update(&state.db, id, req).await?))
}

pub async fn delete_reserva(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Reserva::delete(&state.db, id).await? {
        return Err(not_found("Reserva"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Target state of a reservation
#[derive(Debug, Deserialize)]
pub struct EstadoRequest {
    pub estado: EstadoReserva,
}

/// Change reservation state
///
/// # Endpoint
///
/// ```text
/// POST /api/reservas/:id/estado
///
/// { "estado": "CONFIRMADA" }
/// ```
///
/// # Errors
///
/// - 404 if the reservation does not exist
/// - 409 if the transition is not allowed from the current state
pub async fn change_estado(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EstadoRequest>,
) -> ApiResult<Json<Reserva>> {
    Ok(Json(Reserva::transition(&state.db, id, req.estado).await?))
}
