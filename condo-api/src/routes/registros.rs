/// Day-to-day logs: visitas, objetos perdidos and incidentes
///
/// # Endpoints
///
/// - `GET|POST /api/visitas` (filters: `estado`, `visitante`,
///   `recibe_persona`, `desde`, `hasta`), `GET|PUT|DELETE /api/visitas/:id`
/// - `POST /api/visitas/:id/finalizar` - Close the visit
/// - `GET|POST /api/objetos-perdidos` (filter: `estado`),
///   `GET|PUT|DELETE /api/objetos-perdidos/:id`
/// - `POST /api/objetos-perdidos/:id/entregar` - Hand back to its owner
/// - `GET|POST /api/incidentes` (filter: `propietario`),
///   `GET|PUT|DELETE /api/incidentes/:id`

use super::not_found;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use condo_shared::db::listing::ListParams;
use condo_shared::models::incidente::{CreateIncidente, Incidente, IncidenteFilter, UpdateIncidente};
use condo_shared::models::objeto_perdido::{
    CreateObjetoPerdido, EstadoObjeto, ObjetoPerdido, ObjetoPerdidoFilter, UpdateObjetoPerdido,
};
use condo_shared::models::visita::{CreateVisita, UpdateVisita, Visita, VisitaFilter};
use condo_shared::notifications::notify_objeto_perdido;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub async fn list_visitas(
    State(state): State<AppState>,
    Query(filter): Query<VisitaFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Visita>>> {
    Ok(Json(Visita::list(&state.db, &filter, &params).await?))
}

/// Register a visit
///
/// # Errors
///
/// - 422 if `visitante_id` is not a visitante, or `recibe_persona_id` is
///   neither propietario nor inquilino
pub async fn create_visita(
    State(state): State<AppState>,
    Json(req): Json<CreateVisita>,
) -> ApiResult<(StatusCode, Json<Visita>)> {
    let visita = Visita::create(&state.db, req).await?;
    tracing::info!(visita_id = %visita.id, visitante_id = %visita.visitante_id, "Visita registered");
    Ok((StatusCode::CREATED, Json(visita)))
}

pub async fn get_visita(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Visita>> {
    let visita = Visita::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Visita"))?;
    Ok(Json(visita))
}

pub async fn update_visita(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVisita>,
) -> ApiResult<Json<Visita>> {
    Ok(Json(Visita::update(&state.db, id, req).await?))
}

pub async fn delete_visita(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Visita::delete(&state.db, id).await? {
        return Err(not_found("Visita"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct FinalizarRequest {
    /// Exit time, defaults to now
    pub fecha_hora_salida: Option<DateTime<Utc>>,
}

/// Mark the visit FINALIZADA and stamp its exit time
pub async fn finalizar_visita(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<FinalizarRequest>>,
) -> ApiResult<Json<Visita>> {
    let salida = body.and_then(|Json(req)| req.fecha_hora_salida);
    let visita = Visita::finalizar(&state.db, id, salida)
        .await?
        .ok_or_else(|| not_found("Visita"))?;
    Ok(Json(visita))
}

pub async fn list_objetos(
    State(state): State<AppState>,
    Query(filter): Query<ObjetoPerdidoFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<ObjetoPerdido>>> {
    Ok(Json(ObjetoPerdido::list(&state.db, &filter, &params).await?))
}

/// Register a found object
///
/// A pending object is broadcast to every registered device. Push failures
/// are logged and do not affect the response.
pub async fn create_objeto(
    State(state): State<AppState>,
    Json(req): Json<CreateObjetoPerdido>,
) -> ApiResult<(StatusCode, Json<ObjetoPerdido>)> {
    req.validate()?;

    let objeto = ObjetoPerdido::create(&state.db, req).await?;
    tracing::info!(objeto_id = %objeto.id, "Objeto perdido registered");

    if objeto.estado == EstadoObjeto::Pendiente {
        notify_objeto_perdido(&state.db, state.vendors.push.as_ref(), &objeto).await;
    }

    Ok((StatusCode::CREATED, Json(objeto)))
}

pub async fn get_objeto(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ObjetoPerdido>> {
    let objeto = ObjetoPerdido::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Objeto perdido"))?;
    Ok(Json(objeto))
}

pub async fn update_objeto(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateObjetoPerdido>,
) -> ApiResult<Json<ObjetoPerdido>> {
    req.validate()?;
    let objeto = ObjetoPerdido::update(&state.db, id, req)
        .await?
        .ok_or_else(|| not_found("Objeto perdido"))?;
    Ok(Json(objeto))
}

pub async fn delete_objeto(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !ObjetoPerdido::delete(&state.db, id).await? {
        return Err(not_found("Objeto perdido"));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct EntregarRequest {
    /// Persona receiving the object
    pub entregado_a: Option<Uuid>,
}

pub async fn entregar_objeto(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<EntregarRequest>>,
) -> ApiResult<Json<ObjetoPerdido>> {
    let persona = body.and_then(|Json(req)| req.entregado_a);
    let objeto = ObjetoPerdido::entregar(&state.db, id, persona)
        .await?
        .ok_or_else(|| not_found("Objeto perdido"))?;

    tracing::info!(objeto_id = %id, "Objeto perdido delivered");
    Ok(Json(objeto))
}

pub async fn list_incidentes(
    State(state): State<AppState>,
    Query(filter): Query<IncidenteFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Incidente>>> {
    Ok(Json(Incidente::list(&state.db, &filter, &params).await?))
}

pub async fn create_incidente(
    State(state): State<AppState>,
    Json(req): Json<CreateIncidente>,
) -> ApiResult<(StatusCode, Json<Incidente>)> {
    req.validate()?;
    let incidente = Incidente::create(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(incidente)))
}

pub async fn get_incidente(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Incidente>> {
    let incidente = Incidente::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Incidente"))?;
    Ok(Json(incidente))
}

pub async fn update_incidente(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateIncidente>,
) -> ApiResult<Json<Incidente>> {
    req.validate()?;
    let incidente = Incidente::update(&state.db, id, req)
        .await?
        .ok_or_else(|| not_found("Incidente"))?;
    Ok(Json(incidente))
}

pub async fn delete_incidente(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Incidente::delete(&state.db, id).await? {
        return Err(not_found("Incidente"));
    }
    Ok(StatusCode::NO_CONTENT)
}
