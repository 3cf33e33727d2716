/// Bloque and unidad endpoints
///
/// # Endpoints
///
/// - `GET|POST /api/bloques`, `GET|PUT|DELETE /api/bloques/:id`
/// - `GET|POST /api/unidades` (filters: `bloque`, `estado`, `tipo_unidad`),
///   `GET|PUT|DELETE /api/unidades/:id`
///
/// A unit's `estado` is also driven by its contracts: writing an active
/// contract marks it `ocupada`.

use super::not_found;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use condo_shared::db::listing::ListParams;
use condo_shared::models::unidad::{
    Bloque, CreateBloque, CreateUnidad, Unidad, UnidadFilter, UpdateBloque, UpdateUnidad,
};
use uuid::Uuid;
use validator::Validate;

pub async fn list_bloques(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Bloque>>> {
    Ok(Json(Bloque::list(&state.db, &params).await?))
}

pub async fn create_bloque(
    State(state): State<AppState>,
    Json(req): Json<CreateBloque>,
) -> ApiResult<(StatusCode, Json<Bloque>)> {
    req.validate()?;
    let bloque = Bloque::create(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(bloque)))
}

pub async fn get_bloque(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Bloque>> {
    let bloque = Bloque::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Bloque"))?;
    Ok(Json(bloque))
}

pub async fn update_bloque(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBloque>,
) -> ApiResult<Json<Bloque>> {
    req.validate()?;
    let bloque = Bloque::update(&state.db, id, req)
        .await?
        .ok_or_else(|| not_found("Bloque"))?;
    Ok(Json(bloque))
}

pub async fn delete_bloque(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Bloque::delete(&state.db, id).await? {
        return Err(not_found("Bloque"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_unidades(
    State(state): State<AppState>,
    Query(filter): Query<UnidadFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Unidad>>> {
    Ok(Json(Unidad::list(&state.db, &filter, &params).await?))
}

/// Create unidad
///
/// # Errors
///
/// - 409 if `codigo` or (`bloque_id`, `numero`) is already taken
pub async fn create_unidad(
    State(state): State<AppState>,
    Json(req): Json<CreateUnidad>,
) -> ApiResult<(StatusCode, Json<Unidad>)> {
    req.validate()?;
    let unidad = Unidad::create(&state.db, req).await?;
    tracing::info!(unidad_id = %unidad.id, codigo = %unidad.codigo, "Unidad created");
    Ok((StatusCode::CREATED, Json(unidad)))
}

pub async fn get_unidad(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Unidad>> {
    let unidad = Unidad::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Unidad"))?;
    Ok(Json(unidad))
}

pub async fn update_unidad(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUnidad>,
) -> ApiResult<Json<Unidad>> {
    req.validate()?;
    let unidad = Unidad::update(&state.db, id, req)
        .await?
        .ok_or_else(|| not_found("Unidad"))?;
    Ok(Json(unidad))
}

pub async fn delete_unidad(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Unidad::delete(&state.db, id).await? {
        return Err(not_found("Unidad"));
    }
    Ok(StatusCode::NO_CONTENT)
}
