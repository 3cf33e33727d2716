/// Push notification device endpoints
///
/// # Endpoints
///
/// - `GET    /api/dispositivos` - List devices (filters: `persona`, `activo`)
/// - `POST   /api/dispositivos` - Register a device token (upsert by token)
/// - `DELETE /api/dispositivos/:id` - Forget a device

use super::not_found;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use condo_shared::db::listing::ListParams;
use condo_shared::models::dispositivo::{Dispositivo, DispositivoFilter, RegisterDispositivo};
use uuid::Uuid;
use validator::Validate;

pub async fn list_dispositivos(
    State(state): State<AppState>,
    Query(filter): Query<DispositivoFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Dispositivo>>> {
    Ok(Json(Dispositivo::list(&state.db, &filter, &params).await?))
}

/// Register device
///
/// Re-registering a known token moves it to the given persona and
/// reactivates it.
pub async fn register_dispositivo(
    State(state): State<AppState>,
    Json(req): Json<RegisterDispositivo>,
) -> ApiResult<(StatusCode, Json<Dispositivo>)> {
    req.validate()?;
    let dispositivo = Dispositivo::register(&state.db, req).await?;
    tracing::debug!(dispositivo_id = %dispositivo.id, "Device registered");
    Ok((StatusCode::CREATED, Json(dispositivo)))
}

pub async fn delete_dispositivo(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Dispositivo::delete(&state.db, id).await? {
        return Err(not_found("Dispositivo"));
    }
    Ok(StatusCode::NO_CONTENT)
}
