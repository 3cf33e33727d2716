/// Vehiculo and mascota endpoints
///
/// # Endpoints
///
/// - `GET|POST /api/vehiculos` (filters: `persona`, `tipo`),
///   `GET|PUT|DELETE /api/vehiculos/:id`
/// - `GET /api/vehiculos/placa/:placa` - Lookup ignoring case and spaces
/// - `GET|POST /api/mascotas` (filters: `especie`, `persona`),
///   `GET|PUT|DELETE /api/mascotas/:id`

use super::not_found;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use condo_shared::db::listing::ListParams;
use condo_shared::models::mascota::{CreateMascota, Mascota, MascotaFilter, UpdateMascota};
use condo_shared::models::vehiculo::{CreateVehiculo, UpdateVehiculo, Vehiculo, VehiculoFilter};
use uuid::Uuid;
use validator::Validate;

pub async fn list_vehiculos(
    State(state): State<AppState>,
    Query(filter): Query<VehiculoFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Vehiculo>>> {
    Ok(Json(Vehiculo::list(&state.db, &filter, &params).await?))
}

/// Register vehiculo; the plate is stored upper-case
///
/// # Errors
///
/// - 409 if another vehicle carries the same plate
pub async fn create_vehiculo(
    State(state): State<AppState>,
    Json(req): Json<CreateVehiculo>,
) -> ApiResult<(StatusCode, Json<Vehiculo>)> {
    req.validate()?;
    let vehiculo = Vehiculo::create(&state.db, req).await?;
    tracing::info!(vehiculo_id = %vehiculo.id, placa = %vehiculo.placa, "Vehiculo registered");
    Ok((StatusCode::CREATED, Json(vehiculo)))
}

pub async fn get_vehiculo(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Vehiculo>> {
    let vehiculo = Vehiculo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Vehículo"))?;
    Ok(Json(vehiculo))
}

pub async fn get_by_placa(
    State(state): State<AppState>,
    Path(placa): Path<String>,
) -> ApiResult<Json<Vehiculo>> {
    let vehiculo = Vehiculo::find_by_placa(&state.db, &placa)
        .await?
        .ok_or_else(|| not_found("Vehículo"))?;
    Ok(Json(vehiculo))
}

pub async fn update_vehiculo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVehiculo>,
) -> ApiResult<Json<Vehiculo>> {
    req.validate()?;
    let vehiculo = Vehiculo::update(&state.db, id, req)
        .await?
        .ok_or_else(|| not_found("Vehículo"))?;
    Ok(Json(vehiculo))
}

pub async fn delete_vehiculo(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Vehiculo::delete(&state.db, id).await? {
        return Err(not_found("Vehículo"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_mascotas(
    State(state): State<AppState>,
    Query(filter): Query<MascotaFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Mascota>>> {
    Ok(Json(Mascota::list(&state.db, &filter, &params).await?))
}

pub async fn create_mascota(
    State(state): State<AppState>,
    Json(req): Json<CreateMascota>,
) -> ApiResult<(StatusCode, Json<Mascota>)> {
    req.validate()?;
    let mascota = Mascota::create(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(mascota)))
}

pub async fn get_mascota(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Mascota>> {
    let mascota = Mascota::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Mascota"))?;
    Ok(Json(mascota))
}

pub async fn update_mascota(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateMascota>,
) -> ApiResult<Json<Mascota>> {
    req.validate()?;
    let mascota = Mascota::update(&state.db, id, req)
        .await?
        .ok_or_else(|| not_found("Mascota"))?;
    Ok(Json(mascota))
}

pub async fn delete_mascota(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Mascota::delete(&state.db, id).await? {
        return Err(not_found("Mascota"));
    }
    Ok(StatusCode::NO_CONTENT)
}
