/// Cargo and empleado endpoints
///
/// # Endpoints
///
/// - `GET|POST /api/cargos`, `GET|PUT|DELETE /api/cargos/:id`
/// - `GET|POST /api/empleados` (filters: `estado`, `cargo`, `sueldo_min`,
///   `sueldo_max`), `GET|PUT|DELETE /api/empleados/:id`
/// - `POST /api/empleados/:id/fotos` - Add a photo to an enrolled empleado

use super::not_found;
use super::personas::{AddFotoRequest, AddFotoResponse};
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
use condo_shared::models::empleado::{
    Cargo, CreateCargo, CreateEmpleado, Empleado, EmpleadoFilter, UpdateCargo, UpdateEmpleado,
};
use condo_shared::recognition::auto_enroll_empleado;
use condo_shared::vendors::Photo;
use uuid::Uuid;
use validator::Validate;

pub async fn list_cargos(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Cargo>>> {
    Ok(Json(Cargo::list(&state.db, &params).await?))
}

pub async fn create_cargo(
    State(state): State<AppState>,
    Json(req): Json<CreateCargo>,
) -> ApiResult<(StatusCode, Json<Cargo>)> {
    req.validate()?;
    let cargo = Cargo::create(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(cargo)))
}

pub async fn get_cargo(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Cargo>> {
    let cargo = Cargo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Cargo"))?;
    Ok(Json(cargo))
}

pub async fn update_cargo(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCargo>,
) -> ApiResult<Json<Cargo>> {
    req.validate()?;
    let cargo = Cargo::update(&state.db, id, req)
        .await?
        .ok_or_else(|| not_found("Cargo"))?;
    Ok(Json(cargo))
}

pub async fn delete_cargo(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Cargo::delete(&state.db, id).await? {
        return Err(not_found("Cargo"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn enroll_if_needed(state: &AppState, empleado: &mut Empleado) {
    let collection = &state.config.vendors.luxand_collection_empleados;
    if let Some(uuid) = auto_enroll_empleado(&state.db, state.vendors.face.as_ref(), collection, empleado).await {
        empleado.luxand_uuid = Some(uuid);
    }
}

/// List empleados; `search` also matches the cargo name
pub async fn list_empleados(
    State(state): State<AppState>,
    Query(filter): Query<EmpleadoFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Empleado>>> {
    Ok(Json(Empleado::list(&state.db, &filter, &params).await?))
}

/// Create empleado
///
/// # Endpoint
///
/// ```text
/// POST /api/empleados
///
/// {
///   "nombre": "Luis",
///   "apellido": "Mamani",
///   "direccion": "Av. Busch 123",
///   "sexo": "M",
///   "ci": "1234567",
///   "sueldo": "3500.00",
///   "cargo_id": "..."
/// }
/// ```
pub async fn create_empleado(
    State(state): State<AppState>,
    Json(req): Json<CreateEmpleado>,
) -> ApiResult<(StatusCode, Json<Empleado>)> {
    req.validate()?;

    let mut empleado = Empleado::create(&state.db, req).await?;
    tracing::info!(empleado_id = %empleado.id, "Empleado created");

    enroll_if_needed(&state, &mut empleado).await;

    Ok((StatusCode::CREATED, Json(empleado)))
}

pub async fn get_empleado(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Empleado>> {
    let empleado = Empleado::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Empleado"))?;
    Ok(Json(empleado))
}

pub async fn update_empleado(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEmpleado>,
) -> ApiResult<Json<Empleado>> {
    req.validate()?;

    let mut empleado = Empleado::update(&state.db, id, req).await?;
    enroll_if_needed(&state, &mut empleado).await;

    Ok(Json(empleado))
}

pub async fn delete_empleado(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Empleado::delete(&state.db, id).await? {
        return Err(not_found("Empleado"));
    }

    tracing::info!(empleado_id = %id, "Empleado deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Add a photo to an enrolled empleado
pub async fn add_foto(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddFotoRequest>,
) -> ApiResult<Json<AddFotoResponse>> {
    let url = req.url()?;

    let empleado = Empleado::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Empleado"))?;

    let uuid = empleado.luxand_uuid.ok_or_else(|| {
        ApiError::BadRequest("El empleado no está enrolado en reconocimiento facial.".to_string())
    })?;

    let respuesta = state.vendors.face.add_photo(&uuid, Photo::Url(url)).await?;

    Ok(Json(AddFotoResponse {
        ok: true,
        uuid,
        respuesta,
    }))
}
