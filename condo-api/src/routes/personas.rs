/// Persona endpoints
///
/// # Endpoints
///
/// - `GET    /api/personas` - List personas (filters: `tipo`, `estado`,
///   `propietario`, `estado_inquilino`; `search`, `ordering`, `limit`, `offset`)
/// - `POST   /api/personas` - Create persona with its role attachment
/// - `GET    /api/personas/disponibles` - Propietarios and inquilinos
/// - `GET    /api/personas/:id` - Get persona
/// - `PUT    /api/personas/:id` - Update persona (role tag immutable)
/// - `DELETE /api/personas/:id` - Delete persona
/// - `POST   /api/personas/:id/fotos` - Add a photo to an enrolled persona
///
/// Creating or updating a persona that has an `imagen` and no biometric
/// identity enrolls it with the face vendor. Enrollment failures never fail
/// the write.

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
use condo_shared::models::persona::{CreatePersona, Persona, PersonaDetalle, PersonaFilter, UpdatePersona};
use condo_shared::recognition::auto_enroll_persona;
use condo_shared::vendors::Photo;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

/// Extra photo for an enrolled persona or empleado
#[derive(Debug, Deserialize)]
pub struct AddFotoRequest {
    pub image_url: Option<String>,
}

impl AddFotoRequest {
    pub(crate) fn url(&self) -> ApiResult<String> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::field("image_url", "Se requiere image_url."))
    }
}

/// Vendor acknowledgement of an added photo
#[derive(Debug, Serialize)]
pub struct AddFotoResponse {
    pub ok: bool,
    pub uuid: String,
    pub respuesta: JsonValue,
}

async fn enroll_if_needed(state: &AppState, detalle: &mut PersonaDetalle) {
    let collection = &state.config.vendors.luxand_collection;
    if let Some(uuid) =
        auto_enroll_persona(&state.db, state.vendors.face.as_ref(), collection, &detalle.persona).await
    {
        detalle.persona.luxand_uuid = Some(uuid);
    }
}

/// List personas
pub async fn list_personas(
    State(state): State<AppState>,
    Query(filter): Query<PersonaFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Persona>>> {
    let personas = Persona::list(&state.db, &filter, &params).await?;
    Ok(Json(personas))
}

/// Propietarios and inquilinos, for selection lists
pub async fn list_disponibles(State(state): State<AppState>) -> ApiResult<Json<Vec<Persona>>> {
    let personas = Persona::list_disponibles(&state.db).await?;
    Ok(Json(personas))
}

/// Create persona
///
/// # Endpoint
///
/// ```text
/// POST /api/personas
/// Content-Type: application/json
///
/// {
///   "nombre": "Ana",
///   "apellido": "Rojas",
///   "sexo": "F",
///   "ci": "7654321",
///   "fecha_nacimiento": "1990-04-12",
///   "imagen": "https://i.ibb.co/abc/ana.jpg",
///   "rol": { "tipo": "inquilino", "propietario_id": "...", "fecha_inicio": "2025-01-01" }
/// }
/// ```
///
/// # Errors
///
/// - 409 if the CI or linked user already exists
/// - 422 on field validation or role rule failures
pub async fn create_persona(
    State(state): State<AppState>,
    Json(req): Json<CreatePersona>,
) -> ApiResult<(StatusCode, Json<PersonaDetalle>)> {
    req.validate()?;

    let mut detalle = Persona::create(&state.db, req).await?;
    tracing::info!(persona_id = %detalle.persona.id, tipo = detalle.persona.tipo.as_str(), "Persona created");

    enroll_if_needed(&state, &mut detalle).await;

    Ok((StatusCode::CREATED, Json(detalle)))
}

/// Get persona with its role attachment
pub async fn get_persona(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PersonaDetalle>> {
    let detalle = Persona::find_detalle(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Persona"))?;
    Ok(Json(detalle))
}

/// Update persona
pub async fn update_persona(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePersona>,
) -> ApiResult<Json<PersonaDetalle>> {
    req.validate()?;

    let mut detalle = Persona::update(&state.db, id, req).await?;
    enroll_if_needed(&state, &mut detalle).await;

    Ok(Json(detalle))
}

/// Delete persona
pub async fn delete_persona(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if !Persona::delete(&state.db, id).await? {
        return Err(not_found("Persona"));
    }

    tracing::info!(persona_id = %id, "Persona deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Add a photo to an enrolled persona
///
/// # Endpoint
///
/// ```text
/// POST /api/personas/:id/fotos
///
/// { "image_url": "https://i.ibb.co/abc/ana-2.jpg" }
/// ```
///
/// # Errors
///
/// - 400 if the persona has no biometric identity yet
/// - 404 if the persona does not exist
pub async fn add_foto(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddFotoRequest>,
) -> ApiResult<Json<AddFotoResponse>> {
    let url = req.url()?;

    let persona = Persona::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| not_found("Persona"))?;

    let uuid = persona.luxand_uuid.ok_or_else(|| {
        ApiError::BadRequest("La persona no está enrolada en reconocimiento facial.".to_string())
    })?;

    let respuesta = state.vendors.face.add_photo(&uuid, Photo::Url(url)).await?;

    Ok(Json(AddFotoResponse {
        ok: true,
        uuid,
        respuesta,
    }))
}
