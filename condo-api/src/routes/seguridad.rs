/// Security endpoints: plate recognition, face recognition and enrollment
///
/// # Endpoints
///
/// - `POST /api/seguridad/alpr` - Read a plate from a camera frame
/// - `GET  /api/seguridad/lecturas` - Plate reading log (filters: `placa`, `match`)
/// - `POST /api/seguridad/reconocimiento` - Identify a persona or empleado
/// - `POST /api/personas/reconocimiento-facial` - Identify a resident
/// - `POST /api/seguridad/enrolar` - Enroll a persona or empleado
/// - `GET  /api/seguridad/enrolados` - Enrolled identities
/// - `GET  /api/seguridad/verificar-proveedor` - Face vendor connectivity
///
/// Recognition and enrollment accept JSON (`image_url`) or multipart
/// (`image` / `image_file`). Uploaded frames for recognition are hosted
/// first and the face vendor is queried by URL.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ImageForm, MIN_ENROLL_BYTES},
};
use axum::{
    extract::{Query, State},
    Json,
};
use condo_shared::db::listing::ListParams;
use condo_shared::models::empleado::Empleado;
use condo_shared::models::lectura_placa::{LecturaFilter, LecturaPlaca, NewLectura};
use condo_shared::models::persona::{Persona, PersonaTipo};
use condo_shared::models::vehiculo::Vehiculo;
use condo_shared::recognition::{enroll, reconcile, EnrollTarget, Enrollment, RecognitionMode, RecognitionOutcome};
use condo_shared::vendors::plate::best_candidate;
use condo_shared::vendors::{Photo, PlateScan};
use serde::Serialize;
use uuid::Uuid;

/// Result of a plate scan
#[derive(Debug, Serialize)]
pub struct AlprResponse {
    pub status: &'static str,
    pub plate: Option<String>,
    pub score: Option<f64>,
    #[serde(rename = "match")]
    pub matched: bool,
    pub vehiculo: Option<Vehiculo>,
    pub lectura: LecturaPlaca,
}

/// Read a license plate
///
/// # Endpoint
///
/// ```text
/// POST /api/seguridad/alpr
/// Content-Type: multipart/form-data
///
/// upload=<image>  camera_id=porton-1  regions=bo
/// ```
///
/// Every scan is logged, including frames where no plate was found.
///
/// # Response
///
/// ```json
/// {
///   "status": "ok",
///   "plate": "2345ABC",
///   "score": 0.91,
///   "match": true,
///   "vehiculo": { "id": "...", "placa": "2345ABC", ... },
///   "lectura": { "id": "...", "placa": "2345ABC", ... }
/// }
/// ```
pub async fn alpr(State(state): State<AppState>, mut form: ImageForm) -> ApiResult<Json<AlprResponse>> {
    let upload = form
        .take_file(&["upload"])
        .ok_or_else(|| ApiError::field("upload", "Se requiere el archivo 'upload'."))?;
    upload.validate_image("upload", 0)?;

    let camera_id = form.text("camera_id").unwrap_or_default().to_string();
    let regions = form
        .text("regions")
        .map(str::to_string)
        .unwrap_or_else(|| state.config.vendors.plate_regions.clone());

    let candidates = state
        .vendors
        .plates
        .scan(PlateScan {
            image: upload.data,
            filename: upload.filename,
            content_type: upload.content_type,
            regions,
            camera_id: Some(camera_id.clone()).filter(|id| !id.is_empty()),
        })
        .await?;

    let Some(best) = best_candidate(&candidates) else {
        let lectura = LecturaPlaca::append(
            &state.db,
            NewLectura {
                camera_id,
                ..Default::default()
            },
        )
        .await?;

        tracing::info!(lectura_id = %lectura.id, "No plate found in frame");

        return Ok(Json(AlprResponse {
            status: "no-plate-found",
            plate: None,
            score: None,
            matched: false,
            vehiculo: None,
            lectura,
        }));
    };

    let plate = best.plate.to_uppercase();
    let score = best.score;

    let vehiculo = Vehiculo::find_by_placa(&state.db, &plate).await?;
    let lectura = LecturaPlaca::append(
        &state.db,
        NewLectura {
            placa: plate.clone(),
            score,
            camera_id,
            image_url: None,
            vehiculo_id: vehiculo.as_ref().map(|v| v.id),
        },
    )
    .await?;

    tracing::info!(placa = %plate, score, matched = vehiculo.is_some(), "Plate read");

    Ok(Json(AlprResponse {
        status: "ok",
        plate: Some(plate),
        score: Some(score),
        matched: vehiculo.is_some(),
        vehiculo,
        lectura,
    }))
}

/// Plate readings, newest first
pub async fn list_lecturas(
    State(state): State<AppState>,
    Query(filter): Query<LecturaFilter>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<LecturaPlaca>>> {
    Ok(Json(LecturaPlaca::list(&state.db, &filter, &params).await?))
}

/// URL of the photo to search with, hosting an uploaded file first
async fn photo_url(state: &AppState, form: &mut ImageForm) -> ApiResult<String> {
    if let Some(url) = form.text("image_url") {
        return Ok(url.to_string());
    }

    let file = form
        .take_file(&["image", "image_file"])
        .ok_or_else(|| ApiError::field("image_url", "Debe enviar image_url o un archivo de imagen."))?;
    file.validate_image("image", 0)?;

    let url = state.vendors.images.upload(file.data, &file.filename).await?;
    tracing::debug!(url = %url, "Recognition frame hosted");
    Ok(url)
}

async fn recognize(
    state: &AppState,
    mut form: ImageForm,
    mode: RecognitionMode,
) -> ApiResult<Json<RecognitionOutcome>> {
    let umbral = form.number("umbral")?.unwrap_or_else(|| mode.default_threshold());
    if !(0.0..=1.0).contains(&umbral) {
        return Err(ApiError::field("umbral", "El umbral debe estar entre 0 y 1."));
    }

    let url = photo_url(state, &mut form).await?;
    let raw = state
        .vendors
        .face
        .search(Photo::Url(url), &state.config.vendors.luxand_collection)
        .await?;

    let outcome = reconcile(state.identities.as_ref(), mode, umbral, raw).await?;

    tracing::info!(
        ok = outcome.ok,
        tipo = outcome.tipo.as_deref().unwrap_or("-"),
        similaridad = outcome.similaridad.unwrap_or_default(),
        umbral,
        "Face recognition"
    );

    Ok(Json(outcome))
}

/// Identify a resident
///
/// Default threshold 0.50; a similarity of 0.9 or more is always accepted.
pub async fn reconocer_residente(
    State(state): State<AppState>,
    form: ImageForm,
) -> ApiResult<Json<RecognitionOutcome>> {
    recognize(&state, form, RecognitionMode::Residentes).await
}

/// Identify anyone on the premises
///
/// # Endpoint
///
/// ```text
/// POST /api/seguridad/reconocimiento
///
/// { "image_url": "https://i.ibb.co/abc/frame.jpg", "umbral": 0.8 }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "ok": true,
///   "tipo": "empleado",
///   "id": "...",
///   "nombre": "Luis Mamani",
///   "similaridad": 0.9312,
///   "uuid": "...",
///   "umbral": 0.8,
///   "raw": [ ... ]
/// }
/// ```
///
/// Personas are resolved before empleados. Default threshold 0.80.
pub async fn reconocer(
    State(state): State<AppState>,
    form: ImageForm,
) -> ApiResult<Json<RecognitionOutcome>> {
    recognize(&state, form, RecognitionMode::Global).await
}

/// Enroll a persona or empleado
///
/// # Endpoint
///
/// ```text
/// POST /api/seguridad/enrolar
///
/// { "persona_id": "...", "image_url": "https://i.ibb.co/abc/ana.jpg" }
/// ```
///
/// # Errors
///
/// - 400 if already enrolled or no face was detected
/// - 404 if the persona/empleado does not exist
/// - 422 if neither id is given or the uploaded file is not a 1 KB-10 MB image
pub async fn enrolar(State(state): State<AppState>, mut form: ImageForm) -> ApiResult<Json<Enrollment>> {
    let target = match (form.uuid("persona_id")?, form.uuid("empleado_id")?) {
        (Some(id), _) => EnrollTarget::Persona(id),
        (None, Some(id)) => EnrollTarget::Empleado(id),
        (None, None) => {
            return Err(ApiError::field(
                "persona_id",
                "Debe enviar persona_id o empleado_id.",
            ))
        }
    };

    let photo = match form.text("image_url") {
        Some(url) => Photo::Url(url.to_string()),
        None => {
            let file = form.take_file(&["image_file", "image"]).ok_or_else(|| {
                ApiError::field("image_url", "Debe enviar image_url o image_file.")
            })?;
            file.validate_image("image_file", MIN_ENROLL_BYTES)?;
            file.into_photo()
        }
    };

    let collection = match target {
        EnrollTarget::Persona(_) => &state.config.vendors.luxand_collection,
        EnrollTarget::Empleado(_) => &state.config.vendors.luxand_collection_empleados,
    };

    let enrollment = enroll(&state.db, state.vendors.face.as_ref(), target, photo, collection).await?;
    Ok(Json(enrollment))
}

#[derive(Debug, Serialize)]
pub struct PersonaEnrolada {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub luxand_uuid: Option<String>,
    pub tipo: PersonaTipo,
}

#[derive(Debug, Serialize)]
pub struct EmpleadoEnrolado {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub luxand_uuid: Option<String>,
    pub cargo_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EnroladosResponse {
    pub personas_enroladas: Vec<PersonaEnrolada>,
    pub empleados_enrolados: Vec<EmpleadoEnrolado>,
    pub total_personas: usize,
    pub total_empleados: usize,
    pub gallery_config: String,
}

/// Enrolled personas and empleados
pub async fn enrolados(State(state): State<AppState>) -> ApiResult<Json<EnroladosResponse>> {
    let personas: Vec<PersonaEnrolada> = Persona::list_enrolled(&state.db)
        .await?
        .into_iter()
        .map(|p| PersonaEnrolada {
            id: p.id,
            nombre: p.nombre,
            apellido: p.apellido,
            luxand_uuid: p.luxand_uuid,
            tipo: p.tipo,
        })
        .collect();

    let empleados: Vec<EmpleadoEnrolado> = Empleado::list_enrolled(&state.db)
        .await?
        .into_iter()
        .map(|e| EmpleadoEnrolado {
            id: e.id,
            nombre: e.nombre,
            apellido: e.apellido,
            luxand_uuid: e.luxand_uuid,
            cargo_id: e.cargo_id,
        })
        .collect();

    Ok(Json(EnroladosResponse {
        total_personas: personas.len(),
        total_empleados: empleados.len(),
        personas_enroladas: personas,
        empleados_enrolados: empleados,
        gallery_config: state.config.vendors.luxand_collection.clone(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ProveedorResponse {
    pub status: &'static str,
    pub proveedor: &'static str,
    pub codigo_estado: u16,
    pub respuesta: String,
    pub coleccion: String,
}

/// Face vendor connectivity check
///
/// A reachable vendor that answers with a non-200 status still yields
/// `200 OK` here with `"status": "error"`; a missing token or a network
/// failure maps to `503`.
pub async fn verificar_proveedor(State(state): State<AppState>) -> ApiResult<Json<ProveedorResponse>> {
    let estado = state.vendors.face.check().await?;

    if !estado.is_ok() {
        tracing::warn!(status = estado.status_code, "Face vendor check returned an error status");
    }

    Ok(Json(ProveedorResponse {
        status: if estado.is_ok() { "success" } else { "error" },
        proveedor: "luxand",
        codigo_estado: estado.status_code,
        respuesta: estado.body,
        coleccion: state.config.vendors.luxand_collection.clone(),
    }))
}
