/// Biometric enrollment of personas and empleados
///
/// Two entry points:
///
/// - [`auto_enroll_persona`] / [`auto_enroll_empleado`] run after a CRUD
///   write. They never fail the write: vendor errors are logged and the
///   record simply stays unenrolled.
/// - [`enroll`] backs the explicit enrollment endpoint and reports every
///   failure to the caller.

use crate::models::empleado::Empleado;
use crate::models::persona::Persona;
use crate::vendors::{FaceRecognition, Photo, VendorError};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Message shown when the vendor finds no face in the photo
pub const NO_FACE_HINT: &str = "No se detectó una cara en la imagen. Asegúrate de que la imagen \
muestre claramente el rostro de la persona, con buena iluminación y resolución.";

/// Who is being enrolled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollTarget {
    Persona(Uuid),
    Empleado(Uuid),
}

impl EnrollTarget {
    pub fn tipo(&self) -> &'static str {
        match self {
            EnrollTarget::Persona(_) => "persona",
            EnrollTarget::Empleado(_) => "empleado",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            EnrollTarget::Persona(_) => "Persona",
            EnrollTarget::Empleado(_) => "Empleado",
        }
    }
}

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("{0} no encontrado")]
    NotFound(&'static str),

    #[error("{0} ya está enrolado")]
    AlreadyEnrolled(&'static str),

    #[error("{}", NO_FACE_HINT)]
    NoFace,

    #[error(transparent)]
    Vendor(VendorError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<VendorError> for EnrollmentError {
    fn from(err: VendorError) -> Self {
        match err {
            VendorError::NoFaceDetected => EnrollmentError::NoFace,
            other => EnrollmentError::Vendor(other),
        }
    }
}

/// Successful enrollment
#[derive(Debug, Clone, Serialize)]
pub struct Enrollment {
    pub ok: bool,
    pub uuid: String,
    pub nombre: String,
    pub tipo: &'static str,
    pub mensaje: String,
}

/// Enrolls a persona or empleado that has no biometric identity yet
pub async fn enroll(
    pool: &PgPool,
    face: &dyn FaceRecognition,
    target: EnrollTarget,
    photo: Photo,
    collection: &str,
) -> Result<Enrollment, EnrollmentError> {
    let (nombre, enrolled) = match target {
        EnrollTarget::Persona(id) => {
            let persona = Persona::find_by_id(pool, id)
                .await?
                .ok_or(EnrollmentError::NotFound(target.label()))?;
            (persona.nombre_completo(), persona.luxand_uuid.is_some())
        }
        EnrollTarget::Empleado(id) => {
            let empleado = Empleado::find_by_id(pool, id)
                .await?
                .ok_or(EnrollmentError::NotFound(target.label()))?;
            (empleado.nombre_completo(), empleado.luxand_uuid.is_some())
        }
    };

    if enrolled {
        return Err(EnrollmentError::AlreadyEnrolled(target.label()));
    }

    let uuid = face.enroll(&nombre, photo, collection).await?;

    let stored = match target {
        EnrollTarget::Persona(id) => Persona::set_luxand_uuid(pool, id, &uuid).await?,
        EnrollTarget::Empleado(id) => Empleado::set_luxand_uuid(pool, id, &uuid).await?,
    };
    if !stored {
        return Err(EnrollmentError::AlreadyEnrolled(target.label()));
    }

    tracing::info!(tipo = target.tipo(), uuid = %uuid, "Enrolled in face recognition");

    Ok(Enrollment {
        ok: true,
        uuid,
        nombre,
        tipo: target.tipo(),
        mensaje: format!("{} enrolado exitosamente", target.label()),
    })
}

/// Enrolls a persona from its stored photo, swallowing vendor failures.
///
/// Returns the new UUID when enrollment happened.
pub async fn auto_enroll_persona(
    pool: &PgPool,
    face: &dyn FaceRecognition,
    collection: &str,
    persona: &Persona,
) -> Option<String> {
    let imagen = persona.imagen.as_deref().filter(|url| !url.is_empty())?;
    if persona.luxand_uuid.is_some() {
        return None;
    }

    let uuid = match face
        .enroll(&persona.nombre_completo(), Photo::Url(imagen.to_string()), collection)
        .await
    {
        Ok(uuid) => uuid,
        Err(e) => {
            tracing::warn!(persona_id = %persona.id, error = %e, "Face enrollment failed");
            return None;
        }
    };

    match Persona::set_luxand_uuid(pool, persona.id, &uuid).await {
        Ok(true) => Some(uuid),
        Ok(false) => None,
        Err(e) => {
            tracing::warn!(persona_id = %persona.id, error = %e, "Failed to store luxand uuid");
            None
        }
    }
}

/// Enrolls an empleado from its stored photo, swallowing vendor failures
pub async fn auto_enroll_empleado(
    pool: &PgPool,
    face: &dyn FaceRecognition,
    collection: &str,
    empleado: &Empleado,
) -> Option<String> {
    let imagen = empleado.imagen.as_deref().filter(|url| !url.is_empty())?;
    if empleado.luxand_uuid.is_some() {
        return None;
    }

    let uuid = match face
        .enroll(&empleado.nombre_completo(), Photo::Url(imagen.to_string()), collection)
        .await
    {
        Ok(uuid) => uuid,
        Err(e) => {
            tracing::warn!(empleado_id = %empleado.id, error = %e, "Face enrollment failed");
            return None;
        }
    };

    match Empleado::set_luxand_uuid(pool, empleado.id, &uuid).await {
        Ok(true) => Some(uuid),
        Ok(false) => None,
        Err(e) => {
            tracing::warn!(empleado_id = %empleado.id, error = %e, "Failed to store luxand uuid");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_face_maps_to_hint() {
        let err = EnrollmentError::from(VendorError::NoFaceDetected);
        assert!(matches!(err, EnrollmentError::NoFace));
        assert!(err.to_string().starts_with("No se detectó una cara"));
    }

    #[test]
    fn test_target_labels() {
        let target = EnrollTarget::Empleado(Uuid::nil());
        assert_eq!(target.tipo(), "empleado");
        assert_eq!(
            EnrollmentError::AlreadyEnrolled(target.label()).to_string(),
            "Empleado ya está enrolado"
        );
    }
}
