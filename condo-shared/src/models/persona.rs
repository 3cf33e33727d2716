/// Persona model and role attachments
///
/// A persona is the shared identity record for everyone living in or
/// visiting the condominium. What a persona *is* (propietario, inquilino,
/// familiar, visitante) is stored in `tipo`, and role-specific data lives in
/// an attachment table keyed by `persona_id`:
///
/// ```text
/// personas ─┬─ inquilinos  (propietario_id, fecha_inicio, fecha_fin, estado_inquilino)
///           ├─ familiares  (persona_relacionada_id, parentesco)
///           └─ visitantes  (motivo_visita, observaciones)
/// ```
///
/// Requests carry the role as a tagged object:
///
/// ```json
/// { "rol": { "tipo": "inquilino", "propietario_id": "…", "fecha_inicio": "2025-01-01" } }
/// ```
///
/// The persona row and its attachment are always written in one transaction.

use crate::db::listing::{Filter, ListParams};
use crate::error::{DomainError, DomainResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

/// Persona role tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "persona_tipo", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PersonaTipo {
    Propietario,
    Inquilino,
    Familiar,
    Visitante,
}

impl PersonaTipo {
    /// Converts the tag to its database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaTipo::Propietario => "propietario",
            PersonaTipo::Inquilino => "inquilino",
            PersonaTipo::Familiar => "familiar",
            PersonaTipo::Visitante => "visitante",
        }
    }

    /// Residents who can host visits, book areas and have relatives
    pub fn is_resident(&self) -> bool {
        matches!(self, PersonaTipo::Propietario | PersonaTipo::Inquilino)
    }
}

/// Account status, shared by personas and empleados
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "persona_estado", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EstadoPersona {
    #[default]
    Activo,
    Inactivo,
    Suspendido,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sexo", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sexo {
    Masculino,
    Femenino,
    Otro,
}

/// Tenancy status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "estado_inquilino", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EstadoInquilino {
    #[default]
    Activo,
    Inactivo,
    Finalizado,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "parentesco", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Parentesco {
    Padre,
    Madre,
    Hijo,
    Hija,
    Hermano,
    Hermana,
    Esposo,
    Esposa,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "motivo_visita", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MotivoVisita {
    #[default]
    Familia,
    Trabajo,
    Servicio,
    Social,
    Otro,
}

/// Persona row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Persona {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub telefono: Option<String>,
    /// Hosted photo URL
    pub imagen: Option<String>,
    pub estado: EstadoPersona,
    pub sexo: Sexo,
    pub tipo: PersonaTipo,
    /// National ID, unique
    pub ci: String,
    pub fecha_nacimiento: NaiveDate,
    pub fecha_registro: DateTime<Utc>,
    /// Biometric identity issued by the face recognition vendor
    pub luxand_uuid: Option<String>,
    /// Linked login account
    pub user_id: Option<Uuid>,
}

impl Persona {
    /// "nombre apellido"
    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct InquilinoDatos {
    pub propietario_id: Uuid,
    pub fecha_inicio: Option<NaiveDate>,
    pub fecha_fin: Option<NaiveDate>,
    #[serde(default)]
    pub estado_inquilino: EstadoInquilino,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FamiliarDatos {
    pub persona_relacionada_id: Uuid,
    pub parentesco: Parentesco,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VisitanteDatos {
    #[serde(default)]
    pub motivo_visita: MotivoVisita,
    pub observaciones: Option<String>,
}

/// Role attachment, tagged by `tipo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum Rol {
    Propietario,
    Inquilino(InquilinoDatos),
    Familiar(FamiliarDatos),
    Visitante(VisitanteDatos),
}

impl Rol {
    /// Tag stored on the persona row
    pub fn tipo(&self) -> PersonaTipo {
        match self {
            Rol::Propietario => PersonaTipo::Propietario,
            Rol::Inquilino(_) => PersonaTipo::Inquilino,
            Rol::Familiar(_) => PersonaTipo::Familiar,
            Rol::Visitante(_) => PersonaTipo::Visitante,
        }
    }

    /// Checks rules that need no database access
    pub fn validate_shape(&self, persona_id: Option<Uuid>) -> DomainResult<()> {
        match self {
            Rol::Inquilino(datos) => {
                if let (Some(inicio), Some(fin)) = (datos.fecha_inicio, datos.fecha_fin) {
                    if fin < inicio {
                        return Err(DomainError::validation(
                            "fecha_fin",
                            "La fecha de fin debe ser posterior a la fecha de inicio.",
                        ));
                    }
                }
                if Some(datos.propietario_id) == persona_id {
                    return Err(DomainError::validation(
                        "propietario_id",
                        "El inquilino no puede ser el mismo que el propietario.",
                    ));
                }
            }
            Rol::Familiar(datos) => {
                if Some(datos.persona_relacionada_id) == persona_id {
                    return Err(DomainError::validation(
                        "persona_relacionada_id",
                        "El familiar no puede ser el mismo que la persona relacionada.",
                    ));
                }
            }
            Rol::Propietario | Rol::Visitante(_) => {}
        }
        Ok(())
    }
}

/// Persona with its role attachment
#[derive(Debug, Clone, Serialize)]
pub struct PersonaDetalle {
    #[serde(flatten)]
    pub persona: Persona,
    pub nombre_completo: String,
    pub rol: Rol,
}

/// Input for creating a persona
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePersona {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: String,
    #[validate(length(min = 1, max = 100, message = "El apellido es obligatorio"))]
    pub apellido: String,
    #[validate(length(max = 15, message = "Máximo 15 caracteres"))]
    pub telefono: Option<String>,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub imagen: Option<String>,
    #[serde(default)]
    pub estado: EstadoPersona,
    pub sexo: Sexo,
    #[validate(length(min = 1, max = 20, message = "La cédula es obligatoria"))]
    pub ci: String,
    pub fecha_nacimiento: NaiveDate,
    pub user_id: Option<Uuid>,
    pub rol: Rol,
}

/// Partial update; `rol` must keep the same tag
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePersona {
    #[validate(length(min = 1, max = 100))]
    pub nombre: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub apellido: Option<String>,
    #[validate(length(max = 15))]
    pub telefono: Option<String>,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub imagen: Option<String>,
    pub estado: Option<EstadoPersona>,
    pub sexo: Option<Sexo>,
    #[validate(length(min = 1, max = 20))]
    pub ci: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub user_id: Option<Uuid>,
    pub rol: Option<Rol>,
}

/// List filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonaFilter {
    pub tipo: Option<PersonaTipo>,
    pub estado: Option<EstadoPersona>,
    /// Inquilinos of this propietario
    pub propietario: Option<Uuid>,
    pub estado_inquilino: Option<EstadoInquilino>,
}

const ORDERING: &[(&str, &str)] = &[
    ("nombre", "p.nombre"),
    ("apellido", "p.apellido"),
    ("ci", "p.ci"),
    ("fecha_registro", "p.fecha_registro"),
];

fn check_birth_date(fecha_nacimiento: NaiveDate, today: NaiveDate) -> DomainResult<()> {
    if fecha_nacimiento > today {
        return Err(DomainError::validation(
            "fecha_nacimiento",
            "La fecha de nacimiento no puede ser en el futuro.",
        ));
    }
    Ok(())
}

impl Persona {
    /// Creates a persona and its role attachment
    ///
    /// # Errors
    ///
    /// - `Conflict` if the CI is already registered
    /// - `Validation` for future birth dates and invalid role references
    pub async fn create(pool: &PgPool, input: CreatePersona) -> DomainResult<PersonaDetalle> {
        check_birth_date(input.fecha_nacimiento, Utc::now().date_naive())?;
        input.rol.validate_shape(None)?;

        let mut tx = pool.begin().await?;

        ensure_ci_available(&mut tx, &input.ci, None).await?;
        validate_rol_references(&mut tx, &input.rol).await?;

        let persona = sqlx::query_as::<_, Persona>(
            r#"
            INSERT INTO personas (nombre, apellido, telefono, imagen, estado, sexo, tipo, ci, fecha_nacimiento, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&input.nombre)
        .bind(&input.apellido)
        .bind(&input.telefono)
        .bind(&input.imagen)
        .bind(input.estado)
        .bind(input.sexo)
        .bind(input.rol.tipo())
        .bind(&input.ci)
        .bind(input.fecha_nacimiento)
        .bind(input.user_id)
        .fetch_one(&mut *tx)
        .await?;

        write_attachment(&mut tx, persona.id, &input.rol).await?;

        tx.commit().await?;

        tracing::info!(persona_id = %persona.id, tipo = persona.tipo.as_str(), "Persona created");

        Ok(PersonaDetalle {
            nombre_completo: persona.nombre_completo(),
            persona,
            rol: input.rol,
        })
    }

    /// Finds a persona by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Persona>, sqlx::Error> {
        sqlx::query_as::<_, Persona>("SELECT * FROM personas WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a persona with its role attachment
    pub async fn find_detalle(pool: &PgPool, id: Uuid) -> Result<Option<PersonaDetalle>, sqlx::Error> {
        let Some(persona) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let mut conn = pool.acquire().await?;
        let rol = load_rol(&mut conn, &persona).await?;

        Ok(Some(PersonaDetalle {
            nombre_completo: persona.nombre_completo(),
            persona,
            rol,
        }))
    }

    /// Finds the persona enrolled under a biometric identity
    pub async fn find_by_luxand_uuid(
        pool: &PgPool,
        luxand_uuid: &str,
    ) -> Result<Option<Persona>, sqlx::Error> {
        sqlx::query_as::<_, Persona>("SELECT * FROM personas WHERE luxand_uuid = $1 LIMIT 1")
            .bind(luxand_uuid)
            .fetch_optional(pool)
            .await
    }

    /// Lists personas with filters, search and ordering
    pub async fn list(
        pool: &PgPool,
        filter: &PersonaFilter,
        params: &ListParams,
    ) -> Result<Vec<Persona>, sqlx::Error> {
        let mut query = Filter::new(
            "SELECT p.* FROM personas p LEFT JOIN inquilinos i ON i.persona_id = p.id",
        );
        query
            .eq("p.tipo", filter.tipo)
            .eq("p.estado", filter.estado)
            .eq("i.propietario_id", filter.propietario)
            .eq("i.estado_inquilino", filter.estado_inquilino)
            .search(params, &["p.nombre", "p.apellido", "p.ci", "p.telefono"]);

        query
            .finish(params, ORDERING, "p.apellido ASC, p.nombre ASC")
            .build_query_as::<Persona>()
            .fetch_all(pool)
            .await
    }

    /// Active propietarios and inquilinos, for selection lists
    pub async fn list_disponibles(pool: &PgPool) -> Result<Vec<Persona>, sqlx::Error> {
        sqlx::query_as::<_, Persona>(
            r#"
            SELECT * FROM personas
            WHERE tipo IN ('propietario', 'inquilino') AND estado = 'activo'
            ORDER BY apellido, nombre
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Personas with a biometric identity
    pub async fn list_enrolled(pool: &PgPool) -> Result<Vec<Persona>, sqlx::Error> {
        sqlx::query_as::<_, Persona>(
            "SELECT * FROM personas WHERE luxand_uuid IS NOT NULL ORDER BY apellido, nombre",
        )
        .fetch_all(pool)
        .await
    }

    /// Updates a persona and, when given, its role attachment
    ///
    /// # Errors
    ///
    /// - `NotFound` if the persona does not exist
    /// - `Validation` if `rol` changes the persona's tag
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdatePersona) -> DomainResult<PersonaDetalle> {
        if let Some(fecha) = input.fecha_nacimiento {
            check_birth_date(fecha, Utc::now().date_naive())?;
        }

        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, Persona>("SELECT * FROM personas WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DomainError::NotFound("Persona"))?;

        if let Some(rol) = &input.rol {
            if rol.tipo() != current.tipo {
                return Err(DomainError::validation(
                    "rol",
                    "El tipo de persona no puede modificarse.",
                ));
            }
            rol.validate_shape(Some(id))?;
            validate_rol_references(&mut tx, rol).await?;
        }

        if let Some(ci) = &input.ci {
            ensure_ci_available(&mut tx, ci, Some(id)).await?;
        }

        let persona = sqlx::query_as::<_, Persona>(
            r#"
            UPDATE personas
            SET nombre = COALESCE($2, nombre),
                apellido = COALESCE($3, apellido),
                telefono = COALESCE($4, telefono),
                imagen = COALESCE($5, imagen),
                estado = COALESCE($6, estado),
                sexo = COALESCE($7, sexo),
                ci = COALESCE($8, ci),
                fecha_nacimiento = COALESCE($9, fecha_nacimiento),
                user_id = COALESCE($10, user_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.nombre)
        .bind(&input.apellido)
        .bind(&input.telefono)
        .bind(&input.imagen)
        .bind(input.estado)
        .bind(input.sexo)
        .bind(&input.ci)
        .bind(input.fecha_nacimiento)
        .bind(input.user_id)
        .fetch_one(&mut *tx)
        .await?;

        let rol = match input.rol {
            Some(rol) => {
                write_attachment(&mut tx, id, &rol).await?;
                rol
            }
            None => load_rol(&mut tx, &persona).await?,
        };

        tx.commit().await?;

        Ok(PersonaDetalle {
            nombre_completo: persona.nombre_completo(),
            persona,
            rol,
        })
    }

    /// Stores the biometric identity if none is assigned yet
    ///
    /// Returns `false` when the persona already had one.
    pub async fn set_luxand_uuid(pool: &PgPool, id: Uuid, luxand_uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE personas SET luxand_uuid = $2 WHERE id = $1 AND luxand_uuid IS NULL",
        )
        .bind(id)
        .bind(luxand_uuid)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes a persona (attachments cascade)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM personas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

async fn ensure_ci_available(
    conn: &mut PgConnection,
    ci: &str,
    except: Option<Uuid>,
) -> DomainResult<()> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM personas WHERE ci = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(ci)
    .bind(except)
    .fetch_one(&mut *conn)
    .await?;

    if taken {
        return Err(DomainError::Conflict("Esta cédula ya está registrada.".to_string()));
    }
    Ok(())
}

async fn tipo_of(conn: &mut PgConnection, id: Uuid) -> Result<Option<PersonaTipo>, sqlx::Error> {
    sqlx::query_scalar("SELECT tipo FROM personas WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

async fn validate_rol_references(conn: &mut PgConnection, rol: &Rol) -> DomainResult<()> {
    match rol {
        Rol::Inquilino(datos) => {
            if tipo_of(conn, datos.propietario_id).await? != Some(PersonaTipo::Propietario) {
                return Err(DomainError::validation(
                    "propietario_id",
                    "La persona seleccionada no es un propietario.",
                ));
            }
        }
        Rol::Familiar(datos) => {
            let resident = tipo_of(conn, datos.persona_relacionada_id)
                .await?
                .is_some_and(|tipo| tipo.is_resident());
            if !resident {
                return Err(DomainError::validation(
                    "persona_relacionada_id",
                    "La persona relacionada debe ser propietario o inquilino.",
                ));
            }
        }
        Rol::Propietario | Rol::Visitante(_) => {}
    }
    Ok(())
}

async fn write_attachment(conn: &mut PgConnection, persona_id: Uuid, rol: &Rol) -> Result<(), sqlx::Error> {
    match rol {
        Rol::Propietario => {}
        Rol::Inquilino(datos) => {
            sqlx::query(
                r#"
                INSERT INTO inquilinos (persona_id, propietario_id, fecha_inicio, fecha_fin, estado_inquilino)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (persona_id) DO UPDATE
                SET propietario_id = EXCLUDED.propietario_id,
                    fecha_inicio = EXCLUDED.fecha_inicio,
                    fecha_fin = EXCLUDED.fecha_fin,
                    estado_inquilino = EXCLUDED.estado_inquilino
                "#,
            )
            .bind(persona_id)
            .bind(datos.propietario_id)
            .bind(datos.fecha_inicio)
            .bind(datos.fecha_fin)
            .bind(datos.estado_inquilino)
            .execute(&mut *conn)
            .await?;
        }
        Rol::Familiar(datos) => {
            sqlx::query(
                r#"
                INSERT INTO familiares (persona_id, persona_relacionada_id, parentesco)
                VALUES ($1, $2, $3)
                ON CONFLICT (persona_id) DO UPDATE
                SET persona_relacionada_id = EXCLUDED.persona_relacionada_id,
                    parentesco = EXCLUDED.parentesco
                "#,
            )
            .bind(persona_id)
            .bind(datos.persona_relacionada_id)
            .bind(datos.parentesco)
            .execute(&mut *conn)
            .await?;
        }
        Rol::Visitante(datos) => {
            sqlx::query(
                r#"
                INSERT INTO visitantes (persona_id, motivo_visita, observaciones)
                VALUES ($1, $2, $3)
                ON CONFLICT (persona_id) DO UPDATE
                SET motivo_visita = EXCLUDED.motivo_visita,
                    observaciones = EXCLUDED.observaciones
                "#,
            )
            .bind(persona_id)
            .bind(datos.motivo_visita)
            .bind(&datos.observaciones)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

async fn load_rol(conn: &mut PgConnection, persona: &Persona) -> Result<Rol, sqlx::Error> {
    let rol = match persona.tipo {
        PersonaTipo::Propietario => Rol::Propietario,
        PersonaTipo::Inquilino => Rol::Inquilino(
            sqlx::query_as::<_, InquilinoDatos>(
                "SELECT propietario_id, fecha_inicio, fecha_fin, estado_inquilino FROM inquilinos WHERE persona_id = $1",
            )
            .bind(persona.id)
            .fetch_one(&mut *conn)
            .await?,
        ),
        PersonaTipo::Familiar => Rol::Familiar(
            sqlx::query_as::<_, FamiliarDatos>(
                "SELECT persona_relacionada_id, parentesco FROM familiares WHERE persona_id = $1",
            )
            .bind(persona.id)
            .fetch_one(&mut *conn)
            .await?,
        ),
        PersonaTipo::Visitante => Rol::Visitante(
            sqlx::query_as::<_, VisitanteDatos>(
                "SELECT motivo_visita, observaciones FROM visitantes WHERE persona_id = $1",
            )
            .bind(persona.id)
            .fetch_one(&mut *conn)
            .await?,
        ),
    };
    Ok(rol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rol_deserializes_tagged() {
        let rol: Rol = serde_json::from_value(json!({
            "tipo": "inquilino",
            "propietario_id": "8c0c3b8e-6a4f-4c1e-9a57-0c6f1f4f8a10",
            "fecha_inicio": "2025-01-01",
            "fecha_fin": null
        }))
        .unwrap();

        match rol {
            Rol::Inquilino(datos) => {
                assert_eq!(datos.estado_inquilino, EstadoInquilino::Activo);
                assert_eq!(datos.fecha_inicio, NaiveDate::from_ymd_opt(2025, 1, 1));
            }
            other => panic!("unexpected rol: {:?}", other),
        }

        let rol: Rol = serde_json::from_value(json!({ "tipo": "propietario" })).unwrap();
        assert_eq!(rol.tipo(), PersonaTipo::Propietario);

        let rol: Rol = serde_json::from_value(json!({ "tipo": "visitante" })).unwrap();
        assert_eq!(
            rol,
            Rol::Visitante(VisitanteDatos {
                motivo_visita: MotivoVisita::Familia,
                observaciones: None
            })
        );
    }

    #[test]
    fn test_inquilino_date_range() {
        let rol = Rol::Inquilino(InquilinoDatos {
            propietario_id: Uuid::new_v4(),
            fecha_inicio: NaiveDate::from_ymd_opt(2025, 6, 1),
            fecha_fin: NaiveDate::from_ymd_opt(2025, 5, 1),
            estado_inquilino: EstadoInquilino::Activo,
        });

        let err = rol.validate_shape(None).unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "fecha_fin", .. }));
    }

    #[test]
    fn test_roles_cannot_reference_self() {
        let id = Uuid::new_v4();

        let inquilino = Rol::Inquilino(InquilinoDatos {
            propietario_id: id,
            fecha_inicio: None,
            fecha_fin: None,
            estado_inquilino: EstadoInquilino::Activo,
        });
        assert!(inquilino.validate_shape(Some(id)).is_err());
        assert!(inquilino.validate_shape(None).is_ok());

        let familiar = Rol::Familiar(FamiliarDatos {
            persona_relacionada_id: id,
            parentesco: Parentesco::Hijo,
        });
        assert!(familiar.validate_shape(Some(id)).is_err());
    }

    #[test]
    fn test_birth_date_not_in_future() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(check_birth_date(today, today).is_ok());
        assert!(check_birth_date(NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(), today).is_err());
    }

    #[test]
    fn test_resident_tipos() {
        assert!(PersonaTipo::Propietario.is_resident());
        assert!(PersonaTipo::Inquilino.is_resident());
        assert!(!PersonaTipo::Familiar.is_resident());
        assert!(!PersonaTipo::Visitante.is_resident());
    }
}
