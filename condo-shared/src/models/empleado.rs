/// Empleado and Cargo models
///
/// Staff records are independent of personas but share the biometric
/// enrollment flow: an empleado with a photo and no `luxand_uuid` is
/// enrolled into the staff gallery after every write.

use crate::db::listing::{Filter, ListParams};
use crate::error::{DomainError, DomainResult};
use crate::models::persona::{EstadoPersona, Sexo};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Job position
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cargo {
    pub id: Uuid,
    pub nombre: String,
    pub salario_base: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCargo {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: String,
    #[serde(default)]
    pub salario_base: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCargo {
    #[validate(length(min = 1, max = 100))]
    pub nombre: Option<String>,
    pub salario_base: Option<Decimal>,
}

impl Cargo {
    pub async fn create(pool: &PgPool, input: CreateCargo) -> Result<Cargo, sqlx::Error> {
        sqlx::query_as::<_, Cargo>(
            "INSERT INTO cargos (nombre, salario_base) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.nombre)
        .bind(input.salario_base)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Cargo>, sqlx::Error> {
        sqlx::query_as::<_, Cargo>("SELECT * FROM cargos WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, params: &ListParams) -> Result<Vec<Cargo>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM cargos");
        query.search(params, &["nombre"]);
        query
            .finish(
                params,
                &[("nombre", "nombre"), ("salario_base", "salario_base")],
                "nombre ASC",
            )
            .build_query_as::<Cargo>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateCargo) -> Result<Option<Cargo>, sqlx::Error> {
        sqlx::query_as::<_, Cargo>(
            r#"
            UPDATE cargos
            SET nombre = COALESCE($2, nombre),
                salario_base = COALESCE($3, salario_base)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.nombre)
        .bind(input.salario_base)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a cargo; fails with a foreign key error while empleados use it
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cargos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Employee row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Empleado {
    pub id: Uuid,
    pub nombre: String,
    pub apellido: String,
    pub telefono: Option<String>,
    pub direccion: String,
    pub sexo: Sexo,
    pub ci: String,
    pub fecha_nacimiento: NaiveDate,
    pub estado: EstadoPersona,
    pub sueldo: Decimal,
    pub imagen: Option<String>,
    pub fecha_registro: DateTime<Utc>,
    pub luxand_uuid: Option<String>,
    pub user_id: Option<Uuid>,
    pub cargo_id: Uuid,
}

impl Empleado {
    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombre, self.apellido)
    }
}

fn default_fecha_nacimiento() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEmpleado {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: String,
    #[validate(length(min = 1, max = 100, message = "El apellido es obligatorio"))]
    pub apellido: String,
    #[validate(length(max = 15))]
    pub telefono: Option<String>,
    #[validate(length(min = 1, message = "La dirección es obligatoria"))]
    pub direccion: String,
    pub sexo: Sexo,
    #[validate(length(min = 1, max = 20, message = "La cédula es obligatoria"))]
    pub ci: String,
    #[serde(default = "default_fecha_nacimiento")]
    pub fecha_nacimiento: NaiveDate,
    #[serde(default)]
    pub estado: EstadoPersona,
    pub sueldo: Decimal,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub imagen: Option<String>,
    pub user_id: Option<Uuid>,
    pub cargo_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEmpleado {
    #[validate(length(min = 1, max = 100))]
    pub nombre: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub apellido: Option<String>,
    #[validate(length(max = 15))]
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub sexo: Option<Sexo>,
    #[validate(length(min = 1, max = 20))]
    pub ci: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub estado: Option<EstadoPersona>,
    pub sueldo: Option<Decimal>,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub imagen: Option<String>,
    pub user_id: Option<Uuid>,
    pub cargo_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmpleadoFilter {
    pub estado: Option<EstadoPersona>,
    pub cargo: Option<Uuid>,
    pub sueldo_min: Option<Decimal>,
    pub sueldo_max: Option<Decimal>,
}

const ORDERING: &[(&str, &str)] = &[
    ("nombre", "e.nombre"),
    ("apellido", "e.apellido"),
    ("sueldo", "e.sueldo"),
    ("fecha_registro", "e.fecha_registro"),
];

impl Empleado {
    /// Creates an empleado
    ///
    /// # Errors
    ///
    /// - `Conflict` if the CI is already registered
    /// - `NotFound` if the cargo does not exist
    pub async fn create(pool: &PgPool, input: CreateEmpleado) -> DomainResult<Empleado> {
        ensure_ci_available(pool, &input.ci, None).await?;
        if Cargo::find_by_id(pool, input.cargo_id).await?.is_none() {
            return Err(DomainError::NotFound("Cargo"));
        }

        let empleado = sqlx::query_as::<_, Empleado>(
            r#"
            INSERT INTO empleados (nombre, apellido, telefono, direccion, sexo, ci, fecha_nacimiento,
                                   estado, sueldo, imagen, user_id, cargo_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(&input.nombre)
        .bind(&input.apellido)
        .bind(&input.telefono)
        .bind(&input.direccion)
        .bind(input.sexo)
        .bind(&input.ci)
        .bind(input.fecha_nacimiento)
        .bind(input.estado)
        .bind(input.sueldo)
        .bind(&input.imagen)
        .bind(input.user_id)
        .bind(input.cargo_id)
        .fetch_one(pool)
        .await?;

        tracing::info!(empleado_id = %empleado.id, "Empleado created");
        Ok(empleado)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Empleado>, sqlx::Error> {
        sqlx::query_as::<_, Empleado>("SELECT * FROM empleados WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_luxand_uuid(
        pool: &PgPool,
        luxand_uuid: &str,
    ) -> Result<Option<Empleado>, sqlx::Error> {
        sqlx::query_as::<_, Empleado>("SELECT * FROM empleados WHERE luxand_uuid = $1 LIMIT 1")
            .bind(luxand_uuid)
            .fetch_optional(pool)
            .await
    }

    /// Lists empleados; search also matches the cargo name
    pub async fn list(
        pool: &PgPool,
        filter: &EmpleadoFilter,
        params: &ListParams,
    ) -> Result<Vec<Empleado>, sqlx::Error> {
        let mut query = Filter::new("SELECT e.* FROM empleados e JOIN cargos c ON c.id = e.cargo_id");
        query
            .eq("e.estado", filter.estado)
            .eq("e.cargo_id", filter.cargo)
            .gte("e.sueldo", filter.sueldo_min)
            .lte("e.sueldo", filter.sueldo_max)
            .search(params, &["e.nombre", "e.apellido", "e.ci", "e.telefono", "c.nombre"]);

        query
            .finish(params, ORDERING, "e.apellido ASC, e.nombre ASC")
            .build_query_as::<Empleado>()
            .fetch_all(pool)
            .await
    }

    pub async fn list_enrolled(pool: &PgPool) -> Result<Vec<Empleado>, sqlx::Error> {
        sqlx::query_as::<_, Empleado>(
            "SELECT * FROM empleados WHERE luxand_uuid IS NOT NULL ORDER BY apellido, nombre",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateEmpleado) -> DomainResult<Empleado> {
        if let Some(ci) = &input.ci {
            ensure_ci_available(pool, ci, Some(id)).await?;
        }
        if let Some(cargo_id) = input.cargo_id {
            if Cargo::find_by_id(pool, cargo_id).await?.is_none() {
                return Err(DomainError::NotFound("Cargo"));
            }
        }

        sqlx::query_as::<_, Empleado>(
            r#"
            UPDATE empleados
            SET nombre = COALESCE($2, nombre),
                apellido = COALESCE($3, apellido),
                telefono = COALESCE($4, telefono),
                direccion = COALESCE($5, direccion),
                sexo = COALESCE($6, sexo),
                ci = COALESCE($7, ci),
                fecha_nacimiento = COALESCE($8, fecha_nacimiento),
                estado = COALESCE($9, estado),
                sueldo = COALESCE($10, sueldo),
                imagen = COALESCE($11, imagen),
                user_id = COALESCE($12, user_id),
                cargo_id = COALESCE($13, cargo_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.nombre)
        .bind(&input.apellido)
        .bind(&input.telefono)
        .bind(&input.direccion)
        .bind(input.sexo)
        .bind(&input.ci)
        .bind(input.fecha_nacimiento)
        .bind(input.estado)
        .bind(input.sueldo)
        .bind(&input.imagen)
        .bind(input.user_id)
        .bind(input.cargo_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DomainError::NotFound("Empleado"))
    }

    /// Stores the biometric identity if none is assigned yet
    pub async fn set_luxand_uuid(pool: &PgPool, id: Uuid, luxand_uuid: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE empleados SET luxand_uuid = $2 WHERE id = $1 AND luxand_uuid IS NULL",
        )
        .bind(id)
        .bind(luxand_uuid)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM empleados WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn ensure_ci_available(pool: &PgPool, ci: &str, except: Option<Uuid>) -> DomainResult<()> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM empleados WHERE ci = $1 AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(ci)
    .bind(except)
    .fetch_one(pool)
    .await?;

    if taken {
        return Err(DomainError::Conflict("Esta cédula ya está registrada.".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_empleado_defaults() {
        let input: CreateEmpleado = serde_json::from_value(json!({
            "nombre": "Luis",
            "apellido": "Rojas",
            "direccion": "Av. Banzer 123",
            "sexo": "masculino",
            "ci": "7845123",
            "sueldo": "3500.00",
            "cargo_id": "2f0e8c52-6f0e-4df8-9a8b-62e1b8a4c0d1"
        }))
        .unwrap();

        assert_eq!(input.fecha_nacimiento, NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(input.estado, EstadoPersona::Activo);
        assert_eq!(input.sueldo, Decimal::new(350000, 2));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_empleado_rejects_bad_image_url() {
        let input: CreateEmpleado = serde_json::from_value(json!({
            "nombre": "Luis",
            "apellido": "Rojas",
            "direccion": "Av. Banzer 123",
            "sexo": "masculino",
            "ci": "7845123",
            "sueldo": 3500,
            "imagen": "not a url",
            "cargo_id": "2f0e8c52-6f0e-4df8-9a8b-62e1b8a4c0d1"
        }))
        .unwrap();

        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("imagen"));
    }
}
