/// Bloque and Unidad models
///
/// A unidad belongs to exactly one bloque and is unique by `codigo` and by
/// `(bloque_id, numero)`. Its `estado` follows contract activity: see
/// [`crate::models::contrato`] for the writes that keep it in sync.

use crate::db::listing::{Filter, ListParams};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

/// Building
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bloque {
    pub id: Uuid,
    pub nombre: String,
    pub direccion: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBloque {
    #[validate(length(min = 1, max = 20, message = "El nombre es obligatorio"))]
    pub nombre: String,
    #[validate(length(min = 1, max = 100, message = "La dirección es obligatoria"))]
    pub direccion: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBloque {
    #[validate(length(min = 1, max = 20))]
    pub nombre: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub direccion: Option<String>,
}

impl Bloque {
    pub async fn create(pool: &PgPool, input: CreateBloque) -> Result<Bloque, sqlx::Error> {
        sqlx::query_as::<_, Bloque>(
            "INSERT INTO bloques (nombre, direccion) VALUES ($1, $2) RETURNING *",
        )
        .bind(&input.nombre)
        .bind(&input.direccion)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Bloque>, sqlx::Error> {
        sqlx::query_as::<_, Bloque>("SELECT * FROM bloques WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, params: &ListParams) -> Result<Vec<Bloque>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM bloques");
        query.search(params, &["nombre", "direccion"]);
        query
            .finish(params, &[("nombre", "nombre")], "nombre ASC")
            .build_query_as::<Bloque>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateBloque) -> Result<Option<Bloque>, sqlx::Error> {
        sqlx::query_as::<_, Bloque>(
            r#"
            UPDATE bloques
            SET nombre = COALESCE($2, nombre),
                direccion = COALESCE($3, direccion)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.nombre)
        .bind(&input.direccion)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bloques WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "unidad_tipo", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoUnidad {
    #[default]
    Apartamento,
    Casa,
    LocalComercial,
    Estacionamiento,
}

/// Occupancy state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "unidad_estado", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EstadoUnidad {
    #[default]
    Disponible,
    Ocupada,
    Mantenimiento,
    Reservada,
}

impl EstadoUnidad {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoUnidad::Disponible => "disponible",
            EstadoUnidad::Ocupada => "ocupada",
            EstadoUnidad::Mantenimiento => "mantenimiento",
            EstadoUnidad::Reservada => "reservada",
        }
    }
}

/// Unit row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Unidad {
    pub id: Uuid,
    pub numero: String,
    pub codigo: String,
    pub descripcion: Option<String>,
    pub imagen: Option<String>,
    pub dimensiones: Option<String>,
    pub tipo_unidad: TipoUnidad,
    pub estado: EstadoUnidad,
    pub bloque_id: Uuid,
    pub numero_piso: i32,
    pub area_m2: Option<Decimal>,
    pub fecha_creacion: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUnidad {
    #[validate(length(min = 1, max = 10, message = "El número es obligatorio"))]
    pub numero: String,
    #[validate(length(min = 1, max = 20, message = "El código es obligatorio"))]
    pub codigo: String,
    pub descripcion: Option<String>,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub imagen: Option<String>,
    #[validate(length(max = 100))]
    pub dimensiones: Option<String>,
    #[serde(default)]
    pub tipo_unidad: TipoUnidad,
    #[serde(default)]
    pub estado: EstadoUnidad,
    pub bloque_id: Uuid,
    #[serde(default = "default_piso")]
    #[validate(range(min = 1, message = "El piso debe ser mayor o igual a 1"))]
    pub numero_piso: i32,
    pub area_m2: Option<Decimal>,
}

fn default_piso() -> i32 {
    1
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUnidad {
    #[validate(length(min = 1, max = 10))]
    pub numero: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub codigo: Option<String>,
    pub descripcion: Option<String>,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub imagen: Option<String>,
    pub dimensiones: Option<String>,
    pub tipo_unidad: Option<TipoUnidad>,
    pub estado: Option<EstadoUnidad>,
    pub bloque_id: Option<Uuid>,
    #[validate(range(min = 1))]
    pub numero_piso: Option<i32>,
    pub area_m2: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnidadFilter {
    pub bloque: Option<Uuid>,
    pub estado: Option<EstadoUnidad>,
    pub tipo_unidad: Option<TipoUnidad>,
}

const ORDERING: &[(&str, &str)] = &[
    ("numero", "numero"),
    ("codigo", "codigo"),
    ("numero_piso", "numero_piso"),
    ("fecha_creacion", "fecha_creacion"),
];

impl Unidad {
    pub async fn create(pool: &PgPool, input: CreateUnidad) -> Result<Unidad, sqlx::Error> {
        sqlx::query_as::<_, Unidad>(
            r#"
            INSERT INTO unidades (numero, codigo, descripcion, imagen, dimensiones, tipo_unidad,
                                  estado, bloque_id, numero_piso, area_m2)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&input.numero)
        .bind(&input.codigo)
        .bind(&input.descripcion)
        .bind(&input.imagen)
        .bind(&input.dimensiones)
        .bind(input.tipo_unidad)
        .bind(input.estado)
        .bind(input.bloque_id)
        .bind(input.numero_piso)
        .bind(input.area_m2)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Unidad>, sqlx::Error> {
        sqlx::query_as::<_, Unidad>("SELECT * FROM unidades WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &UnidadFilter,
        params: &ListParams,
    ) -> Result<Vec<Unidad>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM unidades");
        query
            .eq("bloque_id", filter.bloque)
            .eq("estado", filter.estado)
            .eq("tipo_unidad", filter.tipo_unidad)
            .search(params, &["numero", "codigo", "descripcion"]);

        query
            .finish(params, ORDERING, "bloque_id, numero_piso, numero")
            .build_query_as::<Unidad>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateUnidad) -> Result<Option<Unidad>, sqlx::Error> {
        sqlx::query_as::<_, Unidad>(
            r#"
            UPDATE unidades
            SET numero = COALESCE($2, numero),
                codigo = COALESCE($3, codigo),
                descripcion = COALESCE($4, descripcion),
                imagen = COALESCE($5, imagen),
                dimensiones = COALESCE($6, dimensiones),
                tipo_unidad = COALESCE($7, tipo_unidad),
                estado = COALESCE($8, estado),
                bloque_id = COALESCE($9, bloque_id),
                numero_piso = COALESCE($10, numero_piso),
                area_m2 = COALESCE($11, area_m2)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.numero)
        .bind(&input.codigo)
        .bind(&input.descripcion)
        .bind(&input.imagen)
        .bind(&input.dimensiones)
        .bind(input.tipo_unidad)
        .bind(input.estado)
        .bind(input.bloque_id)
        .bind(input.numero_piso)
        .bind(input.area_m2)
        .fetch_optional(pool)
        .await
    }

    /// Sets the occupancy state inside an open transaction
    pub async fn set_estado(
        conn: &mut PgConnection,
        id: Uuid,
        estado: EstadoUnidad,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE unidades SET estado = $2 WHERE id = $1")
            .bind(id)
            .bind(estado)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM unidades WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_unidad_defaults() {
        let input: CreateUnidad = serde_json::from_value(json!({
            "numero": "101",
            "codigo": "A-101",
            "bloque_id": "0b5d9a3e-2d5f-4a43-9b53-5a9d55d2f0a7"
        }))
        .unwrap();

        assert_eq!(input.tipo_unidad, TipoUnidad::Apartamento);
        assert_eq!(input.estado, EstadoUnidad::Disponible);
        assert_eq!(input.numero_piso, 1);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_piso_must_be_positive() {
        let input: CreateUnidad = serde_json::from_value(json!({
            "numero": "101",
            "codigo": "A-101",
            "bloque_id": "0b5d9a3e-2d5f-4a43-9b53-5a9d55d2f0a7",
            "numero_piso": 0,
            "tipo_unidad": "local_comercial"
        }))
        .unwrap();

        assert_eq!(input.tipo_unidad, TipoUnidad::LocalComercial);
        assert!(input.validate().is_err());
    }
}
