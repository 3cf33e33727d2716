/// Vehiculo model
///
/// Plates are unique ignoring case and stored upper-case, so ALPR readings
/// can be matched with a plain comparison.

use crate::db::listing::{Filter, ListParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vehiculo_tipo", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TipoVehiculo {
    Automovil,
    Camioneta,
    Suv,
    Motocicleta,
    Furgoneta,
    Crossover,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vehiculo {
    pub id: Uuid,
    pub color: String,
    pub marca: String,
    pub modelo: String,
    pub placa: String,
    pub tipo: TipoVehiculo,
    pub imagen: Option<String>,
    pub fecha_registro: DateTime<Utc>,
    /// Owner
    pub persona_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateVehiculo {
    #[validate(length(min = 1, max = 20))]
    pub color: String,
    #[validate(length(min = 1, max = 20))]
    pub marca: String,
    #[validate(length(min = 1, max = 20))]
    pub modelo: String,
    #[validate(length(min = 1, max = 20, message = "La placa es obligatoria"))]
    pub placa: String,
    pub tipo: TipoVehiculo,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub imagen: Option<String>,
    pub persona_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateVehiculo {
    #[validate(length(min = 1, max = 20))]
    pub color: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub marca: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub modelo: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub placa: Option<String>,
    pub tipo: Option<TipoVehiculo>,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub imagen: Option<String>,
    pub persona_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehiculoFilter {
    pub persona: Option<Uuid>,
    pub tipo: Option<TipoVehiculo>,
}

/// Canonical plate form: trimmed, upper-case, no inner spaces
pub fn normalize_placa(placa: &str) -> String {
    placa
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

const ORDERING: &[(&str, &str)] = &[
    ("marca", "marca"),
    ("modelo", "modelo"),
    ("placa", "placa"),
    ("fecha_registro", "fecha_registro"),
];

impl Vehiculo {
    /// Registers a vehicle; duplicate plates violate `vehiculos_placa_key`
    pub async fn create(pool: &PgPool, input: CreateVehiculo) -> Result<Vehiculo, sqlx::Error> {
        sqlx::query_as::<_, Vehiculo>(
            r#"
            INSERT INTO vehiculos (color, marca, modelo, placa, tipo, imagen, persona_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&input.color)
        .bind(&input.marca)
        .bind(&input.modelo)
        .bind(normalize_placa(&input.placa))
        .bind(input.tipo)
        .bind(&input.imagen)
        .bind(input.persona_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Vehiculo>, sqlx::Error> {
        sqlx::query_as::<_, Vehiculo>("SELECT * FROM vehiculos WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive plate lookup
    pub async fn find_by_placa(pool: &PgPool, placa: &str) -> Result<Option<Vehiculo>, sqlx::Error> {
        sqlx::query_as::<_, Vehiculo>("SELECT * FROM vehiculos WHERE UPPER(placa) = $1 LIMIT 1")
            .bind(normalize_placa(placa))
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &VehiculoFilter,
        params: &ListParams,
    ) -> Result<Vec<Vehiculo>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM vehiculos");
        query
            .eq("persona_id", filter.persona)
            .eq("tipo", filter.tipo)
            .search(params, &["placa", "marca", "modelo", "color"]);

        query
            .finish(params, ORDERING, "marca ASC, modelo ASC")
            .build_query_as::<Vehiculo>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateVehiculo) -> Result<Option<Vehiculo>, sqlx::Error> {
        sqlx::query_as::<_, Vehiculo>(
            r#"
            UPDATE vehiculos
            SET color = COALESCE($2, color),
                marca = COALESCE($3, marca),
                modelo = COALESCE($4, modelo),
                placa = COALESCE($5, placa),
                tipo = COALESCE($6, tipo),
                imagen = COALESCE($7, imagen),
                persona_id = COALESCE($8, persona_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.color)
        .bind(&input.marca)
        .bind(&input.modelo)
        .bind(input.placa.as_deref().map(normalize_placa))
        .bind(input.tipo)
        .bind(&input.imagen)
        .bind(input.persona_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vehiculos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_placa() {
        assert_eq!(normalize_placa(" 2345 abc "), "2345ABC");
        assert_eq!(normalize_placa("4521-XYZ"), "4521-XYZ");
    }

    #[test]
    fn test_tipo_serialization() {
        assert_eq!(serde_json::to_string(&TipoVehiculo::Suv).unwrap(), "\"suv\"");
        let tipo: TipoVehiculo = serde_json::from_str("\"motocicleta\"").unwrap();
        assert_eq!(tipo, TipoVehiculo::Motocicleta);
    }
}
