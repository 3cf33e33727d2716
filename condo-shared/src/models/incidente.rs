use crate::db::listing::{Filter, ListParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Incident report, optionally tied to a propietario and the multa it produced
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Incidente {
    pub id: Uuid,
    pub propietario_id: Option<Uuid>,
    pub multa_id: Option<Uuid>,
    pub descripcion: String,
    pub fecha_incidente: DateTime<Utc>,
    pub fecha_registro: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIncidente {
    pub propietario_id: Option<Uuid>,
    pub multa_id: Option<Uuid>,
    #[validate(length(min = 1, message = "La descripción es obligatoria"))]
    pub descripcion: String,
    pub fecha_incidente: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateIncidente {
    pub propietario_id: Option<Uuid>,
    pub multa_id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub descripcion: Option<String>,
    pub fecha_incidente: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidenteFilter {
    pub propietario: Option<Uuid>,
}

impl Incidente {
    pub async fn create(pool: &PgPool, input: CreateIncidente) -> Result<Incidente, sqlx::Error> {
        sqlx::query_as::<_, Incidente>(
            r#"
            INSERT INTO incidentes (propietario_id, multa_id, descripcion, fecha_incidente)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.propietario_id)
        .bind(input.multa_id)
        .bind(&input.descripcion)
        .bind(input.fecha_incidente)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Incidente>, sqlx::Error> {
        sqlx::query_as::<_, Incidente>("SELECT * FROM incidentes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &IncidenteFilter,
        params: &ListParams,
    ) -> Result<Vec<Incidente>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM incidentes");
        query
            .eq("propietario_id", filter.propietario)
            .search(params, &["descripcion"]);

        query
            .finish(
                params,
                &[("fecha_incidente", "fecha_incidente"), ("fecha_registro", "fecha_registro")],
                "fecha_incidente DESC",
            )
            .build_query_as::<Incidente>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateIncidente) -> Result<Option<Incidente>, sqlx::Error> {
        sqlx::query_as::<_, Incidente>(
            r#"
            UPDATE incidentes
            SET propietario_id = COALESCE($2, propietario_id),
                multa_id = COALESCE($3, multa_id),
                descripcion = COALESCE($4, descripcion),
                fecha_incidente = COALESCE($5, fecha_incidente)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.propietario_id)
        .bind(input.multa_id)
        .bind(&input.descripcion)
        .bind(input.fecha_incidente)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM incidentes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
