/// Lost-and-found
///
/// New pending objects are broadcast to every registered device by the
/// API layer (see `notifications::notify_objeto_perdido`).

use crate::db::listing::{Filter, ListParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub const LUGAR_POR_DEFECTO: &str = "Áreas Comunes";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "objeto_estado", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EstadoObjeto {
    /// Waiting to be claimed
    #[default]
    Pendiente,
    /// Returned to its owner
    Entregado,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ObjetoPerdido {
    pub id: Uuid,
    pub titulo: String,
    pub descripcion: Option<String>,
    pub foto: String,
    pub lugar_encontrado: String,
    pub fecha_encontrado: DateTime<Utc>,
    pub estado: EstadoObjeto,
    pub entregado_a: Option<Uuid>,
    pub fecha_entrega: Option<DateTime<Utc>>,
}

fn default_lugar() -> String {
    LUGAR_POR_DEFECTO.to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateObjetoPerdido {
    #[validate(length(min = 1, max = 100, message = "El título es obligatorio"))]
    pub titulo: String,
    pub descripcion: Option<String>,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub foto: String,
    #[serde(default = "default_lugar")]
    #[validate(length(min = 1, max = 100))]
    pub lugar_encontrado: String,
    pub fecha_encontrado: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estado: EstadoObjeto,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateObjetoPerdido {
    #[validate(length(min = 1, max = 100))]
    pub titulo: Option<String>,
    pub descripcion: Option<String>,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub foto: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub lugar_encontrado: Option<String>,
    pub fecha_encontrado: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjetoPerdidoFilter {
    pub estado: Option<EstadoObjeto>,
}

impl ObjetoPerdido {
    pub async fn create(pool: &PgPool, input: CreateObjetoPerdido) -> Result<ObjetoPerdido, sqlx::Error> {
        sqlx::query_as::<_, ObjetoPerdido>(
            r#"
            INSERT INTO objetos_perdidos (titulo, descripcion, foto, lugar_encontrado, fecha_encontrado, estado)
            VALUES ($1, $2, $3, $4, COALESCE($5, NOW()), $6)
            RETURNING *
            "#,
        )
        .bind(&input.titulo)
        .bind(&input.descripcion)
        .bind(&input.foto)
        .bind(&input.lugar_encontrado)
        .bind(input.fecha_encontrado)
        .bind(input.estado)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ObjetoPerdido>, sqlx::Error> {
        sqlx::query_as::<_, ObjetoPerdido>("SELECT * FROM objetos_perdidos WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ObjetoPerdidoFilter,
        params: &ListParams,
    ) -> Result<Vec<ObjetoPerdido>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM objetos_perdidos");
        query
            .eq("estado", filter.estado)
            .search(params, &["titulo", "descripcion", "lugar_encontrado"]);

        query
            .finish(
                params,
                &[("fecha_encontrado", "fecha_encontrado"), ("titulo", "titulo")],
                "fecha_encontrado DESC",
            )
            .build_query_as::<ObjetoPerdido>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: UpdateObjetoPerdido,
    ) -> Result<Option<ObjetoPerdido>, sqlx::Error> {
        sqlx::query_as::<_, ObjetoPerdido>(
            r#"
            UPDATE objetos_perdidos
            SET titulo = COALESCE($2, titulo),
                descripcion = COALESCE($3, descripcion),
                foto = COALESCE($4, foto),
                lugar_encontrado = COALESCE($5, lugar_encontrado),
                fecha_encontrado = COALESCE($6, fecha_encontrado)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.titulo)
        .bind(&input.descripcion)
        .bind(&input.foto)
        .bind(&input.lugar_encontrado)
        .bind(input.fecha_encontrado)
        .fetch_optional(pool)
        .await
    }

    /// Marks the object as returned to `persona_id`
    pub async fn entregar(
        pool: &PgPool,
        id: Uuid,
        persona_id: Option<Uuid>,
    ) -> Result<Option<ObjetoPerdido>, sqlx::Error> {
        sqlx::query_as::<_, ObjetoPerdido>(
            r#"
            UPDATE objetos_perdidos
            SET estado = 'entregado',
                entregado_a = $2,
                fecha_entrega = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(persona_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM objetos_perdidos WHERE id = $1")
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
    fn test_default_lugar() {
        let input: CreateObjetoPerdido = serde_json::from_value(json!({
            "titulo": "Llaves",
            "foto": "https://i.ibb.co/abc/llaves.jpg"
        }))
        .unwrap();

        assert_eq!(input.lugar_encontrado, "Áreas Comunes");
        assert_eq!(input.estado, EstadoObjeto::Pendiente);
        assert!(input.validate().is_ok());
    }
}
