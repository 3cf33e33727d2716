/// Visita model
///
/// A visit links a visitante persona to the propietario or inquilino who
/// receives them. Finishing a visit stamps its exit time.

use crate::db::listing::{Filter, ListParams};
use crate::error::{DomainError, DomainResult};
use crate::models::persona::{Persona, PersonaTipo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "visita_estado", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EstadoVisita {
    #[default]
    Pendiente,
    Activa,
    Finalizada,
    Cancelada,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Visita {
    pub id: Uuid,
    pub estado: EstadoVisita,
    pub fecha_hora_entrada: DateTime<Utc>,
    pub fecha_hora_salida: Option<DateTime<Utc>>,
    pub visitante_id: Uuid,
    pub recibe_persona_id: Uuid,
    pub fecha_registro: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateVisita {
    #[serde(default)]
    pub estado: EstadoVisita,
    pub fecha_hora_entrada: DateTime<Utc>,
    pub fecha_hora_salida: Option<DateTime<Utc>>,
    pub visitante_id: Uuid,
    pub recibe_persona_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVisita {
    pub estado: Option<EstadoVisita>,
    pub fecha_hora_entrada: Option<DateTime<Utc>>,
    pub fecha_hora_salida: Option<DateTime<Utc>>,
    pub visitante_id: Option<Uuid>,
    pub recibe_persona_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitaFilter {
    pub estado: Option<EstadoVisita>,
    pub visitante: Option<Uuid>,
    pub recibe_persona: Option<Uuid>,
    pub desde: Option<DateTime<Utc>>,
    pub hasta: Option<DateTime<Utc>>,
}

async fn check_visitante(pool: &PgPool, id: Uuid) -> DomainResult<()> {
    let tipo = Persona::find_by_id(pool, id).await?.map(|p| p.tipo);
    match tipo {
        None => Err(DomainError::validation("visitante_id", "Debe seleccionar un visitante.")),
        Some(PersonaTipo::Visitante) => Ok(()),
        Some(_) => Err(DomainError::validation(
            "visitante_id",
            "La persona seleccionada no es un visitante.",
        )),
    }
}

async fn check_anfitrion(pool: &PgPool, id: Uuid) -> DomainResult<()> {
    let tipo = Persona::find_by_id(pool, id).await?.map(|p| p.tipo);
    match tipo {
        None => Err(DomainError::validation(
            "recibe_persona_id",
            "Debe seleccionar una persona que reciba la visita.",
        )),
        Some(tipo) if tipo.is_resident() => Ok(()),
        Some(_) => Err(DomainError::validation(
            "recibe_persona_id",
            "La persona seleccionada debe ser propietario o inquilino.",
        )),
    }
}

impl Visita {
    pub async fn create(pool: &PgPool, input: CreateVisita) -> DomainResult<Visita> {
        check_visitante(pool, input.visitante_id).await?;
        check_anfitrion(pool, input.recibe_persona_id).await?;

        let visita = sqlx::query_as::<_, Visita>(
            r#"
            INSERT INTO visitas (estado, fecha_hora_entrada, fecha_hora_salida, visitante_id, recibe_persona_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(input.estado)
        .bind(input.fecha_hora_entrada)
        .bind(input.fecha_hora_salida)
        .bind(input.visitante_id)
        .bind(input.recibe_persona_id)
        .fetch_one(pool)
        .await?;

        Ok(visita)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Visita>, sqlx::Error> {
        sqlx::query_as::<_, Visita>("SELECT * FROM visitas WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &VisitaFilter,
        params: &ListParams,
    ) -> Result<Vec<Visita>, sqlx::Error> {
        let mut query = Filter::new(
            "SELECT v.* FROM visitas v JOIN personas p ON p.id = v.visitante_id",
        );
        query
            .eq("v.estado", filter.estado)
            .eq("v.visitante_id", filter.visitante)
            .eq("v.recibe_persona_id", filter.recibe_persona)
            .gte("v.fecha_hora_entrada", filter.desde)
            .lte("v.fecha_hora_entrada", filter.hasta)
            .search(params, &["p.nombre", "p.apellido", "p.ci"]);

        query
            .finish(
                params,
                &[("fecha_hora_entrada", "v.fecha_hora_entrada"), ("estado", "v.estado")],
                "v.fecha_hora_entrada DESC",
            )
            .build_query_as::<Visita>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateVisita) -> DomainResult<Visita> {
        if let Some(visitante_id) = input.visitante_id {
            check_visitante(pool, visitante_id).await?;
        }
        if let Some(recibe_id) = input.recibe_persona_id {
            check_anfitrion(pool, recibe_id).await?;
        }

        sqlx::query_as::<_, Visita>(
            r#"
            UPDATE visitas
            SET estado = COALESCE($2, estado),
                fecha_hora_entrada = COALESCE($3, fecha_hora_entrada),
                fecha_hora_salida = COALESCE($4, fecha_hora_salida),
                visitante_id = COALESCE($5, visitante_id),
                recibe_persona_id = COALESCE($6, recibe_persona_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.estado)
        .bind(input.fecha_hora_entrada)
        .bind(input.fecha_hora_salida)
        .bind(input.visitante_id)
        .bind(input.recibe_persona_id)
        .fetch_optional(pool)
        .await?
        .ok_or(DomainError::NotFound("Visita"))
    }

    /// Marks the visit as finished, stamping the exit time
    pub async fn finalizar(
        pool: &PgPool,
        id: Uuid,
        salida: Option<DateTime<Utc>>,
    ) -> Result<Option<Visita>, sqlx::Error> {
        sqlx::query_as::<_, Visita>(
            r#"
            UPDATE visitas
            SET estado = 'FINALIZADA',
                fecha_hora_salida = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(salida.unwrap_or_else(Utc::now))
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM visitas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
