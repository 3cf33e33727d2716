/// Contrato model and unit occupancy
///
/// A contract binds a propietario to a unidad. Every contract write also
/// re-derives the unit's occupancy inside the same transaction:
///
/// ```text
/// active contract exists        → unidad.estado = ocupada
/// no active contract + ocupada  → unidad.estado = disponible
/// otherwise                     → unchanged (mantenimiento, reservada, ...)
/// ```
///
/// The worker's reconciliation sweep applies the same rule to rows written
/// outside the API.

use crate::db::listing::{Filter, ListParams};
use crate::error::{DomainError, DomainResult};
use crate::models::persona::{Persona, PersonaTipo};
use crate::models::unidad::{EstadoUnidad, Unidad};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contrato_estado", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EstadoContrato {
    Activo,
    Inactivo,
    #[default]
    Pendiente,
    Finalizado,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contrato {
    pub id: Uuid,
    pub propietario_id: Uuid,
    pub unidad_id: Uuid,
    pub fecha_contrato: NaiveDate,
    pub cuota_mensual: Option<Decimal>,
    pub estado: EstadoContrato,
    pub costo_compra: Option<Decimal>,
    pub fecha_registro: DateTime<Utc>,
    pub contrato_pdf: Option<String>,
}

/// Contract joined with the names printed on its document
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ContratoDocumento {
    pub id: Uuid,
    pub fecha_contrato: NaiveDate,
    pub cuota_mensual: Option<Decimal>,
    pub costo_compra: Option<Decimal>,
    pub estado: EstadoContrato,
    pub propietario_nombre: String,
    pub propietario_ci: String,
    pub unidad_codigo: String,
    pub unidad_numero: String,
    pub bloque_nombre: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContrato {
    pub propietario_id: Uuid,
    pub unidad_id: Uuid,
    pub fecha_contrato: NaiveDate,
    pub cuota_mensual: Option<Decimal>,
    #[serde(default)]
    pub estado: EstadoContrato,
    pub costo_compra: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContrato {
    pub propietario_id: Option<Uuid>,
    pub unidad_id: Option<Uuid>,
    pub fecha_contrato: Option<NaiveDate>,
    pub cuota_mensual: Option<Decimal>,
    pub estado: Option<EstadoContrato>,
    pub costo_compra: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContratoFilter {
    pub estado: Option<EstadoContrato>,
    pub unidad: Option<Uuid>,
    pub propietario: Option<Uuid>,
}

fn check_montos(cuota: Option<Decimal>, costo: Option<Decimal>) -> DomainResult<()> {
    if cuota.is_some_and(|c| c.is_sign_negative()) {
        return Err(DomainError::validation(
            "cuota_mensual",
            "La cuota mensual no puede ser negativa.",
        ));
    }
    if costo.is_some_and(|c| c.is_sign_negative()) {
        return Err(DomainError::validation(
            "costo_compra",
            "El costo de compra no puede ser negativo.",
        ));
    }
    Ok(())
}

async fn check_propietario(conn: &mut PgConnection, id: Uuid) -> DomainResult<()> {
    let tipo: Option<PersonaTipo> = sqlx::query_scalar("SELECT tipo FROM personas WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match tipo {
        None => Err(DomainError::NotFound("Persona")),
        Some(PersonaTipo::Propietario) => Ok(()),
        Some(_) => Err(DomainError::validation(
            "propietario_id",
            "La persona seleccionada no es un propietario.",
        )),
    }
}

async fn check_unidad(conn: &mut PgConnection, id: Uuid) -> DomainResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM unidades WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    if exists {
        Ok(())
    } else {
        Err(DomainError::NotFound("Unidad"))
    }
}

/// Re-derives a unit's occupancy from its contracts
///
/// Returns the new state when it changed.
pub async fn sync_ocupacion(
    conn: &mut PgConnection,
    unidad_id: Uuid,
) -> Result<Option<EstadoUnidad>, sqlx::Error> {
    let row: Option<(EstadoUnidad, bool)> = sqlx::query_as(
        r#"
        SELECT u.estado,
               EXISTS(SELECT 1 FROM contratos c WHERE c.unidad_id = u.id AND c.estado = 'activo')
        FROM unidades u
        WHERE u.id = $1
        FOR UPDATE OF u
        "#,
    )
    .bind(unidad_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((actual, con_contrato)) = row else {
        return Ok(None);
    };

    let objetivo = match (actual, con_contrato) {
        (EstadoUnidad::Ocupada, true) => return Ok(None),
        (_, true) => EstadoUnidad::Ocupada,
        (EstadoUnidad::Ocupada, false) => EstadoUnidad::Disponible,
        (_, false) => return Ok(None),
    };

    Unidad::set_estado(conn, unidad_id, objetivo).await?;
    tracing::debug!(unidad_id = %unidad_id, estado = objetivo.as_str(), "Unit occupancy updated");
    Ok(Some(objetivo))
}

impl Contrato {
    pub async fn create(pool: &PgPool, input: CreateContrato) -> DomainResult<Contrato> {
        check_montos(input.cuota_mensual, input.costo_compra)?;

        let mut tx = pool.begin().await?;
        check_propietario(&mut tx, input.propietario_id).await?;
        check_unidad(&mut tx, input.unidad_id).await?;

        let contrato = sqlx::query_as::<_, Contrato>(
            r#"
            INSERT INTO contratos (propietario_id, unidad_id, fecha_contrato, cuota_mensual, estado, costo_compra)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.propietario_id)
        .bind(input.unidad_id)
        .bind(input.fecha_contrato)
        .bind(input.cuota_mensual)
        .bind(input.estado)
        .bind(input.costo_compra)
        .fetch_one(&mut *tx)
        .await?;

        sync_ocupacion(&mut tx, contrato.unidad_id).await?;
        tx.commit().await?;

        Ok(contrato)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Contrato>, sqlx::Error> {
        sqlx::query_as::<_, Contrato>("SELECT * FROM contratos WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_documento(pool: &PgPool, id: Uuid) -> Result<Option<ContratoDocumento>, sqlx::Error> {
        sqlx::query_as::<_, ContratoDocumento>(
            r#"
            SELECT c.id, c.fecha_contrato, c.cuota_mensual, c.costo_compra, c.estado,
                   p.nombre || ' ' || p.apellido AS propietario_nombre,
                   p.ci AS propietario_ci,
                   u.codigo AS unidad_codigo,
                   u.numero AS unidad_numero,
                   b.nombre AS bloque_nombre
            FROM contratos c
            JOIN personas p ON p.id = c.propietario_id
            JOIN unidades u ON u.id = c.unidad_id
            JOIN bloques b ON b.id = u.bloque_id
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ContratoFilter,
        params: &ListParams,
    ) -> Result<Vec<Contrato>, sqlx::Error> {
        let mut query = Filter::new(
            r#"
            SELECT c.* FROM contratos c
            JOIN personas p ON p.id = c.propietario_id
            JOIN unidades u ON u.id = c.unidad_id
            "#,
        );
        query
            .eq("c.estado", filter.estado)
            .eq("c.unidad_id", filter.unidad)
            .eq("c.propietario_id", filter.propietario)
            .search(params, &["p.nombre", "p.apellido", "p.ci", "u.codigo"]);

        query
            .finish(
                params,
                &[
                    ("fecha_contrato", "c.fecha_contrato"),
                    ("fecha_registro", "c.fecha_registro"),
                    ("cuota_mensual", "c.cuota_mensual"),
                ],
                "c.fecha_contrato DESC",
            )
            .build_query_as::<Contrato>()
            .fetch_all(pool)
            .await
    }

    /// Active contracts with a monthly quota, oldest first
    pub async fn list_activos_con_cuota(pool: &PgPool) -> Result<Vec<Contrato>, sqlx::Error> {
        sqlx::query_as::<_, Contrato>(
            r#"
            SELECT * FROM contratos
            WHERE estado = 'activo' AND cuota_mensual IS NOT NULL AND cuota_mensual > 0
            ORDER BY fecha_contrato ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateContrato) -> DomainResult<Contrato> {
        check_montos(input.cuota_mensual, input.costo_compra)?;

        let mut tx = pool.begin().await?;

        let anterior = sqlx::query_as::<_, Contrato>("SELECT * FROM contratos WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DomainError::NotFound("Contrato"))?;

        if let Some(propietario_id) = input.propietario_id {
            check_propietario(&mut tx, propietario_id).await?;
        }
        if let Some(unidad_id) = input.unidad_id {
            check_unidad(&mut tx, unidad_id).await?;
        }

        let contrato = sqlx::query_as::<_, Contrato>(
            r#"
            UPDATE contratos
            SET propietario_id = COALESCE($2, propietario_id),
                unidad_id = COALESCE($3, unidad_id),
                fecha_contrato = COALESCE($4, fecha_contrato),
                cuota_mensual = COALESCE($5, cuota_mensual),
                estado = COALESCE($6, estado),
                costo_compra = COALESCE($7, costo_compra)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.propietario_id)
        .bind(input.unidad_id)
        .bind(input.fecha_contrato)
        .bind(input.cuota_mensual)
        .bind(input.estado)
        .bind(input.costo_compra)
        .fetch_one(&mut *tx)
        .await?;

        sync_ocupacion(&mut tx, contrato.unidad_id).await?;
        if anterior.unidad_id != contrato.unidad_id {
            sync_ocupacion(&mut tx, anterior.unidad_id).await?;
        }
        tx.commit().await?;

        Ok(contrato)
    }

    /// Stores the URL of the rendered contract document
    pub async fn set_pdf(pool: &PgPool, id: Uuid, url: &str) -> Result<Option<Contrato>, sqlx::Error> {
        sqlx::query_as::<_, Contrato>(
            "UPDATE contratos SET contrato_pdf = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(url)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let unidad_id: Option<Uuid> =
            sqlx::query_scalar("DELETE FROM contratos WHERE id = $1 RETURNING unidad_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(unidad_id) = unidad_id else {
            return Ok(false);
        };

        sync_ocupacion(&mut tx, unidad_id).await?;
        tx.commit().await?;
        Ok(true)
    }
}

/// Persona named on the latest active contract of a unit
pub async fn propietario_actual(pool: &PgPool, unidad_id: Uuid) -> Result<Option<Persona>, sqlx::Error> {
    sqlx::query_as::<_, Persona>(
        r#"
        SELECT p.* FROM contratos c
        JOIN personas p ON p.id = c.propietario_id
        WHERE c.unidad_id = $1 AND c.estado = 'activo'
        ORDER BY c.fecha_contrato DESC, c.fecha_registro DESC
        LIMIT 1
        "#,
    )
    .bind(unidad_id)
    .fetch_optional(pool)
    .await
}
