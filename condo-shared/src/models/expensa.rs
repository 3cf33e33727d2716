/// Expensa and Multa models
///
/// An expensa is the monthly charge of a unidad. When no due date is given
/// it defaults to 30 days after emission. Read endpoints return
/// [`ExpensaDetalle`], which adds fields derived from today's date and the
/// unit's current propietario.

use crate::db::listing::{Filter, ListParams};
use crate::error::{DomainError, DomainResult};
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Days between emission and the default due date
pub const DIAS_VENCIMIENTO: i64 = 30;

pub const DESCRIPCION_POR_DEFECTO: &str = "Expensa de condominio";

pub const MONEDA_POR_DEFECTO: &str = "usd";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Expensa {
    pub id: Uuid,
    pub unidad_id: Uuid,
    pub monto: Decimal,
    pub fecha_emision: NaiveDate,
    pub fecha_vencimiento: NaiveDate,
    pub pagada: bool,
    pub stripe_session_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
    pub currency: String,
    pub descripcion: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnidadResumen {
    pub id: Uuid,
    pub numero: String,
    pub bloque: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Destinatario {
    pub id: Uuid,
    pub nombre_completo: String,
}

/// Expensa with derived read-only fields
#[derive(Debug, Clone, Serialize)]
pub struct ExpensaDetalle {
    #[serde(flatten)]
    pub expensa: Expensa,
    /// Days until the due date, negative once past
    pub dias_restantes: i64,
    pub vencida: bool,
    pub unidad_detalle: UnidadResumen,
    pub destinatario: Option<Destinatario>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ExpensaRow {
    #[sqlx(flatten)]
    expensa: Expensa,
    unidad_numero: String,
    bloque_nombre: String,
    destinatario_id: Option<Uuid>,
    destinatario_nombre: Option<String>,
}

impl ExpensaRow {
    fn into_detalle(self, today: NaiveDate) -> ExpensaDetalle {
        let destinatario = match (self.destinatario_id, self.destinatario_nombre) {
            (Some(id), Some(nombre_completo)) => Some(Destinatario { id, nombre_completo }),
            _ => None,
        };

        ExpensaDetalle {
            dias_restantes: self.expensa.dias_restantes(today),
            vencida: self.expensa.vencida(today),
            unidad_detalle: UnidadResumen {
                id: self.expensa.unidad_id,
                numero: self.unidad_numero,
                bloque: self.bloque_nombre,
            },
            destinatario,
            expensa: self.expensa,
        }
    }
}

const DETALLE_SELECT: &str = r#"
    SELECT e.*,
           u.numero AS unidad_numero,
           b.nombre AS bloque_nombre,
           d.propietario_id AS destinatario_id,
           d.nombre AS destinatario_nombre
    FROM expensas e
    JOIN unidades u ON u.id = e.unidad_id
    JOIN bloques b ON b.id = u.bloque_id
    LEFT JOIN LATERAL (
        SELECT c.propietario_id, p.nombre || ' ' || p.apellido AS nombre
        FROM contratos c
        JOIN personas p ON p.id = c.propietario_id
        WHERE c.unidad_id = e.unidad_id AND c.estado = 'activo'
        ORDER BY c.fecha_contrato DESC, c.fecha_registro DESC
        LIMIT 1
    ) d ON TRUE
"#;

fn default_currency() -> String {
    MONEDA_POR_DEFECTO.to_string()
}

fn default_descripcion() -> String {
    DESCRIPCION_POR_DEFECTO.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExpensa {
    pub unidad_id: Uuid,
    pub monto: Decimal,
    pub fecha_emision: Option<NaiveDate>,
    pub fecha_vencimiento: Option<NaiveDate>,
    #[serde(default)]
    pub pagada: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_descripcion")]
    pub descripcion: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExpensa {
    pub unidad_id: Option<Uuid>,
    pub monto: Option<Decimal>,
    pub fecha_emision: Option<NaiveDate>,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub pagada: Option<bool>,
    pub currency: Option<String>,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpensaFilter {
    pub unidad: Option<Uuid>,
    pub bloque: Option<Uuid>,
    pub pagada: Option<bool>,
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
}

/// Due date used when none is given
pub fn vencimiento_por_defecto(emision: NaiveDate) -> NaiveDate {
    emision + Duration::days(DIAS_VENCIMIENTO)
}

fn check_monto(monto: Decimal) -> DomainResult<()> {
    if monto.is_sign_negative() {
        return Err(DomainError::validation("monto", "El monto no puede ser negativo."));
    }
    Ok(())
}

fn check_fechas(emision: NaiveDate, vencimiento: NaiveDate) -> DomainResult<()> {
    if vencimiento < emision {
        return Err(DomainError::validation(
            "fecha_vencimiento",
            "La fecha de vencimiento no puede ser anterior a la fecha de emisión.",
        ));
    }
    Ok(())
}

impl Expensa {
    pub fn dias_restantes(&self, today: NaiveDate) -> i64 {
        (self.fecha_vencimiento - today).num_days()
    }

    pub fn vencida(&self, today: NaiveDate) -> bool {
        !self.pagada && self.fecha_vencimiento < today
    }

    pub async fn create(pool: &PgPool, input: CreateExpensa) -> DomainResult<Expensa> {
        check_monto(input.monto)?;

        let emision = input
            .fecha_emision
            .unwrap_or_else(|| Utc::now().date_naive());
        let vencimiento = input
            .fecha_vencimiento
            .unwrap_or_else(|| vencimiento_por_defecto(emision));
        check_fechas(emision, vencimiento)?;

        let expensa = sqlx::query_as::<_, Expensa>(
            r#"
            INSERT INTO expensas (unidad_id, monto, fecha_emision, fecha_vencimiento, pagada, currency, descripcion)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(input.unidad_id)
        .bind(input.monto)
        .bind(emision)
        .bind(vencimiento)
        .bind(input.pagada)
        .bind(input.currency.to_lowercase())
        .bind(&input.descripcion)
        .fetch_one(pool)
        .await?;

        Ok(expensa)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Expensa>, sqlx::Error> {
        sqlx::query_as::<_, Expensa>("SELECT * FROM expensas WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_detalle(
        pool: &PgPool,
        id: Uuid,
        today: NaiveDate,
    ) -> Result<Option<ExpensaDetalle>, sqlx::Error> {
        let sql = format!("{} WHERE e.id = $1", DETALLE_SELECT);
        let row = sqlx::query_as::<_, ExpensaRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(|row| row.into_detalle(today)))
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ExpensaFilter,
        params: &ListParams,
        today: NaiveDate,
    ) -> Result<Vec<ExpensaDetalle>, sqlx::Error> {
        let mut query = Filter::new(DETALLE_SELECT);
        query
            .eq("e.unidad_id", filter.unidad)
            .eq("u.bloque_id", filter.bloque)
            .eq("e.pagada", filter.pagada)
            .gte("e.fecha_emision", filter.desde)
            .lte("e.fecha_emision", filter.hasta)
            .search(params, &["e.descripcion", "u.codigo", "u.numero"]);

        let rows = query
            .finish(
                params,
                &[
                    ("fecha_emision", "e.fecha_emision"),
                    ("fecha_vencimiento", "e.fecha_vencimiento"),
                    ("monto", "e.monto"),
                ],
                "e.fecha_emision DESC",
            )
            .build_query_as::<ExpensaRow>()
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.into_detalle(today)).collect())
    }

    /// True when the unit already has an expensa emitted in `[desde, hasta)`
    pub async fn exists_between(
        pool: &PgPool,
        unidad_id: Uuid,
        desde: NaiveDate,
        hasta: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM expensas
                WHERE unidad_id = $1 AND fecha_emision >= $2 AND fecha_emision < $3
            )
            "#,
        )
        .bind(unidad_id)
        .bind(desde)
        .bind(hasta)
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateExpensa) -> DomainResult<Expensa> {
        if let Some(monto) = input.monto {
            check_monto(monto)?;
        }

        let mut tx = pool.begin().await?;

        let actual = sqlx::query_as::<_, Expensa>("SELECT * FROM expensas WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DomainError::NotFound("Expensa"))?;

        check_fechas(
            input.fecha_emision.unwrap_or(actual.fecha_emision),
            input.fecha_vencimiento.unwrap_or(actual.fecha_vencimiento),
        )?;

        let expensa = sqlx::query_as::<_, Expensa>(
            r#"
            UPDATE expensas
            SET unidad_id = COALESCE($2, unidad_id),
                monto = COALESCE($3, monto),
                fecha_emision = COALESCE($4, fecha_emision),
                fecha_vencimiento = COALESCE($5, fecha_vencimiento),
                pagada = COALESCE($6, pagada),
                currency = COALESCE($7, currency),
                descripcion = COALESCE($8, descripcion)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.unidad_id)
        .bind(input.monto)
        .bind(input.fecha_emision)
        .bind(input.fecha_vencimiento)
        .bind(input.pagada)
        .bind(input.currency.map(|c| c.to_lowercase()))
        .bind(&input.descripcion)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(expensa)
    }

    /// Records the payment intent created for this expensa
    pub async fn set_payment_intent(
        pool: &PgPool,
        id: Uuid,
        payment_intent_id: &str,
    ) -> Result<Option<Expensa>, sqlx::Error> {
        sqlx::query_as::<_, Expensa>(
            "UPDATE expensas SET stripe_payment_intent_id = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payment_intent_id)
        .fetch_optional(pool)
        .await
    }

    /// Marks the expensa as paid
    pub async fn mark_paid(pool: &PgPool, id: Uuid) -> Result<Option<Expensa>, sqlx::Error> {
        sqlx::query_as::<_, Expensa>("UPDATE expensas SET pagada = TRUE WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM expensas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "multa_tipo", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TipoMulta {
    #[default]
    Incidente,
    FaltaDePago,
    Otros,
}

/// Fine charged on top of an expensa
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Multa {
    pub id: Uuid,
    pub expensa_id: Uuid,
    pub monto: Decimal,
    pub fecha_multa: NaiveDate,
    pub tipo: TipoMulta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMulta {
    pub expensa_id: Uuid,
    pub monto: Decimal,
    pub fecha_multa: Option<NaiveDate>,
    #[serde(default)]
    pub tipo: TipoMulta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMulta {
    pub expensa_id: Option<Uuid>,
    pub monto: Option<Decimal>,
    pub fecha_multa: Option<NaiveDate>,
    pub tipo: Option<TipoMulta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultaFilter {
    pub expensa: Option<Uuid>,
    pub tipo: Option<TipoMulta>,
}

impl Multa {
    pub async fn create(pool: &PgPool, input: CreateMulta) -> DomainResult<Multa> {
        check_monto(input.monto)?;

        let multa = sqlx::query_as::<_, Multa>(
            r#"
            INSERT INTO multas (expensa_id, monto, fecha_multa, tipo)
            VALUES ($1, $2, COALESCE($3, CURRENT_DATE), $4)
            RETURNING *
            "#,
        )
        .bind(input.expensa_id)
        .bind(input.monto)
        .bind(input.fecha_multa)
        .bind(input.tipo)
        .fetch_one(pool)
        .await?;

        Ok(multa)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Multa>, sqlx::Error> {
        sqlx::query_as::<_, Multa>("SELECT * FROM multas WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &MultaFilter,
        params: &ListParams,
    ) -> Result<Vec<Multa>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM multas");
        query.eq("expensa_id", filter.expensa).eq("tipo", filter.tipo);

        query
            .finish(
                params,
                &[("fecha_multa", "fecha_multa"), ("monto", "monto")],
                "fecha_multa DESC",
            )
            .build_query_as::<Multa>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateMulta) -> DomainResult<Multa> {
        if let Some(monto) = input.monto {
            check_monto(monto)?;
        }

        sqlx::query_as::<_, Multa>(
            r#"
            UPDATE multas
            SET expensa_id = COALESCE($2, expensa_id),
                monto = COALESCE($3, monto),
                fecha_multa = COALESCE($4, fecha_multa),
                tipo = COALESCE($5, tipo)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.expensa_id)
        .bind(input.monto)
        .bind(input.fecha_multa)
        .bind(input.tipo)
        .fetch_optional(pool)
        .await?
        .ok_or(DomainError::NotFound("Multa"))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM multas WHERE id = $1")
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

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expensa(vencimiento: NaiveDate, pagada: bool) -> Expensa {
        Expensa {
            id: Uuid::new_v4(),
            unidad_id: Uuid::new_v4(),
            monto: Decimal::new(25050, 2),
            fecha_emision: date(2025, 3, 1),
            fecha_vencimiento: vencimiento,
            pagada,
            stripe_session_id: None,
            stripe_payment_intent_id: None,
            currency: "usd".to_string(),
            descripcion: DESCRIPCION_POR_DEFECTO.to_string(),
        }
    }

    #[test]
    fn test_default_due_date() {
        assert_eq!(vencimiento_por_defecto(date(2025, 3, 1)), date(2025, 3, 31));
        assert_eq!(vencimiento_por_defecto(date(2025, 12, 15)), date(2026, 1, 14));
    }

    #[test]
    fn test_derived_fields() {
        let today = date(2025, 3, 20);

        let pendiente = expensa(date(2025, 3, 31), false);
        assert_eq!(pendiente.dias_restantes(today), 11);
        assert!(!pendiente.vencida(today));

        let atrasada = expensa(date(2025, 3, 10), false);
        assert_eq!(atrasada.dias_restantes(today), -10);
        assert!(atrasada.vencida(today));

        let pagada = expensa(date(2025, 3, 10), true);
        assert!(!pagada.vencida(today));
    }

    #[test]
    fn test_detalle_serializes_flat() {
        let row = ExpensaRow {
            expensa: expensa(date(2025, 3, 31), false),
            unidad_numero: "101".to_string(),
            bloque_nombre: "Torre A".to_string(),
            destinatario_id: Some(Uuid::new_v4()),
            destinatario_nombre: Some("Ana Rojas".to_string()),
        };

        let value = serde_json::to_value(row.into_detalle(date(2025, 3, 30))).unwrap();
        assert_eq!(value["dias_restantes"], 1);
        assert_eq!(value["vencida"], false);
        assert_eq!(value["currency"], "usd");
        assert_eq!(value["unidad_detalle"]["bloque"], "Torre A");
        assert_eq!(value["destinatario"]["nombre_completo"], "Ana Rojas");
    }

    #[test]
    fn test_create_defaults_and_checks() {
        let input: CreateExpensa = serde_json::from_value(json!({
            "unidad_id": "0b5d9a3e-2d5f-4a43-9b53-5a9d55d2f0a7",
            "monto": 120
        }))
        .unwrap();
        assert_eq!(input.currency, "usd");
        assert_eq!(input.descripcion, "Expensa de condominio");
        assert!(!input.pagada);

        assert!(check_monto(Decimal::new(-5, 0)).is_err());
        assert!(check_fechas(date(2025, 3, 1), date(2025, 2, 1)).is_err());
        assert!(check_fechas(date(2025, 3, 1), date(2025, 3, 1)).is_ok());
    }
}
