/// Monthly expensa issuance
///
/// Every active contract with a monthly quota gets one expensa per calendar
/// month, emitted on the first day and due 30 days later. The unit's
/// propietario is notified once the expensa exists.

use chrono::{Datelike, NaiveDate};
use condo_shared::models::contrato::Contrato;
use condo_shared::models::expensa::{vencimiento_por_defecto, CreateExpensa, Expensa, MONEDA_POR_DEFECTO};
use condo_shared::notifications::{mes_nombre, notify_expensa};
use condo_shared::vendors::PushNotifier;
use serde::Serialize;
use sqlx::PgPool;

/// Outcome of one issuance run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssueReport {
    pub creadas: usize,
    /// Units already billed for the month
    pub omitidas: usize,
    pub fallidas: usize,
}

/// First day of `date`'s month and first day of the following month
pub fn month_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let desde = date.with_day(1)?;
    let hasta = if desde.month() == 12 {
        NaiveDate::from_ymd_opt(desde.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(desde.year(), desde.month() + 1, 1)?
    };
    Some((desde, hasta))
}

pub fn descripcion_mensual(emision: NaiveDate) -> String {
    format!("Expensa mensual - {} {}", mes_nombre(emision.month()), emision.year())
}

/// Issues the expensas of `month` (any day of it)
pub async fn issue_monthly_expensas(
    pool: &PgPool,
    push: &dyn PushNotifier,
    month: NaiveDate,
) -> anyhow::Result<IssueReport> {
    let (desde, hasta) =
        month_bounds(month).ok_or_else(|| anyhow::anyhow!("Invalid month: {}", month))?;

    let contratos = Contrato::list_activos_con_cuota(pool).await?;
    tracing::debug!(contratos = contratos.len(), mes = %desde, "Issuing monthly expensas");

    let mut report = IssueReport::default();

    for contrato in contratos {
        let Some(cuota) = contrato.cuota_mensual else {
            continue;
        };

        if Expensa::exists_between(pool, contrato.unidad_id, desde, hasta).await? {
            report.omitidas += 1;
            continue;
        }

        let input = CreateExpensa {
            unidad_id: contrato.unidad_id,
            monto: cuota,
            fecha_emision: Some(desde),
            fecha_vencimiento: Some(vencimiento_por_defecto(desde)),
            pagada: false,
            currency: MONEDA_POR_DEFECTO.to_string(),
            descripcion: descripcion_mensual(desde),
        };

        match Expensa::create(pool, input).await {
            Ok(expensa) => {
                tracing::info!(
                    expensa_id = %expensa.id,
                    unidad_id = %expensa.unidad_id,
                    monto = %expensa.monto,
                    "Monthly expensa issued"
                );
                notify_expensa(pool, push, &expensa).await;
                report.creadas += 1;
            }
            Err(e) => {
                tracing::warn!(contrato_id = %contrato.id, error = %e, "Failed to issue expensa");
                report.fallidas += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(date(2025, 3, 17)), Some((date(2025, 3, 1), date(2025, 4, 1))));
        assert_eq!(month_bounds(date(2025, 12, 31)), Some((date(2025, 12, 1), date(2026, 1, 1))));
        assert_eq!(month_bounds(date(2024, 2, 29)), Some((date(2024, 2, 1), date(2024, 3, 1))));
    }

    #[test]
    fn test_descripcion_mensual() {
        assert_eq!(descripcion_mensual(date(2025, 3, 1)), "Expensa mensual - Marzo 2025");
        assert_eq!(descripcion_mensual(date(2026, 1, 1)), "Expensa mensual - Enero 2026");
    }

    #[test]
    fn test_due_date_is_thirty_days_after_emission() {
        assert_eq!(vencimiento_por_defecto(date(2025, 2, 1)), date(2025, 3, 3));
    }
}
