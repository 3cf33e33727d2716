/// Financial dashboard aggregations
///
/// Each query returns a chart-ready JSON document (`titulo`, `tipo`,
/// `labels`, `datasets`) plus summary statistics. Amounts are summed as
/// `Decimal` in SQL and only converted to floats, rounded to cents, when the
/// document is built.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use uuid::Uuid;

pub const MESES_CORTOS: [&str; 12] = [
    "Ene", "Feb", "Mar", "Abr", "May", "Jun", "Jul", "Ago", "Sep", "Oct", "Nov", "Dic",
];

/// Number of years in the annual comparison
pub const ANIOS_COMPARATIVO: i32 = 4;

const COLORES_COMPARATIVO: [&str; 4] = ["#EF4444", "#F59E0B", "#10B981", "#3B82F6"];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn money(value: Decimal) -> f64 {
    value.round_dp(2).to_f64().unwrap_or(0.0)
}

fn percent(part: i64, total: i64) -> f64 {
    if total > 0 {
        round2(part as f64 / total as f64 * 100.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct Totales {
    pub total_expensas: i64,
    pub expensas_pagadas: i64,
    pub monto_pagado: Decimal,
    pub monto_pendiente: Decimal,
    pub contratos_activos: i64,
    pub unidades_ocupadas: i64,
    pub unidades_disponibles: i64,
}

impl Totales {
    pub fn expensas_pendientes(&self) -> i64 {
        self.total_expensas - self.expensas_pagadas
    }
}

pub async fn totales(pool: &PgPool) -> Result<Totales, sqlx::Error> {
    sqlx::query_as::<_, Totales>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM expensas) AS total_expensas,
            (SELECT COUNT(*) FROM expensas WHERE pagada) AS expensas_pagadas,
            (SELECT COALESCE(SUM(monto), 0) FROM expensas WHERE pagada) AS monto_pagado,
            (SELECT COALESCE(SUM(monto), 0) FROM expensas WHERE NOT pagada) AS monto_pendiente,
            (SELECT COUNT(*) FROM contratos WHERE estado = 'activo') AS contratos_activos,
            (SELECT COUNT(*) FROM unidades WHERE estado = 'ocupada') AS unidades_ocupadas,
            (SELECT COUNT(*) FROM unidades WHERE estado = 'disponible') AS unidades_disponibles
        "#,
    )
    .fetch_one(pool)
    .await
}

pub fn resumen_document(t: &Totales) -> JsonValue {
    json!({
        "resumen": {
            "total_expensas": t.total_expensas,
            "expensas_pagadas": t.expensas_pagadas,
            "expensas_pendientes": t.expensas_pendientes(),
            "porcentaje_pagado": percent(t.expensas_pagadas, t.total_expensas),
            "monto_total_recaudado": money(t.monto_pagado),
            "monto_pendiente": money(t.monto_pendiente),
            "contratos_activos": t.contratos_activos,
            "unidades_ocupadas": t.unidades_ocupadas,
            "unidades_disponibles": t.unidades_disponibles,
        }
    })
}

pub fn estado_document(t: &Totales) -> JsonValue {
    let pendientes = t.expensas_pendientes();
    json!({
        "titulo": "Estado de Expensas",
        "tipo": "donut",
        "labels": ["Pagadas", "Pendientes"],
        "datasets": [{
            "label": "Cantidad",
            "data": [t.expensas_pagadas, pendientes],
            "backgroundColor": ["#10B981", "#EF4444"],
            "borderColor": ["#059669", "#DC2626"],
        }],
        "montos": {
            "pagado": money(t.monto_pagado),
            "pendiente": money(t.monto_pendiente),
            "total": money(t.monto_pagado + t.monto_pendiente),
        },
        "porcentajes": {
            "pagado": percent(t.expensas_pagadas, t.total_expensas),
            "pendiente": percent(pendientes, t.total_expensas),
        }
    })
}

/// Paid income of one month
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngresoMes {
    /// 1..=12
    pub mes: i32,
    pub total: Decimal,
    pub cantidad: i64,
}

/// Paid expensas of `anio` grouped by month of emission
pub async fn ingresos_por_mes(pool: &PgPool, anio: i32) -> Result<Vec<IngresoMes>, sqlx::Error> {
    let desde = NaiveDate::from_ymd_opt(anio, 1, 1);
    let hasta = NaiveDate::from_ymd_opt(anio + 1, 1, 1);

    sqlx::query_as::<_, IngresoMes>(
        r#"
        SELECT EXTRACT(MONTH FROM fecha_emision)::INT4 AS mes,
               SUM(monto) AS total,
               COUNT(*) AS cantidad
        FROM expensas
        WHERE pagada AND fecha_emision >= $1 AND fecha_emision < $2
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(desde)
    .bind(hasta)
    .fetch_all(pool)
    .await
}

/// Twelve buckets of amounts and counts
fn buckets(rows: &[IngresoMes]) -> ([f64; 12], [i64; 12]) {
    let mut montos = [0.0; 12];
    let mut cantidades = [0; 12];
    for row in rows {
        if let Ok(index) = usize::try_from(row.mes - 1) {
            if index < 12 {
                montos[index] = money(row.total);
                cantidades[index] = row.cantidad;
            }
        }
    }
    (montos, cantidades)
}

pub fn ingresos_document(anio: i32, rows: &[IngresoMes]) -> JsonValue {
    let (montos, cantidades) = buckets(rows);

    let total: f64 = montos.iter().sum();
    let promedio = if total > 0.0 { total / 12.0 } else { 0.0 };

    let (mayor_index, mayor) = montos
        .iter()
        .enumerate()
        .fold((0, 0.0_f64), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
    let mes_mayor = if mayor > 0.0 { MESES_CORTOS[mayor_index] } else { "N/A" };

    json!({
        "titulo": format!("Ingresos Mensuales {}", anio),
        "tipo": "bar",
        "labels": MESES_CORTOS,
        "datasets": [{
            "label": format!("Ingresos {}", anio),
            "data": montos,
            "backgroundColor": "#3B82F6",
            "borderColor": "#2563EB",
            "borderWidth": 1,
        }],
        "estadisticas": {
            "total_año": round2(total),
            "promedio_mensual": round2(promedio),
            "mes_mayor_ingreso": mes_mayor,
            "monto_mayor": round2(mayor),
        },
        "cantidades_por_mes": cantidades,
    })
}

/// Pending debt of one active contract
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Moroso {
    pub propietario_id: Uuid,
    pub nombre: String,
    pub unidad: String,
    #[serde(serialize_with = "serialize_money")]
    pub monto_pendiente: Decimal,
    pub cantidad_pendiente: i64,
}

fn serialize_money<S: serde::Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(money(*value))
}

/// Every active contract with unpaid expensas, largest debt first
pub async fn morosos(pool: &PgPool) -> Result<Vec<Moroso>, sqlx::Error> {
    sqlx::query_as::<_, Moroso>(
        r#"
        SELECT c.propietario_id,
               p.nombre || ' ' || p.apellido AS nombre,
               u.codigo AS unidad,
               SUM(e.monto) AS monto_pendiente,
               COUNT(e.id) AS cantidad_pendiente
        FROM contratos c
        JOIN personas p ON p.id = c.propietario_id
        JOIN unidades u ON u.id = c.unidad_id
        JOIN expensas e ON e.unidad_id = c.unidad_id AND NOT e.pagada
        WHERE c.estado = 'activo'
        GROUP BY c.id, c.propietario_id, p.nombre, p.apellido, u.codigo
        ORDER BY monto_pendiente DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub fn morosos_document(mut todos: Vec<Moroso>, limite: usize) -> JsonValue {
    todos.sort_by(|a, b| b.monto_pendiente.cmp(&a.monto_pendiente));

    let deuda_total: Decimal = todos.iter().map(|m| m.monto_pendiente).sum();
    let total_morosos = todos.len();
    let promedio = if total_morosos > 0 {
        deuda_total / Decimal::from(total_morosos as u64)
    } else {
        Decimal::ZERO
    };

    let top: Vec<&Moroso> = todos.iter().take(limite).collect();

    json!({
        "titulo": format!("Top {} Propietarios con Deudas Pendientes", top.len()),
        "tipo": "horizontalBar",
        "labels": top.iter().map(|m| m.nombre.as_str()).collect::<Vec<_>>(),
        "datasets": [{
            "label": "Monto Pendiente (Bs.)",
            "data": top.iter().map(|m| money(m.monto_pendiente)).collect::<Vec<_>>(),
            "backgroundColor": "#F59E0B",
            "borderColor": "#D97706",
            "borderWidth": 1,
        }],
        "detalles": top,
        "estadisticas": {
            "total_morosos": total_morosos,
            "deuda_total": money(deuda_total),
            "promedio_deuda": money(promedio),
        }
    })
}

/// Monthly income for the last four years ending at `today`'s year
pub async fn comparativo_anual(pool: &PgPool, today: NaiveDate) -> Result<JsonValue, sqlx::Error> {
    let actual = today.year();
    let mut por_anio = Vec::with_capacity(ANIOS_COMPARATIVO as usize);
    for anio in (actual - ANIOS_COMPARATIVO + 1)..=actual {
        por_anio.push((anio, ingresos_por_mes(pool, anio).await?));
    }
    Ok(comparativo_document(&por_anio))
}

pub fn comparativo_document(por_anio: &[(i32, Vec<IngresoMes>)]) -> JsonValue {
    let datasets: Vec<JsonValue> = por_anio
        .iter()
        .enumerate()
        .map(|(i, (anio, rows))| {
            let color = COLORES_COMPARATIVO[i % COLORES_COMPARATIVO.len()];
            json!({
                "label": anio.to_string(),
                "data": buckets(rows).0,
                "borderColor": color,
                "backgroundColor": format!("{}33", color),
                "fill": false,
                "tension": 0.4,
            })
        })
        .collect();

    json!({
        "titulo": "Comparación de Ingresos por Año",
        "tipo": "line",
        "labels": MESES_CORTOS,
        "datasets": datasets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingreso(mes: i32, total: i64, cantidad: i64) -> IngresoMes {
        IngresoMes {
            mes,
            total: Decimal::new(total, 2),
            cantidad,
        }
    }

    #[test]
    fn test_resumen_percentages() {
        let totales = Totales {
            total_expensas: 3,
            expensas_pagadas: 1,
            monto_pagado: Decimal::new(10000, 2),
            monto_pendiente: Decimal::new(20000, 2),
            ..Default::default()
        };

        let doc = resumen_document(&totales);
        assert_eq!(doc["resumen"]["expensas_pendientes"], 2);
        assert_eq!(doc["resumen"]["porcentaje_pagado"], 33.33);
        assert_eq!(doc["resumen"]["monto_total_recaudado"], 100.0);

        let doc = estado_document(&totales);
        assert_eq!(doc["montos"]["total"], 300.0);
        assert_eq!(doc["porcentajes"]["pendiente"], 66.67);
    }

    #[test]
    fn test_empty_totals_do_not_divide_by_zero() {
        let doc = resumen_document(&Totales::default());
        assert_eq!(doc["resumen"]["porcentaje_pagado"], 0.0);
    }

    #[test]
    fn test_ingresos_buckets_and_stats() {
        let rows = vec![ingreso(1, 30000, 2), ingreso(3, 90000, 3)];
        let doc = ingresos_document(2025, &rows);

        assert_eq!(doc["titulo"], "Ingresos Mensuales 2025");
        assert_eq!(doc["datasets"][0]["data"][0], 300.0);
        assert_eq!(doc["datasets"][0]["data"][1], 0.0);
        assert_eq!(doc["datasets"][0]["data"][2], 900.0);
        assert_eq!(doc["cantidades_por_mes"][2], 3);
        assert_eq!(doc["estadisticas"]["total_año"], 1200.0);
        assert_eq!(doc["estadisticas"]["promedio_mensual"], 100.0);
        assert_eq!(doc["estadisticas"]["mes_mayor_ingreso"], "Mar");
    }

    #[test]
    fn test_ingresos_without_income() {
        let doc = ingresos_document(2024, &[]);
        assert_eq!(doc["estadisticas"]["mes_mayor_ingreso"], "N/A");
        assert_eq!(doc["estadisticas"]["monto_mayor"], 0.0);
    }

    #[test]
    fn test_morosos_ranking_and_limit() {
        let moroso = |nombre: &str, monto: i64| Moroso {
            propietario_id: Uuid::new_v4(),
            nombre: nombre.to_string(),
            unidad: "A-1".to_string(),
            monto_pendiente: Decimal::new(monto, 2),
            cantidad_pendiente: 1,
        };

        let doc = morosos_document(
            vec![moroso("Ana", 10000), moroso("Luis", 50000), moroso("Eva", 30000)],
            2,
        );

        assert_eq!(doc["titulo"], "Top 2 Propietarios con Deudas Pendientes");
        assert_eq!(doc["labels"], json!(["Luis", "Eva"]));
        assert_eq!(doc["detalles"][0]["monto_pendiente"], 500.0);
        assert_eq!(doc["estadisticas"]["total_morosos"], 3);
        assert_eq!(doc["estadisticas"]["deuda_total"], 900.0);
        assert_eq!(doc["estadisticas"]["promedio_deuda"], 300.0);
    }

    #[test]
    fn test_comparativo_datasets() {
        let doc = comparativo_document(&[(2024, vec![ingreso(12, 5000, 1)]), (2025, vec![])]);
        let datasets = doc["datasets"].as_array().unwrap();

        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[0]["label"], "2024");
        assert_eq!(datasets[0]["data"][11], 50.0);
        assert_eq!(datasets[1]["backgroundColor"], "#F59E0B33");
    }
}
