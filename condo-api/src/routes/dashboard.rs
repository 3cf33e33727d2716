/// Financial dashboard endpoints
///
/// Every endpoint answers a chart-ready document (`titulo`, `tipo`,
/// `labels`, `datasets`) with summary statistics.
///
/// # Endpoints
///
/// - `GET /api/dashboard/resumen` - Totals and payment rate
/// - `GET /api/dashboard/estado-expensas` - Paid vs pending
/// - `GET /api/dashboard/ingresos-mensuales?anio=2025` - Monthly income
/// - `GET /api/dashboard/morosos?limite=10` - Largest debts
/// - `GET /api/dashboard/comparativo-anual` - Last four years, month by month

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use condo_shared::dashboard;
use serde::Deserialize;
use serde_json::Value as JsonValue;

const MOROSOS_POR_DEFECTO: usize = 10;

pub async fn resumen(State(state): State<AppState>) -> ApiResult<Json<JsonValue>> {
    let totales = dashboard::totales(&state.db).await?;
    Ok(Json(dashboard::resumen_document(&totales)))
}

pub async fn estado_expensas(State(state): State<AppState>) -> ApiResult<Json<JsonValue>> {
    let totales = dashboard::totales(&state.db).await?;
    Ok(Json(dashboard::estado_document(&totales)))
}

#[derive(Debug, Default, Deserialize)]
pub struct IngresosQuery {
    /// Defaults to the current year
    pub anio: Option<i32>,
}

pub async fn ingresos_mensuales(
    State(state): State<AppState>,
    Query(query): Query<IngresosQuery>,
) -> ApiResult<Json<JsonValue>> {
    let anio = query.anio.unwrap_or_else(|| Utc::now().year());
    let rows = dashboard::ingresos_por_mes(&state.db, anio).await?;
    Ok(Json(dashboard::ingresos_document(anio, &rows)))
}

#[derive(Debug, Default, Deserialize)]
pub struct MorososQuery {
    pub limite: Option<usize>,
}

pub async fn morosos(
    State(state): State<AppState>,
    Query(query): Query<MorososQuery>,
) -> ApiResult<Json<JsonValue>> {
    let limite = query.limite.unwrap_or(MOROSOS_POR_DEFECTO);
    let todos = dashboard::morosos(&state.db).await?;
    Ok(Json(dashboard::morosos_document(todos, limite)))
}

pub async fn comparativo_anual(State(state): State<AppState>) -> ApiResult<Json<JsonValue>> {
    let doc = dashboard::comparativo_anual(&state.db, Utc::now().date_naive()).await?;
    Ok(Json(doc))
}
