/// Append-only log of ALPR scans
///
/// Every scan is recorded, including those where no plate was read
/// (empty `placa`, score 0).

use crate::db::listing::{Filter, ListParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LecturaPlaca {
    pub id: Uuid,
    pub placa: String,
    pub score: f64,
    pub camera_id: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub vehiculo_id: Option<Uuid>,
    /// A registered vehicle carries this plate
    #[sqlx(rename = "match")]
    #[serde(rename = "match")]
    pub matched: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewLectura {
    pub placa: String,
    pub score: f64,
    pub camera_id: String,
    pub image_url: Option<String>,
    pub vehiculo_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LecturaFilter {
    pub placa: Option<String>,
    #[serde(rename = "match")]
    pub matched: Option<bool>,
}

impl LecturaPlaca {
    pub async fn append(pool: &PgPool, lectura: NewLectura) -> Result<LecturaPlaca, sqlx::Error> {
        sqlx::query_as::<_, LecturaPlaca>(
            r#"
            INSERT INTO lecturas_placa (placa, score, camera_id, image_url, vehiculo_id, "match")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&lectura.placa)
        .bind(lectura.score)
        .bind(&lectura.camera_id)
        .bind(&lectura.image_url)
        .bind(lectura.vehiculo_id)
        .bind(lectura.vehiculo_id.is_some())
        .fetch_one(pool)
        .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &LecturaFilter,
        params: &ListParams,
    ) -> Result<Vec<LecturaPlaca>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM lecturas_placa");
        query
            .eq("placa", filter.placa.as_deref().map(str::to_uppercase))
            .eq("\"match\"", filter.matched)
            .search(params, &["placa", "camera_id"]);

        query
            .finish(
                params,
                &[("created_at", "created_at"), ("score", "score"), ("placa", "placa")],
                "created_at DESC",
            )
            .build_query_as::<LecturaPlaca>()
            .fetch_all(pool)
            .await
    }
}
