/// Push notification device registration
///
/// Tokens are unique. Registering a known token refreshes its owner and
/// platform and reactivates it.

use crate::db::listing::{Filter, ListParams};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Dispositivo {
    pub id: Uuid,
    pub token: String,
    pub persona_id: Option<Uuid>,
    pub plataforma: String,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
}

fn default_plataforma() -> String {
    "android".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterDispositivo {
    #[validate(length(min = 1, message = "El token es obligatorio"))]
    pub token: String,
    pub persona_id: Option<Uuid>,
    #[serde(default = "default_plataforma")]
    #[validate(length(min = 1, max = 20))]
    pub plataforma: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispositivoFilter {
    pub persona: Option<Uuid>,
    pub activo: Option<bool>,
}

impl Dispositivo {
    /// Inserts the token or refreshes the existing registration
    pub async fn register(pool: &PgPool, input: RegisterDispositivo) -> Result<Dispositivo, sqlx::Error> {
        sqlx::query_as::<_, Dispositivo>(
            r#"
            INSERT INTO dispositivos (token, persona_id, plataforma)
            VALUES ($1, $2, $3)
            ON CONFLICT (token) DO UPDATE
            SET persona_id = COALESCE(EXCLUDED.persona_id, dispositivos.persona_id),
                plataforma = EXCLUDED.plataforma,
                activo = TRUE
            RETURNING *
            "#,
        )
        .bind(&input.token)
        .bind(input.persona_id)
        .bind(&input.plataforma)
        .fetch_one(pool)
        .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &DispositivoFilter,
        params: &ListParams,
    ) -> Result<Vec<Dispositivo>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM dispositivos");
        query
            .eq("persona_id", filter.persona)
            .eq("activo", filter.activo)
            .search(params, &["plataforma"]);

        query
            .finish(params, &[("created_at", "created_at")], "created_at DESC")
            .build_query_as::<Dispositivo>()
            .fetch_all(pool)
            .await
    }

    /// Active tokens registered by a persona
    pub async fn tokens_for_persona(pool: &PgPool, persona_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT token FROM dispositivos WHERE persona_id = $1 AND activo")
            .bind(persona_id)
            .fetch_all(pool)
            .await
    }

    /// Every active token
    pub async fn all_tokens(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT token FROM dispositivos WHERE activo")
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dispositivos WHERE id = $1")
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
    fn test_register_defaults_to_android() {
        let input: RegisterDispositivo = serde_json::from_value(json!({ "token": "fcm-token-1" })).unwrap();
        assert_eq!(input.plataforma, "android");
        assert!(input.persona_id.is_none());
        assert!(input.validate().is_ok());

        let input: RegisterDispositivo = serde_json::from_value(json!({ "token": "" })).unwrap();
        assert!(input.validate().is_err());
    }
}
