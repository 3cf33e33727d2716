use crate::db::listing::{Filter, ListParams};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mascota_especie", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Especie {
    #[default]
    Perro,
    Gato,
    Ave,
    Roedor,
    Reptil,
    Otro,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "mascota_sexo", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SexoMascota {
    #[default]
    Macho,
    Hembra,
}

/// Pet registered to a persona
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Mascota {
    pub id: Uuid,
    pub especie: Especie,
    pub tipo: SexoMascota,
    pub foto: Option<String>,
    pub nombre: String,
    pub raza: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub observaciones: Option<String>,
    pub fecha_registro: DateTime<Utc>,
    pub persona_id: Uuid,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMascota {
    #[serde(default)]
    pub especie: Especie,
    #[serde(default)]
    pub tipo: SexoMascota,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub foto: Option<String>,
    #[validate(length(min = 1, max = 50, message = "El nombre es obligatorio"))]
    pub nombre: String,
    #[validate(length(max = 50))]
    pub raza: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub observaciones: Option<String>,
    pub persona_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateMascota {
    pub especie: Option<Especie>,
    pub tipo: Option<SexoMascota>,
    #[validate(url(message = "Debe ser una URL válida"))]
    pub foto: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub nombre: Option<String>,
    #[validate(length(max = 50))]
    pub raza: Option<String>,
    pub fecha_nacimiento: Option<NaiveDate>,
    pub observaciones: Option<String>,
    pub persona_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MascotaFilter {
    pub especie: Option<Especie>,
    pub persona: Option<Uuid>,
}

impl Mascota {
    pub async fn create(pool: &PgPool, input: CreateMascota) -> Result<Mascota, sqlx::Error> {
        sqlx::query_as::<_, Mascota>(
            r#"
            INSERT INTO mascotas (especie, tipo, foto, nombre, raza, fecha_nacimiento, observaciones, persona_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.especie)
        .bind(input.tipo)
        .bind(&input.foto)
        .bind(&input.nombre)
        .bind(&input.raza)
        .bind(input.fecha_nacimiento)
        .bind(&input.observaciones)
        .bind(input.persona_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Mascota>, sqlx::Error> {
        sqlx::query_as::<_, Mascota>("SELECT * FROM mascotas WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &MascotaFilter,
        params: &ListParams,
    ) -> Result<Vec<Mascota>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM mascotas");
        query
            .eq("especie", filter.especie)
            .eq("persona_id", filter.persona)
            .search(params, &["nombre", "raza"]);

        query
            .finish(
                params,
                &[("nombre", "nombre"), ("fecha_registro", "fecha_registro")],
                "fecha_registro DESC",
            )
            .build_query_as::<Mascota>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateMascota) -> Result<Option<Mascota>, sqlx::Error> {
        sqlx::query_as::<_, Mascota>(
            r#"
            UPDATE mascotas
            SET especie = COALESCE($2, especie),
                tipo = COALESCE($3, tipo),
                foto = COALESCE($4, foto),
                nombre = COALESCE($5, nombre),
                raza = COALESCE($6, raza),
                fecha_nacimiento = COALESCE($7, fecha_nacimiento),
                observaciones = COALESCE($8, observaciones),
                persona_id = COALESCE($9, persona_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.especie)
        .bind(input.tipo)
        .bind(&input.foto)
        .bind(&input.nombre)
        .bind(&input.raza)
        .bind(input.fecha_nacimiento)
        .bind(&input.observaciones)
        .bind(input.persona_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM mascotas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
