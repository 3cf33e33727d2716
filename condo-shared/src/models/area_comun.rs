/// Common areas and their reservations
///
/// # Reservation State Machine
///
/// ```text
/// PENDIENTE → CONFIRMADA → COMPLETADA
///     │            │
///     └────────────┴──→ CANCELADA
/// ```
///
/// Writes that change a reservation's slot go through
/// [`crate::reservations::admit`] inside a transaction.

use crate::db::listing::{Filter, ListParams};
use crate::models::persona::Persona;
use crate::reservations::{self, ReservationError, Slot};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "area_estado", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EstadoArea {
    #[default]
    Activo,
    Inactivo,
}

impl EstadoArea {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            EstadoArea::Activo => "Activo",
            EstadoArea::Inactivo => "Inactivo",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AreaComun {
    pub id: Uuid,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub ubicacion: String,
    pub capacidad_maxima: i32,
    pub horario_apertura: NaiveTime,
    /// May be earlier than `horario_apertura` for areas open overnight
    pub horario_cierre: NaiveTime,
    pub estado: EstadoArea,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAreaComun {
    #[validate(length(min = 1, max = 100, message = "El nombre es obligatorio"))]
    pub nombre: String,
    pub descripcion: Option<String>,
    #[validate(length(min = 1, max = 100, message = "La ubicación es obligatoria"))]
    pub ubicacion: String,
    #[validate(range(min = 1, message = "La capacidad debe ser al menos 1"))]
    pub capacidad_maxima: i32,
    pub horario_apertura: NaiveTime,
    pub horario_cierre: NaiveTime,
    #[serde(default)]
    pub estado: EstadoArea,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateAreaComun {
    #[validate(length(min = 1, max = 100))]
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub ubicacion: Option<String>,
    #[validate(range(min = 1, message = "La capacidad debe ser al menos 1"))]
    pub capacidad_maxima: Option<i32>,
    pub horario_apertura: Option<NaiveTime>,
    pub horario_cierre: Option<NaiveTime>,
    pub estado: Option<EstadoArea>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AreaComunFilter {
    pub estado: Option<EstadoArea>,
}

impl AreaComun {
    pub async fn create(pool: &PgPool, input: CreateAreaComun) -> Result<AreaComun, sqlx::Error> {
        sqlx::query_as::<_, AreaComun>(
            r#"
            INSERT INTO areas_comunes (nombre, descripcion, ubicacion, capacidad_maxima,
                                       horario_apertura, horario_cierre, estado)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&input.nombre)
        .bind(&input.descripcion)
        .bind(&input.ubicacion)
        .bind(input.capacidad_maxima)
        .bind(input.horario_apertura)
        .bind(input.horario_cierre)
        .bind(input.estado)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<AreaComun>, sqlx::Error> {
        sqlx::query_as::<_, AreaComun>("SELECT * FROM areas_comunes WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &AreaComunFilter,
        params: &ListParams,
    ) -> Result<Vec<AreaComun>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM areas_comunes");
        query
            .eq("estado", filter.estado)
            .search(params, &["nombre", "ubicacion", "descripcion"]);

        query
            .finish(
                params,
                &[("nombre", "nombre"), ("capacidad_maxima", "capacidad_maxima")],
                "nombre ASC",
            )
            .build_query_as::<AreaComun>()
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        input: UpdateAreaComun,
    ) -> Result<Option<AreaComun>, sqlx::Error> {
        sqlx::query_as::<_, AreaComun>(
            r#"
            UPDATE areas_comunes
            SET nombre = COALESCE($2, nombre),
                descripcion = COALESCE($3, descripcion),
                ubicacion = COALESCE($4, ubicacion),
                capacidad_maxima = COALESCE($5, capacidad_maxima),
                horario_apertura = COALESCE($6, horario_apertura),
                horario_cierre = COALESCE($7, horario_cierre),
                estado = COALESCE($8, estado)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.nombre)
        .bind(&input.descripcion)
        .bind(&input.ubicacion)
        .bind(input.capacidad_maxima)
        .bind(input.horario_apertura)
        .bind(input.horario_cierre)
        .bind(input.estado)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM areas_comunes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Reservation lifecycle state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "reserva_estado", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EstadoReserva {
    #[default]
    Pendiente,
    Confirmada,
    Cancelada,
    Completada,
}

impl EstadoReserva {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoReserva::Pendiente => "PENDIENTE",
            EstadoReserva::Confirmada => "CONFIRMADA",
            EstadoReserva::Cancelada => "CANCELADA",
            EstadoReserva::Completada => "COMPLETADA",
        }
    }

    /// States that hold the area's time slot
    pub fn occupies_area(&self) -> bool {
        matches!(self, EstadoReserva::Pendiente | EstadoReserva::Confirmada)
    }

    pub fn can_transition_to(&self, target: EstadoReserva) -> bool {
        matches!(
            (self, target),
            (EstadoReserva::Pendiente, EstadoReserva::Confirmada)
                | (EstadoReserva::Pendiente, EstadoReserva::Cancelada)
                | (EstadoReserva::Confirmada, EstadoReserva::Cancelada)
                | (EstadoReserva::Confirmada, EstadoReserva::Completada)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reserva {
    pub id: Uuid,
    pub area_comun_id: Uuid,
    pub persona_id: Uuid,
    pub fecha_reserva: NaiveDate,
    pub hora_inicio: NaiveTime,
    /// Earlier than `hora_inicio` when the booking ends the next day
    pub hora_fin: NaiveTime,
    pub estado_reserva: EstadoReserva,
    pub fecha_registro: DateTime<Utc>,
}

impl Reserva {
    pub fn slot(&self) -> Slot {
        Slot {
            fecha: self.fecha_reserva,
            hora_inicio: self.hora_inicio,
            hora_fin: self.hora_fin,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReserva {
    pub area_comun_id: Uuid,
    pub persona_id: Uuid,
    pub fecha_reserva: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub hora_fin: NaiveTime,
}

/// Rescheduling; unspecified fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateReserva {
    pub area_comun_id: Option<Uuid>,
    pub persona_id: Option<Uuid>,
    pub fecha_reserva: Option<NaiveDate>,
    pub hora_inicio: Option<NaiveTime>,
    pub hora_fin: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservaFilter {
    pub area: Option<Uuid>,
    pub persona: Option<Uuid>,
    pub estado: Option<EstadoReserva>,
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
}

async fn ensure_resident(pool: &PgPool, persona_id: Uuid) -> Result<(), ReservationError> {
    let allowed = Persona::find_by_id(pool, persona_id)
        .await?
        .is_some_and(|p| p.tipo.is_resident());
    if !allowed {
        return Err(ReservationError::PersonaNotAllowed);
    }
    Ok(())
}

impl Reserva {
    /// Books a slot after admission checks
    ///
    /// # Errors
    ///
    /// Any [`ReservationError`]; nothing is written when admission fails.
    pub async fn create(pool: &PgPool, input: CreateReserva) -> Result<Reserva, ReservationError> {
        ensure_resident(pool, input.persona_id).await?;

        let slot = Slot {
            fecha: input.fecha_reserva,
            hora_inicio: input.hora_inicio,
            hora_fin: input.hora_fin,
        };

        let mut tx = pool.begin().await?;
        reservations::admit(&mut tx, input.area_comun_id, &slot, None, Utc::now().date_naive()).await?;

        let reserva = sqlx::query_as::<_, Reserva>(
            r#"
            INSERT INTO reservas (area_comun_id, persona_id, fecha_reserva, hora_inicio, hora_fin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(input.area_comun_id)
        .bind(input.persona_id)
        .bind(slot.fecha)
        .bind(slot.hora_inicio)
        .bind(slot.hora_fin)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            reserva_id = %reserva.id,
            area_id = %reserva.area_comun_id,
            fecha = %reserva.fecha_reserva,
            "Reserva created"
        );
        Ok(reserva)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Reserva>, sqlx::Error> {
        sqlx::query_as::<_, Reserva>("SELECT * FROM reservas WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &ReservaFilter,
        params: &ListParams,
    ) -> Result<Vec<Reserva>, sqlx::Error> {
        let mut query = Filter::new("SELECT * FROM reservas");
        query
            .eq("area_comun_id", filter.area)
            .eq("persona_id", filter.persona)
            .eq("estado_reserva", filter.estado)
            .gte("fecha_reserva", filter.fecha_desde)
            .lte("fecha_reserva", filter.fecha_hasta);

        query
            .finish(
                params,
                &[("fecha_reserva", "fecha_reserva"), ("fecha_registro", "fecha_registro")],
                "fecha_reserva DESC, hora_inicio DESC",
            )
            .build_query_as::<Reserva>()
            .fetch_all(pool)
            .await
    }

    /// Reschedules a reservation, re-running admission without
    /// conflicting with itself
    pub async fn update(pool: &PgPool, id: Uuid, input: UpdateReserva) -> Result<Reserva, ReservationError> {
        if let Some(persona_id) = input.persona_id {
            ensure_resident(pool, persona_id).await?;
        }

        let mut tx = pool.begin().await?;

        let current = sqlx::query_as::<_, Reserva>("SELECT * FROM reservas WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ReservationError::ReservaNotFound)?;

        let area_id = input.area_comun_id.unwrap_or(current.area_comun_id);
        let slot = Slot {
            fecha: input.fecha_reserva.unwrap_or(current.fecha_reserva),
            hora_inicio: input.hora_inicio.unwrap_or(current.hora_inicio),
            hora_fin: input.hora_fin.unwrap_or(current.hora_fin),
        };

        reservations::admit(&mut tx, area_id, &slot, Some(id), Utc::now().date_naive()).await?;

        let reserva = sqlx::query_as::<_, Reserva>(
            r#"
            UPDATE reservas
            SET area_comun_id = $2,
                persona_id = $3,
                fecha_reserva = $4,
                hora_inicio = $5,
                hora_fin = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(area_id)
        .bind(input.persona_id.unwrap_or(current.persona_id))
        .bind(slot.fecha)
        .bind(slot.hora_inicio)
        .bind(slot.hora_fin)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(reserva)
    }

    /// Moves the reservation along its state machine
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the target is not reachable from the
    /// current state.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        target: EstadoReserva,
    ) -> Result<Reserva, ReservationError> {
        let mut tx = pool.begin().await?;

        let current: EstadoReserva =
            sqlx::query_scalar("SELECT estado_reserva FROM reservas WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(ReservationError::ReservaNotFound)?;

        if !current.can_transition_to(target) {
            return Err(ReservationError::InvalidTransition {
                from: current.as_str(),
                to: target.as_str(),
            });
        }

        let reserva = sqlx::query_as::<_, Reserva>(
            "UPDATE reservas SET estado_reserva = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(target)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(reserva_id = %id, from = current.as_str(), to = target.as_str(), "Reserva transitioned");
        Ok(reserva)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM reservas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserva_transitions() {
        use EstadoReserva::*;

        assert!(Pendiente.can_transition_to(Confirmada));
        assert!(Pendiente.can_transition_to(Cancelada));
        assert!(Confirmada.can_transition_to(Completada));
        assert!(Confirmada.can_transition_to(Cancelada));

        assert!(!Pendiente.can_transition_to(Completada));
        assert!(!Cancelada.can_transition_to(Confirmada));
        assert!(!Completada.can_transition_to(Cancelada));
        assert!(!Confirmada.can_transition_to(Pendiente));
    }

    #[test]
    fn test_occupying_states() {
        assert!(EstadoReserva::Pendiente.occupies_area());
        assert!(EstadoReserva::Confirmada.occupies_area());
        assert!(!EstadoReserva::Cancelada.occupies_area());
        assert!(!EstadoReserva::Completada.occupies_area());
    }

    #[test]
    fn test_estado_serialization() {
        assert_eq!(
            serde_json::to_string(&EstadoReserva::Confirmada).unwrap(),
            "\"CONFIRMADA\""
        );
    }
}
