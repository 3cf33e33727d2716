/// Common-area reservation admission
///
/// Decides whether a requested slot (area, date, start, end) may be booked.
/// Times are projected onto a fixed reference timeline so that intervals
/// crossing midnight compare correctly:
///
/// ```text
/// reference day:        D-1            D             D+1
/// booking 22:00-02:00 (D)            [22:00 ─────── 02:00)
/// booking 00:30-01:00 (D+1)                   [00:30─01:00)   ← conflicts
/// booking 03:00-04:00 (D+1)                          [03:00─04:00) ← free
/// ```
///
/// A booking whose end time is earlier than its start time ends on the next
/// day. Only `PENDIENTE` and `CONFIRMADA` bookings occupy the area.
///
/// [`admit`] runs the check inside the caller's transaction after locking
/// the area row, so two concurrent requests for the same area are
/// serialised and cannot both pass.

mod interval;

pub use interval::Interval;

use crate::models::area_comun::{AreaComun, EstadoArea, EstadoReserva};
use chrono::{NaiveDate, NaiveTime};
use sqlx::PgConnection;
use thiserror::Error;
use uuid::Uuid;

/// Reasons a reservation is refused
#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("La fecha no puede ser en el pasado.")]
    PastDate,

    #[error("La duración de la reserva no es válida.")]
    InvalidDuration,

    #[error("El área '{nombre}' no está disponible (Estado: {estado}).")]
    AreaUnavailable { nombre: String, estado: String },

    #[error("La reserva está fuera del horario de atención del área ({apertura} - {cierre}).")]
    OutsideOperatingHours { apertura: NaiveTime, cierre: NaiveTime },

    #[error("Conflicto de horario. Ya existe una reserva ocupando ese espacio.")]
    Conflict { reserva_id: Uuid },

    #[error("Solo propietarios o inquilinos pueden reservar áreas comunes.")]
    PersonaNotAllowed,

    #[error("No se puede pasar la reserva de {from} a {to}.")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("Área común no encontrada")]
    AreaNotFound,

    #[error("Reserva no encontrada")]
    ReservaNotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ReservationError {
    /// Field the error refers to, for validation responses
    pub fn field(&self) -> &'static str {
        match self {
            ReservationError::PastDate => "fecha_reserva",
            ReservationError::InvalidDuration => "hora_fin",
            ReservationError::AreaUnavailable { .. } | ReservationError::AreaNotFound => {
                "area_comun_id"
            }
            ReservationError::PersonaNotAllowed => "persona_id",
            _ => "non_field_errors",
        }
    }
}

/// Requested slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub fecha: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub hora_fin: NaiveTime,
}

/// Existing booking on the same area
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    #[sqlx(rename = "fecha_reserva")]
    pub fecha: NaiveDate,
    pub hora_inicio: NaiveTime,
    pub hora_fin: NaiveTime,
    #[sqlx(rename = "estado_reserva")]
    pub estado: EstadoReserva,
}

/// Area attributes that constrain admission
#[derive(Debug, Clone)]
pub struct AreaRules {
    pub nombre: String,
    pub estado: EstadoArea,
    pub horario_apertura: NaiveTime,
    pub horario_cierre: NaiveTime,
}

impl From<&AreaComun> for AreaRules {
    fn from(area: &AreaComun) -> Self {
        AreaRules {
            nombre: area.nombre.clone(),
            estado: area.estado,
            horario_apertura: area.horario_apertura,
            horario_cierre: area.horario_cierre,
        }
    }
}

/// Checks a slot against the area and its current bookings
///
/// `exclude` skips the reservation being updated so it does not conflict
/// with itself. Bookings may come from the day before or after the slot;
/// they are anchored on the reference timeline by their date offset.
///
/// # Errors
///
/// Returns the first rule the slot violates, in this order: past date,
/// zero-length interval, inactive area, operating hours, overlap.
pub fn check_slot(
    slot: &Slot,
    area: &AreaRules,
    bookings: &[Booking],
    exclude: Option<Uuid>,
    today: NaiveDate,
) -> Result<(), ReservationError> {
    if slot.fecha < today {
        return Err(ReservationError::PastDate);
    }

    if slot.hora_inicio == slot.hora_fin {
        return Err(ReservationError::InvalidDuration);
    }
    let requested = Interval::anchored(0, slot.hora_inicio, slot.hora_fin);

    if area.estado != EstadoArea::Activo {
        return Err(ReservationError::AreaUnavailable {
            nombre: area.nombre.clone(),
            estado: area.estado.label().to_string(),
        });
    }

    if !within_operating_hours(&requested, area.horario_apertura, area.horario_cierre) {
        return Err(ReservationError::OutsideOperatingHours {
            apertura: area.horario_apertura,
            cierre: area.horario_cierre,
        });
    }

    let conflict = bookings
        .iter()
        .filter(|b| Some(b.id) != exclude)
        .filter(|b| b.estado.occupies_area())
        .find(|b| {
            let offset = (b.fecha - slot.fecha).num_days();
            (-1..=1).contains(&offset)
                && requested.overlaps(&Interval::anchored(offset, b.hora_inicio, b.hora_fin))
        });

    match conflict {
        Some(booking) => Err(ReservationError::Conflict {
            reserva_id: booking.id,
        }),
        None => Ok(()),
    }
}

/// Whether the interval fits in today's opening window or in the tail of
/// yesterday's overnight window. Equal opening and closing times mean the
/// area never closes.
fn within_operating_hours(requested: &Interval, apertura: NaiveTime, cierre: NaiveTime) -> bool {
    if apertura == cierre {
        return true;
    }

    [0, -1]
        .into_iter()
        .map(|offset| Interval::anchored(offset, apertura, cierre))
        .any(|window| window.contains(requested))
}

/// Locks the area and checks the slot against bookings from the day before
/// through the day after
///
/// Must be called on a connection inside a transaction; the lock on the
/// area row is held until that transaction ends.
pub async fn admit(
    conn: &mut PgConnection,
    area_id: Uuid,
    slot: &Slot,
    exclude: Option<Uuid>,
    today: NaiveDate,
) -> Result<AreaComun, ReservationError> {
    let area = sqlx::query_as::<_, AreaComun>("SELECT * FROM areas_comunes WHERE id = $1 FOR UPDATE")
        .bind(area_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ReservationError::AreaNotFound)?;

    let bookings = sqlx::query_as::<_, Booking>(
        r#"
        SELECT id, fecha_reserva, hora_inicio, hora_fin, estado_reserva
        FROM reservas
        WHERE area_comun_id = $1
          AND fecha_reserva BETWEEN $2::date - 1 AND $2::date + 1
          AND estado_reserva IN ('PENDIENTE', 'CONFIRMADA')
        "#,
    )
    .bind(area_id)
    .bind(slot.fecha)
    .fetch_all(&mut *conn)
    .await?;

    check_slot(slot, &AreaRules::from(&area), &bookings, exclude, today)?;

    tracing::debug!(
        area_id = %area_id,
        fecha = %slot.fecha,
        candidates = bookings.len(),
        "Reservation slot admitted"
    );

    Ok(area)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 5, day).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 5, 1).unwrap()
    }

    fn area(apertura: NaiveTime, cierre: NaiveTime) -> AreaRules {
        AreaRules {
            nombre: "Salón de eventos".to_string(),
            estado: EstadoArea::Activo,
            horario_apertura: apertura,
            horario_cierre: cierre,
        }
    }

    fn open_all_day() -> AreaRules {
        area(t(0, 0), t(0, 0))
    }

    fn slot(day: u32, inicio: NaiveTime, fin: NaiveTime) -> Slot {
        Slot {
            fecha: d(day),
            hora_inicio: inicio,
            hora_fin: fin,
        }
    }

    fn booking(day: u32, inicio: NaiveTime, fin: NaiveTime, estado: EstadoReserva) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            fecha: d(day),
            hora_inicio: inicio,
            hora_fin: fin,
            estado,
        }
    }

    #[test]
    fn test_past_date_rejected() {
        let result = check_slot(
            &Slot {
                fecha: NaiveDate::from_ymd_opt(2030, 4, 30).unwrap(),
                hora_inicio: t(10, 0),
                hora_fin: t(11, 0),
            },
            &open_all_day(),
            &[],
            None,
            today(),
        );
        assert!(matches!(result, Err(ReservationError::PastDate)));
    }

    #[test]
    fn test_zero_length_rejected() {
        let result = check_slot(&slot(3, t(10, 0), t(10, 0)), &open_all_day(), &[], None, today());
        assert!(matches!(result, Err(ReservationError::InvalidDuration)));
    }

    #[test]
    fn test_inactive_area_rejected() {
        let mut rules = open_all_day();
        rules.estado = EstadoArea::Inactivo;

        let err = check_slot(&slot(3, t(10, 0), t(11, 0)), &rules, &[], None, today()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "El área 'Salón de eventos' no está disponible (Estado: Inactivo)."
        );
    }

    #[test]
    fn test_overnight_booking_conflicts_with_next_day_early_slot() {
        let existing = [booking(3, t(22, 0), t(2, 0), EstadoReserva::Confirmada)];

        let result = check_slot(&slot(4, t(0, 30), t(1, 0)), &open_all_day(), &existing, None, today());
        assert!(matches!(result, Err(ReservationError::Conflict { .. })));
    }

    #[test]
    fn test_overnight_booking_frees_next_day_after_end() {
        let existing = [booking(3, t(22, 0), t(2, 0), EstadoReserva::Confirmada)];

        let result = check_slot(&slot(4, t(3, 0), t(4, 0)), &open_all_day(), &existing, None, today());
        assert!(result.is_ok());
    }

    #[test]
    fn test_overnight_request_conflicts_with_next_day_booking() {
        let existing = [booking(4, t(0, 30), t(1, 0), EstadoReserva::Pendiente)];

        let result = check_slot(&slot(3, t(22, 0), t(2, 0)), &open_all_day(), &existing, None, today());
        assert!(matches!(result, Err(ReservationError::Conflict { .. })));
    }

    #[test]
    fn test_same_day_overlap_is_half_open() {
        let existing = [booking(3, t(10, 0), t(12, 0), EstadoReserva::Pendiente)];

        let touching = check_slot(&slot(3, t(12, 0), t(13, 0)), &open_all_day(), &existing, None, today());
        assert!(touching.is_ok());

        let overlapping =
            check_slot(&slot(3, t(11, 59), t(13, 0)), &open_all_day(), &existing, None, today());
        assert!(overlapping.is_err());
    }

    #[test]
    fn test_third_overlapping_reservation_rejected() {
        let existing = [
            booking(3, t(8, 0), t(10, 0), EstadoReserva::Confirmada),
            booking(3, t(10, 0), t(12, 0), EstadoReserva::Pendiente),
        ];

        let result = check_slot(&slot(3, t(9, 0), t(11, 0)), &open_all_day(), &existing, None, today());
        assert!(matches!(result, Err(ReservationError::Conflict { .. })));
    }

    #[test]
    fn test_cancelled_and_completed_do_not_block() {
        let existing = [
            booking(3, t(10, 0), t(12, 0), EstadoReserva::Cancelada),
            booking(3, t(10, 0), t(12, 0), EstadoReserva::Completada),
        ];

        let result = check_slot(&slot(3, t(10, 0), t(12, 0)), &open_all_day(), &existing, None, today());
        assert!(result.is_ok());
    }

    #[test]
    fn test_update_excludes_itself() {
        let own = booking(3, t(10, 0), t(12, 0), EstadoReserva::Confirmada);

        let result = check_slot(
            &slot(3, t(10, 30), t(12, 30)),
            &open_all_day(),
            &[own],
            Some(own.id),
            today(),
        );
        assert!(result.is_ok());

        let without_exclusion =
            check_slot(&slot(3, t(10, 30), t(12, 30)), &open_all_day(), &[own], None, today());
        assert!(without_exclusion.is_err());
    }

    #[test]
    fn test_outside_overnight_operating_hours_rejected() {
        let rules = area(t(20, 0), t(2, 0));

        let result = check_slot(&slot(3, t(5, 0), t(6, 0)), &rules, &[], None, today());
        assert!(matches!(
            result,
            Err(ReservationError::OutsideOperatingHours { .. })
        ));
    }

    #[test]
    fn test_inside_overnight_operating_hours_accepted() {
        let rules = area(t(20, 0), t(2, 0));

        assert!(check_slot(&slot(3, t(21, 0), t(1, 0)), &rules, &[], None, today()).is_ok());
        assert!(check_slot(&slot(3, t(0, 30), t(1, 30)), &rules, &[], None, today()).is_ok());
        assert!(check_slot(&slot(3, t(23, 0), t(3, 0)), &rules, &[], None, today()).is_err());
    }

    #[test]
    fn test_daytime_operating_hours() {
        let rules = area(t(8, 0), t(22, 0));

        assert!(check_slot(&slot(3, t(8, 0), t(22, 0)), &rules, &[], None, today()).is_ok());
        assert!(check_slot(&slot(3, t(7, 30), t(9, 0)), &rules, &[], None, today()).is_err());
        assert!(check_slot(&slot(3, t(21, 0), t(23, 0)), &rules, &[], None, today()).is_err());
    }

    #[test]
    fn test_bookings_two_days_away_ignored() {
        let existing = [booking(5, t(0, 0), t(23, 0), EstadoReserva::Confirmada)];

        let result = check_slot(&slot(3, t(22, 0), t(2, 0)), &open_all_day(), &existing, None, today());
        assert!(result.is_ok());
    }

    #[test]
    fn test_error_fields() {
        assert_eq!(ReservationError::PastDate.field(), "fecha_reserva");
        assert_eq!(ReservationError::InvalidDuration.field(), "hora_fin");
        assert_eq!(
            ReservationError::Conflict {
                reserva_id: Uuid::nil()
            }
            .field(),
            "non_field_errors"
        );
    }
}
