/// Database models
///
/// Each model exposes associated async functions taking a `&PgPool`
/// (`create`, `find_by_id`, `list`, `update`, `delete` and domain-specific
/// operations). Enums map onto PostgreSQL enum types via `sqlx::Type`.
///
/// # Modules
///
/// - `persona`: residents with role attachments (inquilino, familiar, visitante)
/// - `empleado`: staff and their cargos
/// - `unidad`: bloques and unidades
/// - `vehiculo`, `mascota`: resident assets
/// - `area_comun`: common areas and their reservas
/// - `visita`, `objeto_perdido`, `incidente`: day-to-day logs
/// - `contrato`, `expensa`: finance
/// - `dispositivo`: push notification devices
/// - `lectura_placa`: ALPR scan log

pub mod area_comun;
pub mod contrato;
pub mod dispositivo;
pub mod empleado;
pub mod expensa;
pub mod incidente;
pub mod lectura_placa;
pub mod mascota;
pub mod objeto_perdido;
pub mod persona;
pub mod unidad;
pub mod vehiculo;
pub mod visita;
