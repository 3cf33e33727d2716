/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `personas`: residents and their role attachments
/// - `empleados`: cargos and empleados
/// - `unidades`: bloques and unidades
/// - `vehiculos`: vehiculos and mascotas
/// - `reservas`: common areas and their reservations
/// - `registros`: visitas, objetos perdidos and incidentes
/// - `contratos`: contracts and their PDF documents
/// - `expensas`: expensas and multas
/// - `pagos`: payment intents
/// - `dashboard`: financial aggregates
/// - `dispositivos`: push notification devices
/// - `seguridad`: ALPR, face recognition and enrollment

pub mod contratos;
pub mod dashboard;
pub mod dispositivos;
pub mod empleados;
pub mod expensas;
pub mod health;
pub mod pagos;
pub mod personas;
pub mod registros;
pub mod reservas;
pub mod seguridad;
pub mod unidades;
pub mod vehiculos;

use crate::error::ApiError;

/// 404 for a missing record
pub(crate) fn not_found(what: &str) -> ApiError {
    ApiError::NotFound(format!("{} no encontrado", what))
}
