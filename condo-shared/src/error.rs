/// Domain error type
///
/// Model operations that only touch the database return `sqlx::Error`.
/// Operations that also enforce business rules (uniqueness with a friendly
/// message, role checks, date ranges) return [`DomainError`] so the API can
/// tell a rejected request apart from a failing database.

use thiserror::Error;

/// Errors raised while enforcing business rules
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input is well-formed but violates a rule of the domain
    #[error("{field}: {message}")]
    Validation {
        /// Offending field
        field: &'static str,
        /// Human-readable message
        message: String,
    },

    /// The write would duplicate or contradict existing data
    #[error("{0}")]
    Conflict(String),

    /// A referenced record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Underlying database failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Domain result type alias
pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Creates a validation error for `field`
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Maps a unique/check constraint name to the message shown to users.
pub fn constraint_message(constraint: &str) -> Option<&'static str> {
    match constraint {
        "personas_ci_key" | "empleados_ci_key" => Some("Esta cédula ya está registrada."),
        "personas_user_id_key" | "empleados_user_id_key" => {
            Some("El usuario ya está asociado a otra persona.")
        }
        "vehiculos_placa_key" => Some("Ya existe un vehículo con esta placa."),
        "unidades_codigo_key" => Some("Ya existe una unidad con este código."),
        "unidades_bloque_numero_key" => Some("Ya existe una unidad con este número en el bloque."),
        "cargos_nombre_key" => Some("Ya existe un cargo con este nombre."),
        "dispositivos_token_key" => Some("El dispositivo ya está registrado."),
        "inquilinos_not_self" => Some("El inquilino no puede ser el mismo que el propietario."),
        "familiares_not_self" => {
            Some("El familiar no puede ser el mismo que la persona relacionada.")
        }
        "inquilinos_rango" => Some("La fecha de fin debe ser posterior a la fecha de inicio."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = DomainError::validation("fecha_nacimiento", "no puede ser futura");
        assert_eq!(err.to_string(), "fecha_nacimiento: no puede ser futura");
    }

    #[test]
    fn test_constraint_messages() {
        assert_eq!(
            constraint_message("personas_ci_key"),
            Some("Esta cédula ya está registrada.")
        );
        assert_eq!(
            constraint_message("vehiculos_placa_key"),
            Some("Ya existe un vehículo con esta placa.")
        );
        assert_eq!(constraint_message("unknown_key"), None);
    }
}
